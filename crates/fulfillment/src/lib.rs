//! `orderflow-fulfillment` — the fulfillment orchestrator.
//!
//! Placing an order is the one operation in this system with a real invariant:
//! stock validation, stock decrement, order persistence, and delivery creation
//! must all commit together or not at all. The [`Orchestrator`] owns that
//! protocol and its transactional scope; the persistence components it drives
//! are inert.

pub mod error;
pub mod orchestrator;
pub mod request;

pub use error::FulfillmentError;
pub use orchestrator::Orchestrator;
pub use request::FulfillmentRequest;
