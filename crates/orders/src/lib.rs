//! `orderflow-orders` — the order store's domain model.
//!
//! Orders are inert records created through the fulfillment orchestrator (or
//! administratively). No persistence lifecycle hooks: creating an order has no
//! side effects by itself.

pub mod order;

pub use order::{Order, OrderStatus};
