//! `orderflow-deliveries` — the delivery register's domain model.

pub mod delivery;

pub use delivery::{Delivery, DeliveryStatus};
