//! `orderflow-inventory` — the stock ledger's domain model.
//!
//! `InventoryItem` is an inert record; the non-negative-stock invariant is
//! expressed here as pure operations and enforced at the storage boundary by
//! atomic primitives.

pub mod item;

pub use item::InventoryItem;
