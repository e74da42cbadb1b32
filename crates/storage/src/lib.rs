//! `orderflow-storage` — persistence layer.
//!
//! Repository traits for the three persisted collections (stock ledger, order
//! store, delivery register) plus the transactional port used by the
//! fulfillment orchestrator, with two backends:
//!
//! - [`InMemoryStorage`]: tests/dev, coarse state lock.
//! - [`PostgresStorage`]: sqlx-backed, row-level locking via conditional
//!   `UPDATE`.
//!
//! Repositories are inert: no implicit triggers, no side effects beyond the
//! requested read/write. Anything with a business invariant goes through the
//! orchestrator and its [`UnitOfWork`].

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod uow;

pub use error::{DecrementError, StorageError};
pub use in_memory::InMemoryStorage;
pub use postgres::PostgresStorage;
pub use repository::{DeliveryRegister, OrderStore, StockLedger};
pub use uow::{FulfillmentTx, UnitOfWork};
