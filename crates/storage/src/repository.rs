//! Plain CRUD repository contracts.
//!
//! These traits carry no business logic. Stock is deliberately absent from
//! [`StockLedger::update_details`]: every stock mutation — fulfillment or
//! administrative restock — must go through an atomic primitive
//! ([`StockLedger::adjust`] or the transactional decrement) so it cannot race
//! with concurrent fulfillment.

use async_trait::async_trait;

use orderflow_core::{DeliveryId, OrderId, ProductId};
use orderflow_deliveries::Delivery;
use orderflow_inventory::InventoryItem;
use orderflow_orders::Order;

use crate::error::{DecrementError, StorageError};

/// Owns inventory rows. Enforces non-negative stock at the storage boundary.
#[async_trait]
pub trait StockLedger: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<InventoryItem>, StorageError>;

    async fn list(&self) -> Result<Vec<InventoryItem>, StorageError>;

    async fn insert(&self, item: &InventoryItem) -> Result<(), StorageError>;

    /// Update name/price. Returns the updated row, or `None` if the item does
    /// not exist. Stock is not updatable here.
    async fn update_details(
        &self,
        id: ProductId,
        name: &str,
        price: i64,
    ) -> Result<Option<InventoryItem>, StorageError>;

    async fn delete(&self, id: ProductId) -> Result<bool, StorageError>;

    /// Atomically apply a signed stock correction (`delta != 0`, validated by
    /// the caller). Fails with [`DecrementError::Insufficient`] if the result
    /// would be negative; the row is untouched in that case.
    async fn adjust(&self, id: ProductId, delta: i64) -> Result<InventoryItem, DecrementError>;
}

/// Owns order rows. Pure CRUD; stock validation lives in the orchestrator.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    async fn list(&self) -> Result<Vec<Order>, StorageError>;

    async fn insert(&self, order: &Order) -> Result<(), StorageError>;

    /// Replace an existing order row. Returns `false` if it does not exist.
    async fn update(&self, order: &Order) -> Result<bool, StorageError>;

    async fn delete(&self, id: OrderId) -> Result<bool, StorageError>;
}

/// Owns delivery rows. Creation happens only inside a fulfillment transaction;
/// this trait covers the read/update surface.
#[async_trait]
pub trait DeliveryRegister: Send + Sync {
    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError>;

    async fn list(&self) -> Result<Vec<Delivery>, StorageError>;

    /// Replace an existing delivery row. Returns `false` if it does not exist.
    async fn update(&self, delivery: &Delivery) -> Result<bool, StorageError>;

    async fn delete(&self, id: DeliveryId) -> Result<bool, StorageError>;
}
