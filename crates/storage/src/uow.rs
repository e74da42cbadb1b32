//! Transactional port for the fulfillment orchestrator.
//!
//! One fulfillment attempt = one [`FulfillmentTx`]. Every mutation staged on
//! the transaction becomes visible only on [`FulfillmentTx::commit`]; dropping
//! the transaction (or calling [`FulfillmentTx::rollback`]) discards all of it,
//! including the stock decrement.

use async_trait::async_trait;
use uuid::Uuid;

use orderflow_core::{OrderId, ProductId};
use orderflow_deliveries::Delivery;
use orderflow_inventory::InventoryItem;
use orderflow_orders::Order;

use crate::error::{DecrementError, StorageError};

/// Opens transactions spanning the stock ledger, order store, and delivery
/// register. They live in a single transactional store, so one scope covers
/// all three.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn FulfillmentTx>, StorageError>;
}

/// An open fulfillment transaction.
///
/// Implementations must guarantee that two concurrent `decrement_stock` calls
/// against the same product serialize: a committed decrement is never based on
/// a stale stock value, and no committed decrement produces negative stock.
#[async_trait]
pub trait FulfillmentTx: Send {
    /// Stock ledger: resolve an inventory item inside this transaction.
    async fn inventory_item(
        &mut self,
        id: ProductId,
    ) -> Result<Option<InventoryItem>, StorageError>;

    /// Stock ledger: atomically decrement stock by `qty` (> 0, validated by
    /// the caller). All-or-nothing; returns the updated row.
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        qty: i64,
    ) -> Result<InventoryItem, DecrementError>;

    /// Order store: persist a new order row.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StorageError>;

    /// Order store: resolve an order inside this transaction (used by the
    /// idempotency replay path).
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StorageError>;

    /// Delivery register: persist a new delivery row.
    async fn insert_delivery(&mut self, delivery: &Delivery) -> Result<(), StorageError>;

    /// Idempotency ledger: look up a previously fulfilled request.
    async fn find_fulfillment(&mut self, request_id: Uuid)
    -> Result<Option<OrderId>, StorageError>;

    /// Idempotency ledger: record which order a request produced. A concurrent
    /// duplicate surfaces as [`StorageError::Conflict`] at insert or commit.
    async fn record_fulfillment(
        &mut self,
        request_id: Uuid,
        order_id: OrderId,
    ) -> Result<(), StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}
