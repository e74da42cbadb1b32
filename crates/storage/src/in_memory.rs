//! In-memory storage backend.
//!
//! Intended for tests/dev. Not optimized for performance: a fulfillment
//! transaction holds the whole-state lock until commit or rollback, which
//! serializes fulfillment against every other access. That is a much coarser
//! grain than the Postgres backend's row-level locking, but it satisfies the
//! same guarantees.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use orderflow_core::{DeliveryId, DomainError, OrderId, ProductId};
use orderflow_deliveries::Delivery;
use orderflow_inventory::InventoryItem;
use orderflow_orders::Order;

use crate::error::{DecrementError, StorageError};
use crate::repository::{DeliveryRegister, OrderStore, StockLedger};
use crate::uow::{FulfillmentTx, UnitOfWork};

/// The three persisted collections plus the idempotency ledger.
///
/// Keyed by UUIDv7 identifiers, so `BTreeMap` iteration yields creation order.
#[derive(Debug, Clone, Default)]
struct ShopState {
    items: BTreeMap<ProductId, InventoryItem>,
    orders: BTreeMap<OrderId, Order>,
    deliveries: BTreeMap<DeliveryId, Delivery>,
    fulfillments: HashMap<Uuid, OrderId>,
}

/// In-memory storage backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<ShopState>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockLedger for InMemoryStorage {
    async fn get(&self, id: ProductId) -> Result<Option<InventoryItem>, StorageError> {
        Ok(self.state.lock().await.items.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, StorageError> {
        Ok(self.state.lock().await.items.values().cloned().collect())
    }

    async fn insert(&self, item: &InventoryItem) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.items.contains_key(&item.id) {
            return Err(StorageError::conflict(
                "insert_item",
                format!("item {} already exists", item.id),
            ));
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_details(
        &self,
        id: ProductId,
        name: &str,
        price: i64,
    ) -> Result<Option<InventoryItem>, StorageError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id) else {
            return Ok(None);
        };
        item.name = name.to_string();
        item.price = price;
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StorageError> {
        Ok(self.state.lock().await.items.remove(&id).is_some())
    }

    async fn adjust(&self, id: ProductId, delta: i64) -> Result<InventoryItem, DecrementError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id) else {
            return Err(DecrementError::NotFound);
        };
        match item.adjust(delta) {
            Ok(()) => Ok(item.clone()),
            // saturating_neg: `-i64::MIN` would overflow.
            Err(DomainError::InvariantViolation(_)) => Err(DecrementError::Insufficient {
                available: item.stock,
                requested: delta.saturating_neg(),
            }),
            Err(e) => Err(StorageError::database("adjust_stock", e.to_string()).into()),
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryStorage {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.state.lock().await.orders.values().cloned().collect())
    }

    async fn insert(&self, order: &Order) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if state.orders.contains_key(&order.id) {
            return Err(StorageError::conflict(
                "insert_order",
                format!("order {} already exists", order.id),
            ));
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<bool, StorageError> {
        let mut state = self.state.lock().await;
        match state.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StorageError> {
        Ok(self.state.lock().await.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl DeliveryRegister for InMemoryStorage {
    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError> {
        Ok(self.state.lock().await.deliveries.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Delivery>, StorageError> {
        Ok(self.state.lock().await.deliveries.values().cloned().collect())
    }

    async fn update(&self, delivery: &Delivery) -> Result<bool, StorageError> {
        let mut state = self.state.lock().await;
        match state.deliveries.get_mut(&delivery.id) {
            Some(existing) => {
                *existing = delivery.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: DeliveryId) -> Result<bool, StorageError> {
        Ok(self.state.lock().await.deliveries.remove(&id).is_some())
    }
}

/// A fulfillment transaction over the in-memory state.
///
/// Holds the state lock for its whole lifetime and stages writes on a copy.
/// Commit publishes the copy; rollback (or drop) discards it.
struct InMemoryTx {
    guard: OwnedMutexGuard<ShopState>,
    staged: ShopState,
}

#[async_trait]
impl UnitOfWork for InMemoryStorage {
    async fn begin(&self) -> Result<Box<dyn FulfillmentTx>, StorageError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTx { guard, staged }))
    }
}

#[async_trait]
impl FulfillmentTx for InMemoryTx {
    async fn inventory_item(
        &mut self,
        id: ProductId,
    ) -> Result<Option<InventoryItem>, StorageError> {
        Ok(self.staged.items.get(&id).cloned())
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        qty: i64,
    ) -> Result<InventoryItem, DecrementError> {
        let Some(item) = self.staged.items.get_mut(&id) else {
            return Err(DecrementError::NotFound);
        };
        match item.decrement(qty) {
            Ok(()) => Ok(item.clone()),
            Err(DomainError::InvariantViolation(_)) => Err(DecrementError::Insufficient {
                available: item.stock,
                requested: qty,
            }),
            Err(e) => Err(StorageError::database("decrement_stock", e.to_string()).into()),
        }
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StorageError> {
        if self.staged.orders.contains_key(&order.id) {
            return Err(StorageError::conflict(
                "insert_order",
                format!("order {} already exists", order.id),
            ));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn insert_delivery(&mut self, delivery: &Delivery) -> Result<(), StorageError> {
        if self.staged.deliveries.contains_key(&delivery.id) {
            return Err(StorageError::conflict(
                "insert_delivery",
                format!("delivery {} already exists", delivery.id),
            ));
        }
        self.staged.deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn find_fulfillment(
        &mut self,
        request_id: Uuid,
    ) -> Result<Option<OrderId>, StorageError> {
        Ok(self.staged.fulfillments.get(&request_id).copied())
    }

    async fn record_fulfillment(
        &mut self,
        request_id: Uuid,
        order_id: OrderId,
    ) -> Result<(), StorageError> {
        if self.staged.fulfillments.contains_key(&request_id) {
            return Err(StorageError::conflict(
                "record_fulfillment",
                format!("request {request_id} already fulfilled"),
            ));
        }
        self.staged.fulfillments.insert(request_id, order_id);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        // Dropping the staged copy and the guard is the rollback.
        Ok(())
    }
}
