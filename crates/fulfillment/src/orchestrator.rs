//! The fulfillment protocol.
//!
//! Steps, all inside one transaction:
//!
//! 1. replay check (if a request id was supplied)
//! 2. resolve the inventory item
//! 3. validate requested quantity against stock
//! 4. decrement stock (atomic, re-validated at the serialization point)
//! 5. persist the order
//! 6. persist the paired delivery
//! 7. record the request id (if supplied)
//!
//! Any failure rolls the whole transaction back: no decrement survives a
//! failed order insert, no order survives without its delivery. Transient
//! conflicts restart the protocol from step 1 up to a bounded retry budget.

use std::sync::Arc;

use tracing::instrument;

use orderflow_deliveries::Delivery;
use orderflow_orders::Order;
use orderflow_storage::{DecrementError, FulfillmentTx, StorageError, UnitOfWork};

use crate::error::FulfillmentError;
use crate::request::FulfillmentRequest;

/// Retry budget for transient conflicts (serialization failures, dedup-insert
/// races). Each attempt runs the full protocol in a fresh transaction.
const MAX_ATTEMPTS: u32 = 3;

enum Outcome {
    /// A new order/delivery pair was staged; commit it.
    Fulfilled(Order),
    /// The request id was already fulfilled; nothing staged, return the
    /// original order.
    Replayed(Order),
}

/// Drives the fulfillment protocol against a [`UnitOfWork`].
///
/// Collaborators are injected at construction; the orchestrator never resolves
/// them ambiently.
pub struct Orchestrator {
    uow: Arc<dyn UnitOfWork>,
}

impl Orchestrator {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Fulfill a place-order request.
    ///
    /// On success the returned order (and its delivery, and the stock
    /// decrement) are committed. On any error, storage is exactly as it was
    /// before the call.
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, qty = request.qty),
        err
    )]
    pub async fn place_order(&self, request: FulfillmentRequest) -> Result<Order, FulfillmentError> {
        request.validate()?;

        let mut last_conflict = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_fulfill(&request).await {
                Ok(order) => return Ok(order),
                Err(FulfillmentError::TransientConflict(msg)) => {
                    tracing::warn!(attempt, conflict = %msg, "fulfillment conflicted; retrying");
                    last_conflict = Some(msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FulfillmentError::TransientConflict(
            last_conflict.unwrap_or_else(|| "retry budget exhausted".to_string()),
        ))
    }

    /// One attempt: open a transaction, run the protocol, commit or roll back.
    async fn try_fulfill(&self, request: &FulfillmentRequest) -> Result<Order, FulfillmentError> {
        let mut tx = self.uow.begin().await.map_err(FulfillmentError::from)?;

        match run_protocol(tx.as_mut(), request).await {
            Ok(Outcome::Fulfilled(order)) => {
                tx.commit().await.map_err(FulfillmentError::from)?;
                tracing::info!(order_id = %order.id, "order fulfilled");
                Ok(order)
            }
            Ok(Outcome::Replayed(order)) => {
                tx.rollback().await.map_err(FulfillmentError::from)?;
                tracing::info!(order_id = %order.id, "duplicate request replayed");
                Ok(order)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed after fulfillment error");
                }
                Err(e)
            }
        }
    }
}

async fn run_protocol(
    tx: &mut dyn FulfillmentTx,
    request: &FulfillmentRequest,
) -> Result<Outcome, FulfillmentError> {
    // Replay check: a previously fulfilled request id returns its order
    // instead of fulfilling again.
    if let Some(request_id) = request.request_id {
        if let Some(order_id) = tx.find_fulfillment(request_id).await? {
            let order = tx.find_order(order_id).await?.ok_or_else(|| {
                FulfillmentError::Storage(StorageError::database(
                    "replay_fulfillment",
                    format!("request {request_id} maps to missing order {order_id}"),
                ))
            })?;
            return Ok(Outcome::Replayed(order));
        }
    }

    // Resolve.
    let item = tx
        .inventory_item(request.product_id)
        .await?
        .ok_or(FulfillmentError::ProductNotFound(request.product_id))?;

    // Validate. The decrement below re-checks at its serialization point;
    // this early check exists to fail cheaply and with the observed stock.
    if item.stock < request.qty {
        return Err(FulfillmentError::InsufficientStock {
            available: item.stock,
            requested: request.qty,
        });
    }

    // Reserve.
    let item = tx
        .decrement_stock(request.product_id, request.qty)
        .await
        .map_err(|e| match e {
            DecrementError::NotFound => FulfillmentError::ProductNotFound(request.product_id),
            DecrementError::Insufficient {
                available,
                requested,
            } => FulfillmentError::InsufficientStock {
                available,
                requested,
            },
            DecrementError::Storage(e) => FulfillmentError::from(e),
        })?;

    // Record order.
    let order = Order::new(
        request.product_id,
        request.qty,
        request.customer_id.clone(),
        request.address.clone(),
    )
    .map_err(|e| FulfillmentError::Validation(e.to_string()))?;
    tx.insert_order(&order).await?;

    // Schedule delivery.
    let delivery = Delivery::for_order(&order);
    tx.insert_delivery(&delivery).await?;

    if let Some(request_id) = request.request_id {
        tx.record_fulfillment(request_id, order.id).await?;
    }

    tracing::debug!(
        order_id = %order.id,
        delivery_id = %delivery.id,
        stock_remaining = item.stock,
        "fulfillment staged"
    );
    Ok(Outcome::Fulfilled(order))
}
