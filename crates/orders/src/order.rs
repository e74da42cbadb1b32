use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, DomainResult, OrderId, ProductId};

/// Order lifecycle state.
///
/// Fulfillment only ever creates `Pending` orders; later transitions are a
/// plain CRUD concern.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// A purchase order.
///
/// `product_id` references an `InventoryItem` (not ownership); `qty` is
/// immutable after creation as far as the fulfillment core is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub qty: i64,
    pub customer_id: String,
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order with a fresh identity.
    ///
    /// Validates shape only (positive quantity, non-empty customer/address);
    /// stock validation is the orchestrator's responsibility, not the record's.
    pub fn new(
        product_id: ProductId,
        qty: i64,
        customer_id: impl Into<String>,
        address: impl Into<String>,
    ) -> DomainResult<Self> {
        let customer_id = customer_id.into();
        let address = address.into();
        if qty <= 0 {
            return Err(DomainError::validation("qty must be positive"));
        }
        if customer_id.trim().is_empty() {
            return Err(DomainError::validation("customer_id cannot be empty"));
        }
        if address.trim().is_empty() {
            return Err(DomainError::validation("address cannot be empty"));
        }
        Ok(Self {
            id: OrderId::new(),
            product_id,
            qty,
            customer_id,
            address,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }
}
