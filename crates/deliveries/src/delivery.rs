use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use orderflow_core::{DeliveryId, DomainError, OrderId};
use orderflow_orders::Order;

/// Delivery lifecycle state.
///
/// Fulfillment creates deliveries in `Pending`; later transitions belong to a
/// delivery-status workflow outside the fulfillment core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Shipped,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Shipped => "SHIPPED",
            DeliveryStatus::Delivered => "DELIVERED",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "SHIPPED" => Ok(DeliveryStatus::Shipped),
            "DELIVERED" => Ok(DeliveryStatus::Delivered),
            other => Err(DomainError::validation(format!(
                "unknown delivery status: {other}"
            ))),
        }
    }
}

/// A delivery scheduled for a fulfilled order.
///
/// Exactly one delivery exists per successfully fulfilled order; it is created
/// in the same transaction as the order it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub customer_id: String,
    pub qty: i64,
    pub address: String,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// Schedule a delivery for a persisted order.
    ///
    /// Quantity, customer, and address are copied from the order at creation
    /// time; the caller decides when this is safe (i.e. after the order row is
    /// part of the same transaction).
    pub fn for_order(order: &Order) -> Self {
        Self {
            id: DeliveryId::new(),
            order_id: order.id,
            customer_id: order.customer_id.clone(),
            qty: order.qty,
            address: order.address.clone(),
            status: DeliveryStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_core::ProductId;

    #[test]
    fn for_order_mirrors_order_fields() {
        let order = Order::new(ProductId::new(), 4, "cust-9", "1 Main St").unwrap();
        let delivery = Delivery::for_order(&order);
        assert_eq!(delivery.order_id, order.id);
        assert_eq!(delivery.customer_id, order.customer_id);
        assert_eq!(delivery.qty, order.qty);
        assert_eq!(delivery.address, order.address);
        assert_eq!(delivery.status, DeliveryStatus::Pending);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [DeliveryStatus::Pending, DeliveryStatus::Shipped, DeliveryStatus::Delivered] {
            assert_eq!(status.as_str().parse::<DeliveryStatus>().unwrap(), status);
        }
        assert!("LOST".parse::<DeliveryStatus>().is_err());
    }
}
