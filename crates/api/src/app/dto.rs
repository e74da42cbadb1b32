use serde::Deserialize;
use uuid::Uuid;

use orderflow_deliveries::DeliveryStatus;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: String,
    pub qty: i64,
    pub customer_id: String,
    pub address: String,
    /// Optional idempotency key; repeated requests with the same key return
    /// the originally created order.
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub stock: i64,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryRequest {
    pub status: Option<DeliveryStatus>,
    pub address: Option<String>,
}
