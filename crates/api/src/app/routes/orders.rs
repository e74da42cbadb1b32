use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use orderflow_core::{OrderId, ProductId};
use orderflow_fulfillment::FulfillmentRequest;

use crate::app::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
}

/// POST /orders — place an order through the fulfillment orchestrator.
///
/// This is the one write path with business invariants; everything else in
/// this module is plain CRUD.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    let request = FulfillmentRequest {
        product_id,
        qty: body.qty,
        customer_id: body.customer_id,
        address: body.address,
        request_id: body.request_id,
    };

    match services.orchestrator.place_order(request).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list().await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::storage_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match services.orders.get(id).await {
        Ok(Some(order)) => (StatusCode::OK, Json(order)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}

/// PUT /orders/:id — plain CRUD update of non-fulfillment fields.
///
/// Quantity and product are immutable after creation; only customer/address
/// are updatable here.
pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    let mut order = match services.orders.get(id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found");
        }
        Err(e) => return errors::storage_error_to_response(e),
    };

    if let Some(customer_id) = body.customer_id {
        if customer_id.trim().is_empty() {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "customer_id cannot be empty",
            );
        }
        order.customer_id = customer_id;
    }
    if let Some(address) = body.address {
        if address.trim().is_empty() {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "address cannot be empty",
            );
        }
        order.address = address;
    }

    match services.orders.update(&order).await {
        Ok(true) => (StatusCode::OK, Json(order)).into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match services.orders.delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}
