use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use orderflow_core::DeliveryId;

use crate::app::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_deliveries))
        .route(
            "/:id",
            get(get_delivery).put(update_delivery).delete(delete_delivery),
        )
}

pub async fn list_deliveries(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.deliveries.list().await {
        Ok(deliveries) => (StatusCode::OK, Json(deliveries)).into_response(),
        Err(e) => errors::storage_error_to_response(e),
    }
}

pub async fn get_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DeliveryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid delivery id");
        }
    };

    match services.deliveries.get(id).await {
        Ok(Some(delivery)) => (StatusCode::OK, Json(delivery)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "delivery not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}

/// PUT /deliveries/:id — delivery-status workflow (outside the fulfillment
/// core's invariants).
pub async fn update_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateDeliveryRequest>,
) -> axum::response::Response {
    let id: DeliveryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid delivery id");
        }
    };

    let mut delivery = match services.deliveries.get(id).await {
        Ok(Some(delivery)) => delivery,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "delivery not found");
        }
        Err(e) => return errors::storage_error_to_response(e),
    };

    if let Some(status) = body.status {
        delivery.status = status;
    }
    if let Some(address) = body.address {
        if address.trim().is_empty() {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "address cannot be empty",
            );
        }
        delivery.address = address;
    }

    match services.deliveries.update(&delivery).await {
        Ok(true) => (StatusCode::OK, Json(delivery)).into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "delivery not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}

pub async fn delete_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DeliveryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid delivery id");
        }
    };

    match services.deliveries.delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "delivery not found"),
        Err(e) => errors::storage_error_to_response(e),
    }
}
