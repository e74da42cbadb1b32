use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use orderflow_fulfillment::FulfillmentError;
use orderflow_storage::{DecrementError, StorageError};

/// Map a fulfillment failure to a response with a stable error code, so
/// clients can tell retryable outcomes (`transient_conflict`, `storage_error`)
/// from final ones.
pub fn fulfillment_error_to_response(err: FulfillmentError) -> axum::response::Response {
    match err {
        FulfillmentError::ProductNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "product_not_found",
            format!("product not found: {id}"),
        ),
        FulfillmentError::InsufficientStock {
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock: {available} available, {requested} requested"),
                "available": available,
            })),
        )
            .into_response(),
        FulfillmentError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        FulfillmentError::TransientConflict(msg) => {
            json_error(StatusCode::CONFLICT, "transient_conflict", msg)
        }
        FulfillmentError::Storage(e) => storage_error_to_response(e),
    }
}

pub fn storage_error_to_response(err: StorageError) -> axum::response::Response {
    match err {
        StorageError::Conflict { .. } => {
            json_error(StatusCode::CONFLICT, "transient_conflict", err.to_string())
        }
        _ => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            err.to_string(),
        ),
    }
}

/// Map a failed administrative stock adjustment.
pub fn decrement_error_to_response(err: DecrementError) -> axum::response::Response {
    match err {
        DecrementError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "item not found")
        }
        DecrementError::Insufficient {
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock: {available} available, {requested} requested"),
                "available": available,
            })),
        )
            .into_response(),
        DecrementError::Storage(e) => storage_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
