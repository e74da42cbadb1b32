use axum::Router;

pub mod deliveries;
pub mod inventory;
pub mod orders;

/// Router for all endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
        .nest("/deliveries", deliveries::router())
}
