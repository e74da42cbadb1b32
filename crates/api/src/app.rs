//! Application wiring: backend selection and router construction.

use std::sync::Arc;

use axum::{Extension, Router};

use orderflow_fulfillment::Orchestrator;
use orderflow_storage::{
    DeliveryRegister, InMemoryStorage, OrderStore, PostgresStorage, StockLedger, UnitOfWork,
};

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared handles for the request handlers.
///
/// Plain CRUD requests go straight to the owning repository; placing an order
/// goes through the orchestrator.
pub struct AppServices {
    pub stock: Arc<dyn StockLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub deliveries: Arc<dyn DeliveryRegister>,
    pub orchestrator: Orchestrator,
}

impl AppServices {
    fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: StockLedger + OrderStore + DeliveryRegister + UnitOfWork + 'static,
    {
        Self {
            stock: backend.clone(),
            orders: backend.clone(),
            deliveries: backend.clone(),
            orchestrator: Orchestrator::new(backend),
        }
    }
}

/// Build the application against the backend selected by the environment:
/// Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_app() -> anyhow::Result<Router> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let storage = PostgresStorage::connect(&url).await?;
            storage.ensure_schema().await?;
            tracing::info!("using postgres storage");
            Ok(build_router(AppServices::from_backend(Arc::new(storage))))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Ok(build_in_memory_app())
        }
    }
}

/// Build the application against fresh in-memory storage (dev/tests).
pub fn build_in_memory_app() -> Router {
    build_router(AppServices::from_backend(Arc::new(InMemoryStorage::new())))
}

fn build_router(services: AppServices) -> Router {
    routes::router().layer(Extension(Arc::new(services)))
}
