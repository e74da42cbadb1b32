//! `orderflow-api` — HTTP surface for the order-fulfillment backend.

pub mod app;
