//! Web backend for ZarinPal payments: JSON payment-request endpoint,
//! verification callback with rendered result pages, health check and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod metrics;
pub mod render;
pub mod routes;
pub mod state;
