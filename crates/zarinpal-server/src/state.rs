use zarinpal::{TransactionCorrelator, ZarinpalClient};

use crate::config::ServerConfig;

/// Shared application state, constructed once per process.
pub struct AppState {
    pub gateway: ZarinpalClient,
    /// Pending authority→amount pairs for in-flight payments.
    pub correlator: TransactionCorrelator,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let endpoints = config.endpoints();
        Self::with_endpoints(config, endpoints)
    }

    /// State with explicit gateway endpoints. Tests use this to point the
    /// client at an unroutable address.
    pub fn with_endpoints(config: ServerConfig, endpoints: zarinpal::Endpoints) -> Self {
        Self {
            gateway: ZarinpalClient::new(endpoints),
            correlator: TransactionCorrelator::new(),
            config,
        }
    }
}
