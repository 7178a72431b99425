use std::env;

use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_RPM: u64 = 60;

/// Server configuration, loaded once at startup from the environment.
#[derive(Clone)]
pub struct ServerConfig {
    /// Merchant identity presented to the gateway.
    pub merchant_id: String,
    /// Callback URL the gateway redirects the payer back to.
    pub callback_url: String,
    /// Sandbox mode: test endpoints, no real money movement.
    pub sandbox: bool,
    /// Currency sent when the caller does not supply one.
    pub currency: String,
    /// Server port.
    pub port: u16,
    /// CORS allowed origins (empty = localhost only).
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute per IP.
    pub rate_limit_rpm: u64,
    /// Directory to serve static files from (None = API only).
    pub static_dir: Option<String>,
    /// Bearer token required for /metrics (None = access gated off).
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("merchant_id", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field("sandbox", &self.sandbox)
            .field("currency", &self.currency)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("static_dir", &self.static_dir)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Required: merchant identity
        let merchant_id =
            env::var("MERCHANT_ID").map_err(|_| ConfigError::MissingRequired("MERCHANT_ID"))?;
        if merchant_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired("MERCHANT_ID"));
        }

        // Optional: sandbox toggle (defaults to sandbox so a bare setup
        // never moves real money)
        let sandbox = env::var("SANDBOX")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        // Optional: port
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        // Optional: callback URL
        let callback_url = env::var("CALLBACK_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/api/payment-verify"));
        Url::parse(&callback_url).map_err(|_| ConfigError::InvalidUrl(callback_url.clone()))?;

        // Optional: default currency
        let currency =
            env::var("CURRENCY").unwrap_or_else(|_| zarinpal::constants::DEFAULT_CURRENCY.to_string());

        // Optional: allowed origins
        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        // Optional: rate limit
        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        // Optional: static file directory
        let static_dir = env::var("STATIC_DIR").ok().filter(|s| !s.is_empty());

        // Optional: metrics token
        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());

        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics requires ZARINPAL_PUBLIC_METRICS=true");
        }

        if !sandbox {
            tracing::info!("live mode enabled — payments will move real money");
        }

        Ok(Self {
            merchant_id,
            callback_url,
            sandbox,
            currency,
            port,
            allowed_origins,
            rate_limit_rpm,
            static_dir,
            metrics_token,
        })
    }

    /// Gateway endpoints selected by the sandbox toggle.
    pub fn endpoints(&self) -> zarinpal::Endpoints {
        if self.sandbox {
            zarinpal::Endpoints::sandbox()
        } else {
            zarinpal::Endpoints::live()
        }
    }

    /// Merchant-side parameters handed to the checkout flows.
    pub fn merchant(&self) -> zarinpal::MerchantConfig {
        zarinpal::MerchantConfig {
            merchant_id: self.merchant_id.clone(),
            callback_url: self.callback_url.clone(),
            default_currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
