//! Gateway endpoints and well-known response codes for the ZarinPal v4 API.

/// Base URL of the sandbox gateway (no real money movement).
pub const SANDBOX_BASE_URL: &str = "https://sandbox.zarinpal.com";

/// Base URL of the live gateway.
pub const LIVE_BASE_URL: &str = "https://payment.zarinpal.com";

const REQUEST_PATH: &str = "/pg/v4/payment/request.json";
const VERIFY_PATH: &str = "/pg/v4/payment/verify.json";
const START_PAY_PATH: &str = "/pg/StartPay";

/// Gateway code for a successful operation (payment created / first verification).
pub const CODE_SUCCESS: i32 = 100;

/// Gateway code for a verification of an already-verified payment.
pub const CODE_ALREADY_VERIFIED: i32 = 101;

/// Currency sent when the caller does not supply one.
pub const DEFAULT_CURRENCY: &str = "IRT";

/// Sandbox/live endpoint selection for one gateway instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Endpoints against the sandbox gateway.
    pub fn sandbox() -> Self {
        Self {
            base_url: SANDBOX_BASE_URL.to_string(),
        }
    }

    /// Endpoints against the live gateway.
    pub fn live() -> Self {
        Self {
            base_url: LIVE_BASE_URL.to_string(),
        }
    }

    /// Endpoints against an arbitrary base URL. Used by tests to point the
    /// client at a local stub.
    pub fn custom(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn request_url(&self) -> String {
        format!("{}{}", self.base_url, REQUEST_PATH)
    }

    pub fn verify_url(&self) -> String {
        format!("{}{}", self.base_url, VERIFY_PATH)
    }

    /// URL the payer is redirected to for a given authority token.
    pub fn start_pay_url(&self, authority: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            START_PAY_PATH,
            urlencoding::encode(authority)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_urls() {
        let ep = Endpoints::sandbox();
        assert_eq!(
            ep.request_url(),
            "https://sandbox.zarinpal.com/pg/v4/payment/request.json"
        );
        assert_eq!(
            ep.start_pay_url("A123"),
            "https://sandbox.zarinpal.com/pg/StartPay/A123"
        );
    }

    #[test]
    fn test_custom_strips_trailing_slash() {
        let ep = Endpoints::custom("http://localhost:9999/");
        assert_eq!(
            ep.verify_url(),
            "http://localhost:9999/pg/v4/payment/verify.json"
        );
    }
}
