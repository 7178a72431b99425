//! Gateway client: the two remote calls against the ZarinPal v4 API.
//!
//! [`PaymentGateway`] is the seam the checkout flows depend on;
//! [`ZarinpalClient`] is the reqwest implementation used in production.

use crate::constants::Endpoints;
use crate::error::ZarinpalError;
use crate::wire::{
    CreateOutcome, Envelope, GatewayVerification, PaymentRequestBody, RequestData,
    VerifyData, VerifyRequestBody,
};

/// The two remote calls the checkout flows perform.
///
/// Gateway rejections come back as outcome variants; `Err` means the call
/// itself failed (transport or undecodable response).
pub trait PaymentGateway: Send + Sync {
    /// Create a payment and obtain an authority token.
    fn create_payment(
        &self,
        body: &PaymentRequestBody,
    ) -> impl std::future::Future<Output = Result<CreateOutcome, ZarinpalError>> + Send;

    /// Verify a payment for a previously issued authority token.
    fn verify_payment(
        &self,
        body: &VerifyRequestBody,
    ) -> impl std::future::Future<Output = Result<GatewayVerification, ZarinpalError>> + Send;
}

/// HTTP client for the ZarinPal v4 JSON API.
pub struct ZarinpalClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ZarinpalClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// POST a JSON body and decode the response envelope.
    ///
    /// ZarinPal returns error envelopes with 4xx statuses, so the body is
    /// decoded regardless of status; only an undecodable body is an error.
    async fn post_envelope<B, T>(&self, url: &str, body: &B) -> Result<Envelope<T>, ZarinpalError>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let resp = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ZarinpalError::Transport {
                message: format!("gateway request failed: {e}"),
                status: e.status().map(|s| s.as_u16()),
            })?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| ZarinpalError::Transport {
            message: format!("failed reading gateway response: {e}"),
            status: Some(status),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| ZarinpalError::BadResponse {
            message: format!("envelope decode failed: {e}"),
            status,
        })
    }
}

impl PaymentGateway for ZarinpalClient {
    async fn create_payment(
        &self,
        body: &PaymentRequestBody,
    ) -> Result<CreateOutcome, ZarinpalError> {
        let url = self.endpoints.request_url();
        tracing::debug!(url = %url, amount = body.amount, "sending payment request");

        let envelope: Envelope<RequestData> = self.post_envelope(&url, body).await?;
        Ok(CreateOutcome::from_envelope(envelope))
    }

    async fn verify_payment(
        &self,
        body: &VerifyRequestBody,
    ) -> Result<GatewayVerification, ZarinpalError> {
        let url = self.endpoints.verify_url();
        tracing::debug!(url = %url, authority = %body.authority, "sending verification request");

        let envelope: Envelope<VerifyData> = self.post_envelope(&url, body).await?;
        Ok(GatewayVerification::from_envelope(envelope))
    }
}
