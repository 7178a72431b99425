//! Serde types for the ZarinPal v4 JSON API.
//!
//! The gateway wraps every response in a `{ data, errors }` envelope and
//! sends an empty array `[]` for whichever side is absent, so both fields
//! go through a tolerant deserializer that maps non-objects to `None`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{CODE_ALREADY_VERIFIED, CODE_SUCCESS};

/// Body of a payment-request call.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequestBody {
    pub merchant_id: String,
    pub amount: u64,
    pub description: String,
    pub callback_url: String,
    pub currency: String,
    pub metadata: Metadata,
}

/// Optional payer contact details, forwarded only when the caller supplied them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body of a verification call.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequestBody {
    pub merchant_id: String,
    pub amount: u64,
    pub authority: String,
}

/// `data` block of a successful payment-request response.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestData {
    pub code: i32,
    pub authority: Option<String>,
    pub message: Option<String>,
    pub fee: Option<i64>,
    pub fee_type: Option<String>,
}

/// `data` block of a verification response.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyData {
    pub code: i32,
    pub ref_id: Option<u64>,
    pub card_pan: Option<String>,
    pub card_hash: Option<String>,
    pub message: Option<String>,
    pub fee: Option<i64>,
    pub fee_type: Option<String>,
}

/// `errors` block sent when the gateway rejects a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayErrors {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations: Option<serde_json::Value>,
}

/// Response envelope shared by both API calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "object_or_none")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "object_or_none")]
    pub errors: Option<GatewayErrors>,
}

fn object_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    } else {
        Ok(None)
    }
}

/// Outcome of a payment-request call that produced a gateway response.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// Code 100: payment created, payer may be redirected.
    Approved { authority: String, fee: Option<i64> },
    /// Any other code: the gateway declined the request.
    Declined {
        code: i32,
        message: Option<String>,
        errors: Option<GatewayErrors>,
    },
}

/// Outcome of a verification call that produced a gateway response.
#[derive(Debug, Clone)]
pub enum GatewayVerification {
    /// Code 100: first-time successful verification.
    Verified {
        ref_id: Option<u64>,
        card_pan: Option<String>,
        card_hash: Option<String>,
    },
    /// Code 101: this authority was already verified on a prior attempt.
    AlreadyVerified,
    /// Any other code: verification declined.
    Declined {
        code: i32,
        message: Option<String>,
        errors: Option<GatewayErrors>,
    },
}

impl CreateOutcome {
    /// Interpret a decoded request envelope.
    ///
    /// An envelope with code 100 but a missing authority is treated as a
    /// decline: the flow cannot proceed without a token to redirect to.
    pub fn from_envelope(envelope: Envelope<RequestData>) -> Self {
        match envelope.data {
            Some(data) if data.code == CODE_SUCCESS => match data.authority {
                Some(authority) => CreateOutcome::Approved {
                    authority,
                    fee: data.fee,
                },
                None => CreateOutcome::Declined {
                    code: data.code,
                    message: Some("gateway approved without an authority token".to_string()),
                    errors: envelope.errors,
                },
            },
            Some(data) => CreateOutcome::Declined {
                code: data.code,
                message: data.message,
                errors: envelope.errors,
            },
            None => {
                let code = envelope.errors.as_ref().map(|e| e.code).unwrap_or(0);
                let message = envelope.errors.as_ref().map(|e| e.message.clone());
                CreateOutcome::Declined {
                    code,
                    message,
                    errors: envelope.errors,
                }
            }
        }
    }
}

impl GatewayVerification {
    pub fn from_envelope(envelope: Envelope<VerifyData>) -> Self {
        match envelope.data {
            Some(data) if data.code == CODE_SUCCESS => GatewayVerification::Verified {
                ref_id: data.ref_id,
                card_pan: data.card_pan,
                card_hash: data.card_hash,
            },
            Some(data) if data.code == CODE_ALREADY_VERIFIED => {
                GatewayVerification::AlreadyVerified
            }
            Some(data) => GatewayVerification::Declined {
                code: data.code,
                message: data.message,
                errors: envelope.errors,
            },
            None => {
                let code = envelope.errors.as_ref().map(|e| e.code).unwrap_or(0);
                let message = envelope.errors.as_ref().map(|e| e.message.clone());
                GatewayVerification::Declined {
                    code,
                    message,
                    errors: envelope.errors,
                }
            }
        }
    }
}
