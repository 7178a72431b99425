//! Checkout orchestration: the payment-request and verification flows.
//!
//! Both flows are generic over [`PaymentGateway`] so they can be exercised
//! against a stub without HTTP, and both take the correlator by reference —
//! it is constructed once per process, never reached as ambient state.

use serde::Deserialize;

use crate::constants::Endpoints;
use crate::correlator::TransactionCorrelator;
use crate::gateway::PaymentGateway;
use crate::wire::{
    CreateOutcome, GatewayErrors, GatewayVerification, Metadata, PaymentRequestBody,
    VerifyRequestBody,
};

/// Merchant-side parameters shared by both flows.
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub callback_url: String,
    pub default_currency: String,
}

/// A caller's payment intent, as parsed from the request body.
///
/// `amount` accepts either a JSON number or a numeric string; anything that
/// does not coerce to a positive integer is a validation failure, reported
/// before any remote call.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Raw amount field: JSON number or numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    /// Coerce to a positive integer, or `None` if the value is zero,
    /// negative, fractional, or not numeric.
    pub fn as_positive_int(&self) -> Option<u64> {
        match self {
            AmountInput::Number(n) => {
                if n.is_finite() && *n > 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 {
                    Some(*n as u64)
                } else {
                    None
                }
            }
            AmountInput::Text(s) => match s.trim().parse::<u64>() {
                Ok(n) if n > 0 => Some(n),
                _ => None,
            },
        }
    }
}

/// Callback query parameters appended by the gateway to the redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    #[serde(rename = "Authority", default)]
    pub authority: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// Status literal the gateway sends when the payer completed its flow.
pub const STATUS_OK: &str = "OK";

/// Result of a successful payment initiation.
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub authority: String,
    pub amount: u64,
    /// StartPay redirect URL embedding the authority.
    pub payment_url: String,
}

/// Failure classes of the payment-request flow: local validation,
/// gateway rejection, transport.
#[derive(Debug, thiserror::Error)]
pub enum InitiateError {
    #[error("{0}")]
    Validation(String),

    #[error("gateway declined payment request (code {code})")]
    Rejected {
        code: i32,
        message: Option<String>,
        errors: Option<GatewayErrors>,
    },

    #[error("gateway call failed: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },
}

/// Terminal outcome of one verification callback.
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// Gateway code 100: money captured on this attempt.
    Completed {
        amount: u64,
        ref_id: Option<u64>,
        card_pan: Option<String>,
    },
    /// Gateway code 101: captured on a prior attempt. Not an error.
    AlreadyProcessed,
    /// `Status != "OK"`: the payer cancelled or the gateway flow failed.
    Cancelled,
    /// No recorded amount for this authority (stale, replayed, or forged
    /// callback). Verification cannot proceed without a known amount.
    UnknownTransaction,
    /// Gateway declined the verification, or the verify call itself failed.
    Failed { message: Option<String> },
}

fn validate(request: &CheckoutRequest) -> Result<(u64, String), InitiateError> {
    let amount = request
        .amount
        .as_ref()
        .and_then(AmountInput::as_positive_int)
        .ok_or_else(|| {
            InitiateError::Validation("amount must be a positive integer".to_string())
        })?;

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| InitiateError::Validation("description is required".to_string()))?;

    Ok((amount, description.to_string()))
}

/// Run the payment-request flow.
///
/// Validates locally, calls the gateway, and on approval records the
/// authority→amount pair before handing back the redirect URL.
pub async fn initiate<G: PaymentGateway>(
    gateway: &G,
    correlator: &TransactionCorrelator,
    merchant: &MerchantConfig,
    endpoints: &Endpoints,
    request: &CheckoutRequest,
) -> Result<InitiatedPayment, InitiateError> {
    let (amount, description) = validate(request)?;

    let body = PaymentRequestBody {
        merchant_id: merchant.merchant_id.clone(),
        amount,
        description,
        callback_url: merchant.callback_url.clone(),
        currency: request
            .currency
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| merchant.default_currency.clone()),
        metadata: Metadata {
            mobile: request.mobile.clone().filter(|m| !m.trim().is_empty()),
            email: request.email.clone().filter(|e| !e.trim().is_empty()),
        },
    };

    match gateway.create_payment(&body).await {
        Ok(CreateOutcome::Approved { authority, fee }) => {
            correlator.record(authority.clone(), amount);
            tracing::info!(
                authority = %authority,
                amount,
                fee = ?fee,
                "payment created, redirecting payer"
            );
            let payment_url = endpoints.start_pay_url(&authority);
            Ok(InitiatedPayment {
                authority,
                amount,
                payment_url,
            })
        }
        Ok(CreateOutcome::Declined {
            code,
            message,
            errors,
        }) => {
            tracing::warn!(code, message = ?message, "gateway declined payment request");
            Err(InitiateError::Rejected {
                code,
                message,
                errors,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "payment request transport failure");
            Err(InitiateError::Transport {
                message: e.to_string(),
                status: e.upstream_status(),
            })
        }
    }
}

/// Run the verification callback flow.
///
/// The pending amount is consumed *before* the gateway call: verification
/// is attempted at most once per authority even if the remote call fails,
/// and a redelivered callback always lands in `UnknownTransaction`.
pub async fn verify_callback<G: PaymentGateway>(
    gateway: &G,
    correlator: &TransactionCorrelator,
    merchant: &MerchantConfig,
    params: &CallbackParams,
) -> CallbackOutcome {
    if params.status != STATUS_OK {
        tracing::info!(
            authority = %params.authority,
            status = %params.status,
            "payer did not complete the gateway flow"
        );
        return CallbackOutcome::Cancelled;
    }

    let Some(amount) = correlator.take_amount(&params.authority) else {
        tracing::warn!(
            authority = %params.authority,
            "no pending amount for authority, rejecting callback"
        );
        return CallbackOutcome::UnknownTransaction;
    };

    let body = VerifyRequestBody {
        merchant_id: merchant.merchant_id.clone(),
        amount,
        authority: params.authority.clone(),
    };

    match gateway.verify_payment(&body).await {
        Ok(GatewayVerification::Verified {
            ref_id,
            card_pan,
            card_hash,
        }) => {
            tracing::info!(
                authority = %params.authority,
                amount,
                ref_id = ?ref_id,
                card_hash = ?card_hash,
                "payment verified"
            );
            CallbackOutcome::Completed {
                amount,
                ref_id,
                card_pan,
            }
        }
        Ok(GatewayVerification::AlreadyVerified) => {
            tracing::info!(authority = %params.authority, "payment was already verified");
            CallbackOutcome::AlreadyProcessed
        }
        Ok(GatewayVerification::Declined {
            code,
            message,
            errors,
        }) => {
            tracing::warn!(code, message = ?message, errors = ?errors, "verification declined");
            CallbackOutcome::Failed { message }
        }
        Err(e) => {
            tracing::error!(error = %e, authority = %params.authority, "verification transport failure");
            CallbackOutcome::Failed { message: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZarinpalError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubGateway {
        create: Option<CreateOutcome>,
        verify: Option<GatewayVerification>,
        create_calls: AtomicUsize,
        verify_calls: AtomicUsize,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                create: None,
                verify: None,
                create_calls: AtomicUsize::new(0),
                verify_calls: AtomicUsize::new(0),
            }
        }

        fn approving(authority: &str) -> Self {
            let mut stub = Self::new();
            stub.create = Some(CreateOutcome::Approved {
                authority: authority.to_string(),
                fee: None,
            });
            stub
        }

        fn verifying(outcome: GatewayVerification) -> Self {
            let mut stub = Self::new();
            stub.verify = Some(outcome);
            stub
        }
    }

    impl PaymentGateway for StubGateway {
        async fn create_payment(
            &self,
            _body: &PaymentRequestBody,
        ) -> Result<CreateOutcome, ZarinpalError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            match &self.create {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(ZarinpalError::Transport {
                    message: "stub: connection refused".to_string(),
                    status: None,
                }),
            }
        }

        async fn verify_payment(
            &self,
            _body: &VerifyRequestBody,
        ) -> Result<GatewayVerification, ZarinpalError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            match &self.verify {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(ZarinpalError::Transport {
                    message: "stub: connection refused".to_string(),
                    status: None,
                }),
            }
        }
    }

    fn merchant() -> MerchantConfig {
        MerchantConfig {
            merchant_id: "4b90fe3f-360f-40c6-b092-3be91e41fc99".to_string(),
            callback_url: "http://localhost:3000/api/payment-verify".to_string(),
            default_currency: "IRT".to_string(),
        }
    }

    fn checkout_request(amount: Option<AmountInput>, description: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            amount,
            description: description.map(str::to_string),
            currency: None,
            mobile: None,
            email: None,
        }
    }

    fn ok_callback(authority: &str) -> CallbackParams {
        CallbackParams {
            authority: authority.to_string(),
            status: "OK".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initiate_records_amount_and_embeds_authority_in_url() {
        let gateway = StubGateway::approving("AUTH-1");
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Number(5000.0)), Some("order #7"));

        let initiated = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap();

        assert_eq!(initiated.amount, 5000);
        assert!(initiated.payment_url.contains("AUTH-1"));
        assert_eq!(correlator.take_amount("AUTH-1"), Some(5000));
    }

    #[tokio::test]
    async fn test_initiate_rejects_zero_amount_without_gateway_call() {
        let gateway = StubGateway::approving("AUTH-1");
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Number(0.0)), Some("order"));

        let err = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InitiateError::Validation(_)));
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
        assert!(correlator.is_empty());
    }

    #[tokio::test]
    async fn test_initiate_rejects_negative_string_amount() {
        let gateway = StubGateway::approving("AUTH-1");
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Text("-500".to_string())), Some("order"));

        let err = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InitiateError::Validation(_)));
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initiate_rejects_missing_description_without_gateway_call() {
        let gateway = StubGateway::approving("AUTH-1");
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Number(1000.0)), None);

        let err = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InitiateError::Validation(_)));
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initiate_string_amount_coerces() {
        let gateway = StubGateway::approving("AUTH-2");
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Text("10000".to_string())), Some("top-up"));

        let initiated = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap();

        assert_eq!(initiated.amount, 10_000);
        assert_eq!(correlator.take_amount("AUTH-2"), Some(10_000));
    }

    #[tokio::test]
    async fn test_initiate_gateway_decline_leaves_correlator_empty() {
        let mut gateway = StubGateway::new();
        gateway.create = Some(CreateOutcome::Declined {
            code: -9,
            message: Some("The input params invalid".to_string()),
            errors: None,
        });
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Number(1000.0)), Some("order"));

        let err = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InitiateError::Rejected { code: -9, .. }));
        assert!(correlator.is_empty());
    }

    #[tokio::test]
    async fn test_initiate_transport_failure_maps_to_transport_error() {
        let gateway = StubGateway::new();
        let correlator = TransactionCorrelator::new();
        let request = checkout_request(Some(AmountInput::Number(1000.0)), Some("order"));

        let err = initiate(
            &gateway,
            &correlator,
            &merchant(),
            &Endpoints::sandbox(),
            &request,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InitiateError::Transport { .. }));
        assert!(correlator.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_callback_touches_neither_store_nor_gateway() {
        let gateway = StubGateway::new();
        let correlator = TransactionCorrelator::new();
        correlator.record("AUTH-3", 7000);

        let params = CallbackParams {
            authority: "AUTH-3".to_string(),
            status: "NOK".to_string(),
        };
        let outcome = verify_callback(&gateway, &correlator, &merchant(), &params).await;

        assert!(matches!(outcome, CallbackOutcome::Cancelled));
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 0);
        // The pending entry must survive a cancelled callback.
        assert_eq!(correlator.take_amount("AUTH-3"), Some(7000));
    }

    #[tokio::test]
    async fn test_unknown_authority_skips_gateway() {
        let gateway = StubGateway::new();
        let correlator = TransactionCorrelator::new();

        let outcome =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-X")).await;

        assert!(matches!(outcome, CallbackOutcome::UnknownTransaction));
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verified_new_surfaces_ref_id_and_card() {
        let gateway = StubGateway::verifying(GatewayVerification::Verified {
            ref_id: Some(3_561_774),
            card_pan: Some("502229******5995".to_string()),
            card_hash: None,
        });
        let correlator = TransactionCorrelator::new();
        correlator.record("AUTH-4", 10_000);

        let outcome =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-4")).await;

        match outcome {
            CallbackOutcome::Completed {
                amount,
                ref_id,
                card_pan,
            } => {
                assert_eq!(amount, 10_000);
                assert_eq!(ref_id, Some(3_561_774));
                assert_eq!(card_pan.as_deref(), Some("502229******5995"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert!(correlator.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_verification_is_distinct_outcome() {
        let gateway = StubGateway::verifying(GatewayVerification::AlreadyVerified);
        let correlator = TransactionCorrelator::new();
        correlator.record("AUTH-5", 2000);

        let outcome =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-5")).await;

        assert!(matches!(outcome, CallbackOutcome::AlreadyProcessed));
    }

    #[tokio::test]
    async fn test_declined_verification_carries_gateway_message() {
        let gateway = StubGateway::verifying(GatewayVerification::Declined {
            code: -51,
            message: Some("Session is not valid".to_string()),
            errors: None,
        });
        let correlator = TransactionCorrelator::new();
        correlator.record("AUTH-6", 2000);

        let outcome =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-6")).await;

        match outcome {
            CallbackOutcome::Failed { message } => {
                assert_eq!(message.as_deref(), Some("Session is not valid"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_amount_consumed_even_when_verify_transport_fails() {
        let gateway = StubGateway::new();
        let correlator = TransactionCorrelator::new();
        correlator.record("AUTH-7", 9000);

        let outcome =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-7")).await;
        assert!(matches!(outcome, CallbackOutcome::Failed { message: None }));
        assert!(correlator.is_empty());

        // Redelivered callback lands in UnknownTransaction.
        let replay =
            verify_callback(&gateway, &correlator, &merchant(), &ok_callback("AUTH-7")).await;
        assert!(matches!(replay, CallbackOutcome::UnknownTransaction));
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_amount_input_coercion() {
        assert_eq!(AmountInput::Number(5000.0).as_positive_int(), Some(5000));
        assert_eq!(AmountInput::Number(0.0).as_positive_int(), None);
        assert_eq!(AmountInput::Number(-1.0).as_positive_int(), None);
        assert_eq!(AmountInput::Number(10.5).as_positive_int(), None);
        assert_eq!(
            AmountInput::Text(" 2500 ".to_string()).as_positive_int(),
            Some(2500)
        );
        assert_eq!(AmountInput::Text("abc".to_string()).as_positive_int(), None);
        assert_eq!(AmountInput::Text("0".to_string()).as_positive_int(), None);
    }
}
