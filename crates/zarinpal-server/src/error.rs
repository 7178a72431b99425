use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use zarinpal::{GatewayErrors, InitiateError};

/// Failures of the JSON payment-request endpoint.
#[derive(Debug)]
pub enum ApiError {
    /// Missing/invalid amount or description. Never reached the gateway.
    Validation(String),
    /// The gateway responded with a non-success code.
    GatewayRejected {
        message: Option<String>,
        errors: Option<GatewayErrors>,
    },
    /// The remote call failed at the network/HTTP layer. The caller sees a
    /// generic message; detail goes to the log only.
    Upstream { status: Option<u16> },
    /// Anything unexpected.
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "validation failed: {msg}"),
            ApiError::GatewayRejected { message, .. } => write!(
                f,
                "gateway rejected request: {}",
                message.as_deref().unwrap_or("no detail")
            ),
            ApiError::Upstream { status } => {
                write!(f, "gateway unreachable (status {status:?})")
            }
            ApiError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<InitiateError> for ApiError {
    fn from(e: InitiateError) -> Self {
        match e {
            InitiateError::Validation(msg) => ApiError::Validation(msg),
            InitiateError::Rejected {
                message, errors, ..
            } => ApiError::GatewayRejected { message, errors },
            InitiateError::Transport { status, .. } => ApiError::Upstream { status },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::GatewayRejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "message": msg,
            })),
            ApiError::GatewayRejected { message, errors } => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "message": message
                        .as_deref()
                        .unwrap_or("the payment gateway rejected the request"),
                    "errors": errors,
                }))
            }
            ApiError::Upstream { .. } => {
                HttpResponse::build(self.status_code()).json(serde_json::json!({
                    "success": false,
                    "message": "failed to reach the payment gateway",
                }))
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "message": "an internal error occurred",
                }))
            }
        }
    }
}
