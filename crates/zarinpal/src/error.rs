use thiserror::Error;

/// Errors returned by gateway client operations.
///
/// Gateway rejections (a well-formed response with a non-success code) are
/// not errors at this level; they are modeled as outcome variants in
/// [`crate::wire`]. Only transport and decoding failures land here.
#[derive(Debug, Error)]
pub enum ZarinpalError {
    /// The remote call failed at the network/HTTP layer. Carries the
    /// upstream HTTP status when one was received.
    #[error("gateway transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The gateway answered but the body was not a recognizable envelope.
    #[error("unparseable gateway response (http {status}): {message}")]
    BadResponse { message: String, status: u16 },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ZarinpalError {
    /// Upstream HTTP status attached to this error, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ZarinpalError::Transport { status, .. } => *status,
            ZarinpalError::BadResponse { status, .. } => Some(*status),
            ZarinpalError::Serde(_) => None,
        }
    }
}
