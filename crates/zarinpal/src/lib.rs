//! ZarinPal v4 payment flows for a single-process web backend.
//!
//! Covers the full lifecycle of one payment attempt:
//!
//! - [`checkout::initiate`] — validate the caller's intent, create the
//!   payment at the gateway, record the authority→amount pair, and produce
//!   the StartPay redirect URL.
//! - [`checkout::verify_callback`] — consume the recorded amount (at most
//!   once per authority) and verify the payment when the gateway redirects
//!   the payer back.
//!
//! The [`correlator::TransactionCorrelator`] holds the authoritative amount
//! for each in-flight payment between those two calls; the amount presented
//! to the gateway at verification is never re-derived or caller-supplied.
//!
//! HTTP routing and result rendering live in the `zarinpal-server` crate;
//! this crate exposes structured outcomes only.

pub mod checkout;
pub mod constants;
pub mod correlator;
pub mod error;
pub mod gateway;
pub mod wire;

pub use checkout::{
    CallbackOutcome, CallbackParams, CheckoutRequest, InitiateError, InitiatedPayment,
    MerchantConfig,
};
pub use constants::Endpoints;
pub use correlator::TransactionCorrelator;
pub use error::ZarinpalError;
pub use gateway::{PaymentGateway, ZarinpalClient};
pub use wire::{CreateOutcome, GatewayErrors, GatewayVerification};
