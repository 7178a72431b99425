use actix_web::{get, post, web, HttpRequest, HttpResponse};

use zarinpal::checkout;
use zarinpal::{CallbackOutcome, CallbackParams, CheckoutRequest};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "zarinpal-server",
        "sandbox": state.config.sandbox,
        "pendingTransactions": state.correlator.len(),
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.config.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t == token)
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            // No token configured — metrics stay gated unless explicitly opened.
            let public_metrics = std::env::var("ZARINPAL_PUBLIC_METRICS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false);
            if !public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or ZARINPAL_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}

#[post("/api/payment-request")]
pub async fn payment_request(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let start = std::time::Instant::now();
    let merchant = state.config.merchant();

    let result = checkout::initiate(
        &state.gateway,
        &state.correlator,
        &merchant,
        state.gateway.endpoints(),
        &body.into_inner(),
    )
    .await;

    match result {
        Ok(initiated) => {
            metrics::PAYMENT_REQUESTS
                .with_label_values(&["created"])
                .inc();
            metrics::GATEWAY_LATENCY
                .with_label_values(&["request"])
                .observe(start.elapsed().as_secs_f64());
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "payment_url": initiated.payment_url,
            })))
        }
        Err(e) => {
            let label = match &e {
                zarinpal::InitiateError::Validation(_) => "validation",
                zarinpal::InitiateError::Rejected { .. } => "rejected",
                zarinpal::InitiateError::Transport { .. } => "transport",
            };
            metrics::PAYMENT_REQUESTS.with_label_values(&[label]).inc();
            Err(ApiError::from(e))
        }
    }
}

#[get("/api/payment-verify")]
pub async fn payment_verify(
    state: web::Data<AppState>,
    query: web::Query<CallbackParams>,
) -> HttpResponse {
    let start = std::time::Instant::now();
    let merchant = state.config.merchant();

    let outcome =
        checkout::verify_callback(&state.gateway, &state.correlator, &merchant, &query.into_inner())
            .await;

    let label = match &outcome {
        CallbackOutcome::Completed { .. } => "completed",
        CallbackOutcome::AlreadyProcessed => "duplicate",
        CallbackOutcome::Cancelled => "cancelled",
        CallbackOutcome::UnknownTransaction => "unknown",
        CallbackOutcome::Failed { .. } => "failed",
    };
    metrics::VERIFY_CALLBACKS.with_label_values(&[label]).inc();
    if matches!(
        outcome,
        CallbackOutcome::Completed { .. }
            | CallbackOutcome::AlreadyProcessed
            | CallbackOutcome::Failed { .. }
    ) {
        metrics::GATEWAY_LATENCY
            .with_label_values(&["verify"])
            .observe(start.elapsed().as_secs_f64());
    }

    let page = crate::render::callback_page(&outcome, state.config.sandbox);
    HttpResponse::build(page.status)
        .content_type("text/html; charset=utf-8")
        .body(page.html)
}
