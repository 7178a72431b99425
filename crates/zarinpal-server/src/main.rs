use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zarinpal_server::config::ServerConfig;
use zarinpal_server::error::ApiError;
use zarinpal_server::routes;
use zarinpal_server::state::AppState;

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        // Default: allow localhost on any port
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| o == "http://localhost" || o.starts_with("http://localhost:"))
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allowed_headers(vec!["content-type", "accept"])
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allow_any_method()
            .allowed_headers(vec!["content-type", "accept"])
            .max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let port = config.port;
    let rate_limit_rpm = config.rate_limit_rpm;
    let allowed_origins = config.allowed_origins.clone();
    let static_dir = config.static_dir.clone();

    tracing::info!("ZarinPal backend listening on port {port}");
    tracing::info!(
        "Sandbox mode: {}",
        if config.sandbox { "enabled" } else { "disabled" }
    );
    tracing::info!("Callback URL: {}", config.callback_url);
    tracing::info!("Rate limit: {rate_limit_rpm} req/min per IP");
    tracing::info!("  POST http://localhost:{port}/api/payment-request");
    tracing::info!("  GET  http://localhost:{port}/api/payment-verify");

    let state = web::Data::new(AppState::new(config));

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(build_cors(&allowed_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(16_384)
                    .error_handler(|err, _req| {
                        ApiError::Validation(format!("invalid request body: {err}")).into()
                    }),
            )
            .service(routes::health)
            .service(routes::metrics_endpoint)
            .service(routes::payment_request)
            .service(routes::payment_verify);

        if let Some(dir) = &static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
