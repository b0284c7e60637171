pub mod config;
pub mod metrics;
pub mod routes;

pub use config::AppConfig;
pub use metrics::Metrics;

use analysis::Analyzer;
use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue, routing::get};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analyzer: Arc<Analyzer>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: AppConfig, analyzer: Analyzer) -> Self {
        Self {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            metrics: Metrics::new(),
        }
    }
}

/// CORS for the single configured front-end origin.
fn cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let origin: HeaderValue = config
        .server
        .allowed_origin
        .parse()
        .with_context(|| format!("invalid CORS origin: {}", config.server.allowed_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/", get(routes::service_info))
        .route("/settings", get(routes::settings))
        .route("/analyze", get(routes::analyze_query).post(routes::analyze_body))
        .route("/metrics", get(routes::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
