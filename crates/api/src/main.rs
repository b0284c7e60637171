use analysis::{Analyzer, AzureTextAnalytics};
use anyhow::{Context, Result};
use api::{AppConfig, AppState, build_router};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(?config, "Starting text analysis service");

    // One client for the lifetime of the process
    let provider = AzureTextAnalytics::new(
        config.provider.endpoint.clone(),
        config.provider.key.clone(),
        config.provider.request_timeout(),
    )
    .context("Failed to build Azure Text Analytics client")?;
    let analyzer = Analyzer::new(Arc::new(provider));

    let bind_addr = config.server.bind_addr.clone();
    let app = build_router(AppState::new(config, analyzer))?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
