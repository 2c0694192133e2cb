mod analysis;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::retry::RetryPolicy;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // The model client holds no credential; each request brings its own key.
    let model = GeminiClient::new(
        &config.gemini_api_base,
        &config.gemini_model,
        config.llm_timeout,
    )
    .context("Failed to build Gemini HTTP client")?;
    info!("LLM client initialized (model: {})", model.model());

    let retry_policy = RetryPolicy::new(config.llm_max_attempts, config.llm_retry_base);
    info!(
        "Retry policy: {} attempts, {}ms base delay",
        retry_policy.max_attempts,
        retry_policy.base_delay.as_millis()
    );

    let state = AppState {
        model: Arc::new(model),
        retry_policy,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr} (upload limit {}MB)", config.max_upload_mb());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
