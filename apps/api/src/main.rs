mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::Analyzer;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(&config.analysis).context("Failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        config.analysis.model_name, config.analysis.call_timeout
    );

    let analyzer = Analyzer::new(Arc::new(llm), &config.analysis)?;
    info!(
        "Analyzer ready: chunk_size={}, overlap={}, max_suggestions={}",
        config.analysis.chunk_size, config.analysis.chunk_overlap, config.analysis.max_suggestions
    );

    let app = build_router(AppState::new(analyzer))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restricts CORS to the frontend origin when one is configured.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    match &config.frontend_url {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .with_context(|| format!("FRONTEND_URL is not a valid origin: '{origin}'"))?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}
