mod activity;
mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;
mod streaming;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::llm_client::provider_from_config;
use crate::llm_client::recording::RecordingProvider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Activity log is shared by the provider decorator, the middleware and the handlers
    let activity = ActivityLog::new();

    let provider = provider_from_config(&config)?;
    info!("LLM provider initialized ({})", provider.name());
    let llm = Arc::new(RecordingProvider::new(provider, activity.clone()));

    let state = AppState::new(config.clone(), llm, activity);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
