//! Movie similarity recommendation server.
//!
//! Loads the similarity snapshot once, then serves recommendations over
//! HTTP until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::ModelSnapshot;
use recommender::RecommendationEngine;
use server::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,server=debug,recommender=debug,tower_http=debug")
            }),
        )
        .init();

    let config = Config::from_env()?;
    info!(?config, "Starting movie recommendation server");

    // A missing or corrupt snapshot is fatal: never serve without one
    let model_path = config.model_path.clone();
    let snapshot = tokio::task::spawn_blocking(move || ModelSnapshot::load_from_file(&model_path))
        .await
        .context("Snapshot loader task panicked")?
        .with_context(|| {
            format!(
                "Failed to load similarity snapshot from {}",
                config.model_path.display()
            )
        })?;

    let engine = RecommendationEngine::new(Arc::new(snapshot), config.engine_config());
    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped, similarity snapshot released");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
