//! # HTTP Server Module
//!
//! Espone il Task Dispatcher via HTTP.
//!
//! ## Endpoint:
//! - `POST /upload`: multipart (`file`, `compression`) → `{"task_id": ...}`
//! - `GET /progress/:task_id`: `{progress, current_file, status, ready}`
//! - `GET /download/:task_id`: archivio ottimizzato come allegato
//! - `GET /health`: liveness
//!
//! Errori → `{"error": ...}` con status 400 / 404 / 500.

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::optimizer::MediaOptimizer;

/// Build the router with all routes
pub fn create_router(optimizer: MediaOptimizer) -> Router {
    let max_upload = optimizer.config().max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(routes::upload).layer(DefaultBodyLimit::max(max_upload)))
        .route("/progress/:task_id", get(routes::progress))
        .route("/download/:task_id", get(routes::download))
        .with_state(optimizer)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C
pub async fn serve(optimizer: MediaOptimizer) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", optimizer.config().host, optimizer.config().port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let sweeper = optimizer.spawn_sweeper();
    let router = create_router(optimizer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn health_check() -> &'static str {
    "OK"
}
