//! HTTP control surface
//!
//! Exposes `POST /flow-splitter/reload`, which rebuilds the flows from the
//! split tree on demand.

use crate::sync::SyncService;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

pub const RELOAD_PATH: &str = "/flow-splitter/reload";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReloadResponse {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

pub fn router(service: Arc<SyncService>) -> Router {
    Router::new()
        .route(RELOAD_PATH, post(reload))
        .with_state(service)
}

/// Run a rebuild pass off the async workers
pub async fn reload(State(service): State<Arc<SyncService>>) -> (StatusCode, Json<ReloadResponse>) {
    let result = tokio::task::spawn_blocking(move || service.reload()).await;
    match result {
        Ok(Ok(summary)) => {
            info!(nodes = summary.nodes, "Manual reload complete");
            (StatusCode::OK, Json(ReloadResponse::ok(summary.message())))
        }
        Ok(Err(e)) => {
            error!(error = %e, "Manual reload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReloadResponse::failed(e.to_string())),
            )
        }
        Err(e) => {
            error!(error = %e, "Reload task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReloadResponse::failed(format!("reload task failed: {}", e))),
            )
        }
    }
}

/// Serve the control surface until Ctrl-C
pub async fn serve(addr: SocketAddr, service: Arc<SyncService>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, path = RELOAD_PATH, "Serving reload endpoint");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}
