//! HTTP API for the leaderboard
//!
//! This module serves the JSON leaderboard API, the stateless Elo calculator,
//! and health and Prometheus metrics endpoints using Axum.

pub mod handlers;

pub use handlers::{ApiError, ApiState, CalculateRequest, CalculateResponse};

use crate::service::Leaderboard;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

/// Build the API router over a leaderboard
pub fn router(leaderboard: Arc<Leaderboard>) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/players",
            get(handlers::list_players).post(handlers::create_player),
        )
        .route(
            "/players/{name}",
            get(handlers::get_player).delete(handlers::delete_player),
        )
        .route(
            "/games",
            get(handlers::list_games).post(handlers::record_game),
        )
        .route("/calculate_elo", post(handlers::calculate_elo))
        .with_state(ApiState { leaderboard })
}

/// HTTP server for the leaderboard API
pub struct ApiServer {
    config: ApiServerConfig,
    leaderboard: Arc<Leaderboard>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, leaderboard: Arc<Leaderboard>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            leaderboard,
            shutdown_tx,
        }
    }

    /// Serve until [`ApiServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("Leaderboard API listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, router(self.leaderboard.clone()))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Ask a running server to finish in-flight requests and exit
    pub fn stop(&self) {
        info!("Stopping API server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }
    }
}
