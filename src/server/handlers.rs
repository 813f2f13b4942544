//! HTTP request handlers
//!
//! Thin JSON wrappers over [`Leaderboard`]. Errors are mapped to status codes
//! by [`ApiError`].

use crate::error::LeaderboardError;
use crate::service::Leaderboard;
use crate::types::Outcome;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared state for the API handlers
#[derive(Clone)]
pub struct ApiState {
    pub leaderboard: Arc<Leaderboard>,
}

/// Error wrapper that renders as a JSON body with a matching status code
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match LeaderboardError::from_anyhow(&self.0) {
            Some(LeaderboardError::UnknownPlayer { .. }) => StatusCode::NOT_FOUND,
            Some(LeaderboardError::DuplicatePlayer { .. })
            | Some(LeaderboardError::StaleRecord { .. }) => StatusCode::CONFLICT,
            Some(LeaderboardError::SamePlayer { .. })
            | Some(LeaderboardError::InvalidOutcome { .. })
            | Some(LeaderboardError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            Some(LeaderboardError::StoreUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Some(LeaderboardError::ConfigurationError { .. }) | None => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordGameRequest {
    #[serde(alias = "player1")]
    pub player_a: String,
    #[serde(alias = "player2")]
    pub player_b: String,
    /// Parsed with [`Outcome::from_str`](std::str::FromStr) so unknown values
    /// become `InvalidOutcome` rather than a deserialization error
    pub outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub player1_elo: f64,
    pub player2_elo: f64,
    pub player1_result: f64,
    pub k: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CalculateResponse {
    pub player1_new_elo: f64,
    pub player2_new_elo: f64,
}

/// Root endpoint handler - shows service information
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "elo-board",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/metrics",
            "/players",
            "/games",
            "/calculate_elo"
        ]
    }))
}

/// Health check: healthy when the store answers
pub async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match state.leaderboard.standings() {
        Ok(players) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "players": players.len(),
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<ApiState>) -> ApiResult<Response> {
    let Some(metrics) = state.leaderboard.metrics() else {
        return Ok((StatusCode::NOT_FOUND, "Metrics are disabled").into_response());
    };

    let body = metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

pub async fn list_players(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.leaderboard.standings()?))
}

pub async fn get_player(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.leaderboard.player(&name)?))
}

pub async fn create_player(
    State(state): State<ApiState>,
    Json(request): Json<CreatePlayerRequest>,
) -> ApiResult<impl IntoResponse> {
    let player = state
        .leaderboard
        .register_player(&request.name, request.rating)?;
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn delete_player(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.leaderboard.remove_player(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_games(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.leaderboard.recent_games(query.limit)?))
}

pub async fn record_game(
    State(state): State<ApiState>,
    Json(request): Json<RecordGameRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome: Outcome = request.outcome.parse()?;
    let applied = state
        .leaderboard
        .record_result(&request.player_a, &request.player_b, outcome)
        .await?;
    Ok((StatusCode::CREATED, Json(applied)))
}

/// Stateless Elo calculation; nothing is stored
pub async fn calculate_elo(
    State(state): State<ApiState>,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<Json<CalculateResponse>> {
    let (player1_new_elo, player2_new_elo) = state.leaderboard.calculate(
        request.player1_elo,
        request.player2_elo,
        request.player1_result,
        request.k,
    )?;

    Ok(Json(CalculateResponse {
        player1_new_elo,
        player2_new_elo,
    }))
}
