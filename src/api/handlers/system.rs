//! System endpoints: greeting and health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` while the hub accepts events, `degraded` after it stops.
    status: &'static str,
    /// Live WebSocket connections, absent when the hub is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    connections: Option<usize>,
    timestamp: String,
    version: &'static str,
}

/// `GET /`: Plain-text greeting.
pub async fn root_handler() -> &'static str {
    "Hello, this is the Pokedex WebSocket gateway!"
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Reports whether the hub coordinator is running, with its live connection count.",
    responses(
        (status = 200, description = "Hub is running", body = HealthResponse),
        (status = 503, description = "Hub has stopped", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, connections) = match state.coordinator.stats().await {
        Ok(stats) => ("healthy", StatusCode::OK, Some(stats.connections)),
        Err(_) => ("degraded", StatusCode::SERVICE_UNAVAILABLE, None),
    };
    (
        code,
        Json(HealthResponse {
            status,
            connections,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}
