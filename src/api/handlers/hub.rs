//! Hub introspection endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::hub::HubStats;

/// `GET /hub/stats`: Live connection and subscription counters.
///
/// # Errors
///
/// Returns [`GatewayError::CoordinatorUnavailable`] once the hub has shut down.
#[utoipa::path(
    get,
    path = "/api/v1/hub/stats",
    tag = "Hub",
    summary = "Hub statistics",
    description = "Counters read by the coordinator loop: live connections, subscriptions, and distinct subscribed channels.",
    responses(
        (status = 200, description = "Current counters", body = HubStats),
        (status = 503, description = "Hub is shut down", body = ErrorResponse),
    )
)]
pub async fn hub_stats(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let stats = state.coordinator.stats().await?;
    Ok(Json(stats))
}

/// Hub routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hub/stats", get(hub_stats))
}
