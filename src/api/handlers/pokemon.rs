//! Pokedex lookup over plain HTTP.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::PokemonListResponse;
use crate::app_state::AppState;
use crate::domain::QueryCriteria;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /pokemon`: Look up records by id, name, or region.
///
/// Same semantics as the WebSocket `query` request: no filter lists
/// everything, several filters match any of them, a miss is an empty list.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the query string does not
/// deserialize, for example a repeated filter.
#[utoipa::path(
    get,
    path = "/api/v1/pokemon",
    tag = "Pokedex",
    summary = "Look up pokemon",
    description = "Returns every record matching any of the supplied filters, or all records when none is given.",
    params(QueryCriteria),
    responses(
        (status = 200, description = "Matching records", body = PokemonListResponse),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_pokemon(
    State(state): State<AppState>,
    criteria: Result<Query<QueryCriteria>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(criteria) = criteria?;
    Ok(Json(PokemonListResponse::from(state.catalog.lookup(&criteria))))
}

/// Pokedex routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pokemon", get(list_pokemon))
}
