//! DTOs for Pokedex lookup endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Pokemon;

/// Response for `GET /api/v1/pokemon`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PokemonListResponse {
    /// Matching records in catalog order.
    pub pokemon: Vec<Pokemon>,
    /// Number of records returned.
    pub count: usize,
}

impl From<Vec<Pokemon>> for PokemonListResponse {
    fn from(pokemon: Vec<Pokemon>) -> Self {
        Self {
            count: pokemon.len(),
            pokemon,
        }
    }
}
