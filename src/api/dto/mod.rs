//! Data Transfer Objects for REST responses.

pub mod pokemon_dto;

pub use pokemon_dto::PokemonListResponse;
