//! Read-only Pokedex data source.
//!
//! [`Catalog`] holds the fixed seed records and answers lookups. It is
//! immutable after construction and shared behind an `Arc`, so readers
//! never synchronize on it.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A single Pokedex record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pokemon {
    /// Pokedex number, as a string.
    pub id: String,
    /// Species name.
    pub name: String,
    /// Elemental type, e.g. `"Grass/Poison"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Home region.
    pub region: String,
}

impl Pokemon {
    fn seed(id: &str, name: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            region: "Kanto".to_string(),
        }
    }
}

/// Lookup criteria. Absent and empty fields are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryCriteria {
    /// Match on Pokedex number.
    #[serde(default)]
    pub id: Option<String>,
    /// Match on species name (exact, case-sensitive).
    #[serde(default)]
    pub name: Option<String>,
    /// Match on region (exact, case-sensitive).
    #[serde(default)]
    pub region: Option<String>,
}

impl QueryCriteria {
    /// Returns `true` if no criterion is set, meaning "list all".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.id, &self.name, &self.region]
            .iter()
            .all(|field| non_empty(field).is_none())
    }

    /// A record matches when any supplied criterion equals its field.
    fn matches(&self, pokemon: &Pokemon) -> bool {
        non_empty(&self.id) == Some(pokemon.id.as_str())
            || non_empty(&self.name) == Some(pokemon.name.as_str())
            || non_empty(&self.region) == Some(pokemon.region.as_str())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// The fixed set of records served by queries.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<Pokemon>,
}

impl Catalog {
    /// Creates a catalog over the given records.
    #[must_use]
    pub fn new(records: Vec<Pokemon>) -> Self {
        Self { records }
    }

    /// The ten first-generation records the server ships with.
    #[must_use]
    pub fn seed() -> Self {
        Self::new(vec![
            Pokemon::seed("1", "Bulbasaur", "Grass/Poison"),
            Pokemon::seed("2", "Ivysaur", "Grass/Poison"),
            Pokemon::seed("3", "Venusaur", "Grass/Poison"),
            Pokemon::seed("4", "Charmander", "Fire"),
            Pokemon::seed("5", "Charmeleon", "Fire"),
            Pokemon::seed("6", "Charizard", "Fire/Flying"),
            Pokemon::seed("7", "Squirtle", "Water"),
            Pokemon::seed("8", "Wartortle", "Water"),
            Pokemon::seed("9", "Blastoise", "Water"),
            Pokemon::seed("10", "Caterpie", "Bug"),
        ])
    }

    /// Returns every record matching `criteria`, in catalog order.
    ///
    /// Empty criteria return the whole catalog. A miss is an empty list,
    /// not an error.
    #[must_use]
    pub fn lookup(&self, criteria: &QueryCriteria) -> Vec<Pokemon> {
        if criteria.is_empty() {
            return self.records.clone();
        }
        self.records
            .iter()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect()
    }

    /// Number of records in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seed()
    }
}
