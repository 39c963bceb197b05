//! Client-side data layer for the Pokédex catalog viewer.
//!
//! Records are fetched from the remote API in paced batches ([`loader`]), kept in an
//! append-only [`catalog::Catalog`], projected through search/filter/pagination state
//! ([`view`]), and enriched on demand with evolution chains and type matchups ([`derive`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod derive;
pub mod loader;
pub mod session;
pub mod store;
pub mod view;

/// Numeric identifier of a record (national dex number).
pub type RecordId = u32;

/// The eighteen canonical elemental types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokeType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokeType {
    /// Canonical enumeration order, also used for filter buttons and matchup listings.
    pub const ALL: [PokeType; 18] = [
        PokeType::Normal,
        PokeType::Fire,
        PokeType::Water,
        PokeType::Grass,
        PokeType::Electric,
        PokeType::Ice,
        PokeType::Fighting,
        PokeType::Poison,
        PokeType::Ground,
        PokeType::Flying,
        PokeType::Psychic,
        PokeType::Bug,
        PokeType::Rock,
        PokeType::Ghost,
        PokeType::Dragon,
        PokeType::Dark,
        PokeType::Steel,
        PokeType::Fairy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PokeType::Normal => "normal",
            PokeType::Fire => "fire",
            PokeType::Water => "water",
            PokeType::Grass => "grass",
            PokeType::Electric => "electric",
            PokeType::Ice => "ice",
            PokeType::Fighting => "fighting",
            PokeType::Poison => "poison",
            PokeType::Ground => "ground",
            PokeType::Flying => "flying",
            PokeType::Psychic => "psychic",
            PokeType::Bug => "bug",
            PokeType::Rock => "rock",
            PokeType::Ghost => "ghost",
            PokeType::Dragon => "dragon",
            PokeType::Dark => "dark",
            PokeType::Steel => "steel",
            PokeType::Fairy => "fairy",
        }
    }
}

impl fmt::Display for PokeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type '{}'", self.0)
    }
}

impl std::error::Error for UnknownType {}

impl FromStr for PokeType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        PokeType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

/// Image references for a record. Either may be absent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    pub default: Option<String>,
    pub shiny: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

/// One catalog entry, fully normalized from the remote payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub types: Vec<PokeType>,
    pub images: Images,
    pub cry: Option<String>,
    pub stats: Vec<Stat>,
    /// Decimetres.
    pub height: u32,
    /// Hectograms.
    pub weight: u32,
    pub abilities: Vec<String>,
}

impl Record {
    pub fn has_type(&self, ty: PokeType) -> bool {
        self.types.contains(&ty)
    }

    pub fn stat(&self, name: &str) -> Option<u32> {
        self.stats.iter().find(|s| s.name == name).map(|s| s.value)
    }

    /// Zero-padded display number, e.g. `#025`.
    pub fn display_number(&self) -> String {
        format!("#{:03}", self.id)
    }

    pub fn height_m(&self) -> f64 {
        self.height as f64 / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight as f64 / 10.0
    }
}

/// The remote resource a request was aimed at, carried by every [`FetchError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Record(RecordId),
    Species(RecordId),
    EvolutionChain(RecordId),
    Type(PokeType),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Record(id) => write!(f, "pokemon {}", id),
            Resource::Species(id) => write!(f, "species {}", id),
            Resource::EvolutionChain(id) => write!(f, "evolution chain of species {}", id),
            Resource::Type(ty) => write!(f, "type {}", ty),
        }
    }
}

/// Normalized failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resource does not exist upstream (HTTP 404).
    NotFound(Resource),
    /// Transport failure or non-2xx status other than 404.
    Network { resource: Resource, detail: String },
    /// The payload could not be decoded into the expected shape.
    Malformed { resource: Resource, detail: String },
}

impl FetchError {
    pub fn resource(&self) -> &Resource {
        match self {
            FetchError::NotFound(resource) => resource,
            FetchError::Network { resource, .. } => resource,
            FetchError::Malformed { resource, .. } => resource,
        }
    }

    /// Transient failures may succeed if requested again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(resource) => write!(f, "{} not found", resource),
            FetchError::Network { resource, detail } => {
                write!(f, "network error fetching {}: {}", resource, detail)
            }
            FetchError::Malformed { resource, detail } => {
                write!(f, "malformed response for {}: {}", resource, detail)
            }
        }
    }
}

impl std::error::Error for FetchError {}
