use std::path::Path;

use dugout_core::PlayerRole;
use serde::{Deserialize, Serialize};

use super::types::{CriterionMapping, RoleKeywords, TableSchema};
use crate::error::CatalogError;

const BUNDLED_SEED: &str = include_str!("../../../../data/catalog/seed.yaml");

/// Static part of the catalog: tables, teams, criteria and role keywords.
///
/// Players are not seeded; they come from the stats store at build time.
/// `player_aliases` only attaches nicknames to players the store lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub tables: Vec<TableSchema>,
    pub teams: Vec<TeamSeed>,
    pub criteria: Vec<CriterionSeed>,
    #[serde(default)]
    pub roles: Vec<RoleKeywords>,
    #[serde(default)]
    pub player_aliases: Vec<PlayerAliasSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeed {
    pub code: String,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub stadium: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub mapping: Option<CriterionMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAliasSeed {
    pub player_id: String,
    pub aliases: Vec<String>,
    #[serde(default)]
    pub role: Option<PlayerRole>,
}

impl CatalogSeed {
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// The seed compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(BUNDLED_SEED)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::SeedIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Load from `path` when given, otherwise the bundled seed.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::bundled(),
        }
    }
}
