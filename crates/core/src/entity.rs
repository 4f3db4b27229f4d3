use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kind of domain object an utterance can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Team,
    Criterion,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Player => write!(f, "PLAYER"),
            EntityKind::Team => write!(f, "TEAM"),
            EntityKind::Criterion => write!(f, "CRITERION"),
        }
    }
}

/// Batter/pitcher split used by role keywords and criterion mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Batter,
    Pitcher,
}

impl PlayerRole {
    /// Value stored in the `role` column of the player table.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::Batter => "batter",
            PlayerRole::Pitcher => "pitcher",
        }
    }

    /// Korean label used in answers.
    pub fn label(&self) -> &'static str {
        match self {
            PlayerRole::Batter => "타자",
            PlayerRole::Pitcher => "투수",
        }
    }
}

impl std::fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batter" | "hitter" | "타자" => Ok(PlayerRole::Batter),
            "pitcher" | "투수" => Ok(PlayerRole::Pitcher),
            _ => Err(CoreError::UnknownVariant {
                kind: "player role",
                value: s.to_string(),
            }),
        }
    }
}

/// Logical table a query plan targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Player,
    Team,
    Schedule,
    Result,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Player => write!(f, "player"),
            TargetKind::Team => write!(f, "team"),
            TargetKind::Schedule => write!(f, "schedule"),
            TargetKind::Result => write!(f, "result"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_korean_and_english() {
        assert_eq!("타자".parse::<PlayerRole>().unwrap(), PlayerRole::Batter);
        assert_eq!("Pitcher".parse::<PlayerRole>().unwrap(), PlayerRole::Pitcher);
        assert!("catcher".parse::<PlayerRole>().is_err());
    }

    #[test]
    fn kinds_deserialize_lowercase() {
        let kind: EntityKind = serde_json::from_str("\"criterion\"").unwrap();
        assert_eq!(kind, EntityKind::Criterion);
        let dir: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(dir, SortDirection::Desc);
    }
}
