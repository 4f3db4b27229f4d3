use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The closed set of query families an utterance can be classified into.
///
/// Both the rule table and the generative fallback produce values of this
/// type; anything outside it becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    PlayerLookup,
    Ranking,
    TeamRoster,
    Schedule,
    HeadToHead,
    Unknown,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::PlayerLookup,
        IntentKind::Ranking,
        IntentKind::TeamRoster,
        IntentKind::Schedule,
        IntentKind::HeadToHead,
        IntentKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::PlayerLookup => "PLAYER_LOOKUP",
            IntentKind::Ranking => "RANKING",
            IntentKind::TeamRoster => "TEAM_ROSTER",
            IntentKind::Schedule => "SCHEDULE",
            IntentKind::HeadToHead => "HEAD_TO_HEAD",
            IntentKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = CoreError;

    /// Accepts `RANKING`, `ranking`, `head-to-head`, `Head To Head` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        IntentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "intent",
                value: s.to_string(),
            })
    }
}
