use dugout_core::{EntityKind, IntentKind, PlayerRole};
use serde::Serialize;

use crate::params::DateRange;
use crate::resolver::ResolvedEntity;

/// Where the intent kind came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "via", content = "rule", rename_all = "lowercase")]
pub enum IntentSource {
    /// Named rule from the ordered rule table.
    Rule(&'static str),
    Fallback,
    /// No rule matched and the fallback was not consulted.
    None,
}

impl std::fmt::Display for IntentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentSource::Rule(name) => write!(f, "rule:{}", name),
            IntentSource::Fallback => f.write_str("fallback"),
            IntentSource::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntentParams {
    /// First criterion mentioned.
    pub criterion: Option<String>,
    pub role: Option<PlayerRole>,
    pub count: Option<u32>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Best candidate per resolved span, in utterance order.
    pub entities: Vec<ResolvedEntity>,
    pub params: IntentParams,
    pub source: IntentSource,
}

impl Intent {
    pub fn unknown(entities: Vec<ResolvedEntity>, params: IntentParams) -> Self {
        Self {
            kind: IntentKind::Unknown,
            entities,
            params,
            source: IntentSource::None,
        }
    }

    /// Distinct canonical ids of one kind, first mention first.
    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for e in self.entities.iter().filter(|e| e.kind == kind) {
            if !out.contains(&e.canonical_id.as_str()) {
                out.push(&e.canonical_id);
            }
        }
        out
    }

    pub fn teams(&self) -> Vec<&str> {
        self.ids(EntityKind::Team)
    }

    pub fn players(&self) -> Vec<&str> {
        self.ids(EntityKind::Player)
    }
}
