//! Intent classification: an ordered rule table with a generative fallback.
//!
//! Rules are evaluated top to bottom and the first match wins, so the order
//! encodes precedence. Ranking comes before player lookup because ranking
//! questions often mention a team or a player as well.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dugout_catalog::EntityCatalog;
use dugout_core::{EntityKind, IntentKind};
use dugout_llm::IntentFallback;
use tracing::{debug, info, warn};

use crate::intent::{Intent, IntentParams, IntentSource};
use crate::lexicon::{self, contains_any};
use crate::params::{parse_count, parse_date_range};
use crate::resolver::Resolution;
use crate::text::compact;

/// What the rules look at: keyword presence and resolved entity counts.
pub struct Signals<'a> {
    utterance: &'a str,
    compacted: String,
    resolution: &'a Resolution,
    has_date: bool,
}

impl<'a> Signals<'a> {
    pub fn new(utterance: &'a str, resolution: &'a Resolution, has_date: bool) -> Self {
        Self {
            utterance,
            compacted: compact(utterance),
            resolution,
            has_date,
        }
    }

    fn count(&self, kind: EntityKind) -> usize {
        self.resolution.count(kind)
    }

    fn says(&self, keywords: &[&str]) -> bool {
        contains_any(&self.compacted, keywords)
    }

    /// A criterion written as a title, "홈런왕".
    fn names_title(&self) -> bool {
        self.resolution.of_kind(EntityKind::Criterion).any(|e| {
            self.utterance
                .get(e.range.end..)
                .is_some_and(|rest| rest.starts_with(lexicon::TITLE_SUFFIX))
        })
    }

    /// One player plus something to look up about them.
    fn asks_player_stat(&self) -> bool {
        self.count(EntityKind::Player) == 1
            && (self.says(lexicon::STAT) || self.count(EntityKind::Criterion) >= 1)
    }
}

pub struct Rule {
    pub name: &'static str,
    pub kind: IntentKind,
    matches: fn(&Signals<'_>) -> bool,
}

impl Rule {
    pub fn matches(&self, signals: &Signals<'_>) -> bool {
        (self.matches)(signals)
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "ranking",
        kind: IntentKind::Ranking,
        matches: |s| {
            s.count(EntityKind::Criterion) >= 1 && (s.says(lexicon::RANKING) || s.names_title())
        },
    },
    Rule {
        name: "head-to-head",
        kind: IntentKind::HeadToHead,
        matches: |s| s.count(EntityKind::Team) >= 1 && s.says(lexicon::RESULT),
    },
    Rule {
        name: "schedule",
        kind: IntentKind::Schedule,
        // "오늘 문동주 성적" and "노시환 몇 경기" are stat questions.
        matches: |s| {
            s.says(lexicon::SCHEDULE)
                || ((s.has_date || s.says(lexicon::GAME)) && !s.asks_player_stat())
        },
    },
    Rule {
        name: "player-stat",
        kind: IntentKind::PlayerLookup,
        matches: |s| s.asks_player_stat(),
    },
    Rule {
        name: "player-compare",
        kind: IntentKind::PlayerLookup,
        matches: |s| s.count(EntityKind::Player) >= 2 && s.says(lexicon::COMPARE),
    },
    Rule {
        name: "player-mention",
        kind: IntentKind::PlayerLookup,
        matches: |s| s.resolution.spans.len() == 1 && s.count(EntityKind::Player) == 1,
    },
    Rule {
        name: "starting-pitchers",
        kind: IntentKind::Schedule,
        matches: |s| s.count(EntityKind::Team) >= 1 && s.says(lexicon::STARTER),
    },
    Rule {
        name: "team-roster",
        kind: IntentKind::TeamRoster,
        matches: |s| {
            s.count(EntityKind::Team) >= 1
                && (s.says(lexicon::ROSTER) || s.resolution.role().is_some())
        },
    },
];

/// First rule that matches, if any.
pub fn match_rules(signals: &Signals<'_>) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(signals))
}

/// Intent plus a note when the fallback was tried and failed.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    pub fallback_error: Option<String>,
}

pub struct IntentClassifier {
    fallback: Option<Arc<dyn IntentFallback>>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            fallback: None,
            timeout,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn IntentFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Classify with rules only; returns `None` when no rule matched.
    pub fn classify_by_rules(
        &self,
        utterance: &str,
        resolution: &Resolution,
        today: NaiveDate,
    ) -> Option<Intent> {
        let (entities, params) = gather(utterance, resolution, today);
        let signals = Signals::new(utterance, resolution, params.date_range.is_some());
        match_rules(&signals).map(|rule| Intent {
            kind: rule.kind,
            entities,
            params,
            source: IntentSource::Rule(rule.name),
        })
    }

    /// Always returns exactly one intent. Fallback failures degrade to
    /// `UNKNOWN`.
    pub async fn classify(
        &self,
        utterance: &str,
        resolution: &Resolution,
        catalog: &EntityCatalog,
        today: NaiveDate,
    ) -> Classification {
        if let Some(intent) = self.classify_by_rules(utterance, resolution, today) {
            info!("Intent {} via {}", intent.kind, intent.source);
            return Classification {
                intent,
                fallback_error: None,
            };
        }

        let (entities, params) = gather(utterance, resolution, today);
        if resolution.is_empty() {
            info!("Intent UNKNOWN: no rule matched and nothing was resolved");
            return Classification {
                intent: Intent::unknown(entities, params),
                fallback_error: None,
            };
        }

        let Some(fallback) = &self.fallback else {
            debug!("No rule matched and no fallback configured");
            return Classification {
                intent: Intent::unknown(entities, params),
                fallback_error: None,
            };
        };

        let vocabulary = catalog.vocabulary_prompt();
        let outcome = tokio::time::timeout(self.timeout, fallback.classify(utterance, &vocabulary)).await;
        match outcome {
            Ok(Ok(kind)) => {
                info!("Intent {} via fallback", kind);
                Classification {
                    intent: Intent {
                        kind,
                        entities,
                        params,
                        source: IntentSource::Fallback,
                    },
                    fallback_error: None,
                }
            }
            Ok(Err(e)) => {
                warn!("Fallback classifier failed, using UNKNOWN: {}", e);
                Classification {
                    intent: Intent::unknown(entities, params),
                    fallback_error: Some(e.to_string()),
                }
            }
            Err(_) => {
                warn!(
                    "Fallback classifier timed out after {} ms, using UNKNOWN",
                    self.timeout.as_millis()
                );
                Classification {
                    intent: Intent::unknown(entities, params),
                    fallback_error: Some(format!("timed out after {} ms", self.timeout.as_millis())),
                }
            }
        }
    }
}

fn gather(utterance: &str, resolution: &Resolution, today: NaiveDate) -> (Vec<crate::resolver::ResolvedEntity>, IntentParams) {
    let entities: Vec<_> = resolution.entities().cloned().collect();
    let params = IntentParams {
        criterion: resolution
            .of_kind(EntityKind::Criterion)
            .next()
            .map(|e| e.canonical_id.clone()),
        role: resolution.role(),
        count: parse_count(utterance),
        date_range: parse_date_range(utterance, today),
    };
    (entities, params)
}
