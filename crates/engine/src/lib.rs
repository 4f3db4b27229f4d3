pub mod answer;
pub mod classifier;
pub mod error;
pub mod formatter;
pub mod fuzzy;
pub mod intent;
pub mod lexicon;
pub mod params;
pub mod planner;
pub mod resolver;
pub mod text;

pub use answer::{AnswerTrace, Answerer, Outcome};
pub use classifier::{Classification, IntentClassifier, RULES};
pub use error::AnswerError;
pub use formatter::ResponseFormatter;
pub use intent::{Intent, IntentParams, IntentSource};
pub use params::DateRange;
pub use planner::{PlanningError, QueryPlanner};
pub use resolver::{EntityResolver, MatchKind, Resolution, ResolvedEntity, SpanMatch};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use dugout_catalog::{CatalogBuilder, CatalogSeed, EntityCatalog, PlayerListing};
    use dugout_core::PlayerRole;

    const FIXTURE: &str = include_str!("../../../data/fixtures/kbo-sample.json");

    /// Bundled seed plus every fixture player, in fixture order.
    pub fn catalog() -> EntityCatalog {
        let seed = CatalogSeed::bundled().unwrap();
        CatalogBuilder::new(&seed).with_players(players()).build()
    }

    pub fn players() -> Vec<PlayerListing> {
        let fixture: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        fixture["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| PlayerListing {
                player_id: p["player_id"].as_str().unwrap().to_string(),
                name: p["player_name"].as_str().unwrap().to_string(),
                team: p["team"].as_str().map(str::to_string),
                role: p["role"].as_str().and_then(|r| r.parse::<PlayerRole>().ok()),
                aliases: Vec::new(),
            })
            .collect()
    }

    /// A Monday.
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 22).unwrap()
    }
}
