use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use dugout_catalog::{Filter, FilterOp, PlayerListing, QueryPlan, StatsStore, StoreError};
use dugout_core::{FieldValue, Row, SortDirection, TargetKind};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::is_virtual_team;

/// On-disk shape of a fixture file.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub players: Vec<Row>,
    #[serde(default)]
    pub teams: Vec<Row>,
    #[serde(default)]
    pub games: Vec<Row>,
}

/// Stats store that evaluates plans over in-memory rows.
///
/// Used for local runs and tests. `schedule` and `result` targets both read
/// the `games` rows.
pub struct MemoryStore {
    fixture: Fixture,
}

impl MemoryStore {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    pub fn from_json_str(text: &str) -> Result<Self, StorageError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn from_path(path: &Path) -> Result<Self, StorageError> {
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        info!(
            "Memory store loaded from {}: {} players, {} teams, {} games",
            path.display(),
            store.fixture.players.len(),
            store.fixture.teams.len(),
            store.fixture.games.len()
        );
        Ok(store)
    }

    fn rows(&self, target: TargetKind) -> &[Row] {
        match target {
            TargetKind::Player => &self.fixture.players,
            TargetKind::Team => &self.fixture.teams,
            TargetKind::Schedule | TargetKind::Result => &self.fixture.games,
        }
    }

    fn validate(&self, plan: &QueryPlan, rows: &[Row]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let columns: HashSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
        for field in plan.referenced_fields() {
            if !columns.contains(field) && !is_virtual_team(plan.target, field) {
                return Err(StoreError::InvalidField {
                    table: plan.target.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Filter, sort, limit and project without any I/O.
    pub fn evaluate(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        let source = self.rows(plan.target);
        self.validate(plan, source)?;

        let mut rows: Vec<Row> = source
            .iter()
            .filter(|row| plan.filters.iter().all(|f| row_matches(row, plan.target, f)))
            .cloned()
            .collect();

        if let Some(sort) = &plan.sort {
            rows.sort_by(|a, b| sort_order(a.get(&sort.field), b.get(&sort.field), sort.direction));
        }

        if let Some(limit) = plan.limit {
            rows.truncate(limit as usize);
        }

        if !plan.fields.is_empty() {
            rows = rows
                .into_iter()
                .map(|row| {
                    plan.fields
                        .iter()
                        .map(|f| (f.clone(), row.get(f).cloned().unwrap_or(FieldValue::Null)))
                        .collect()
                })
                .collect();
        }

        debug!("Memory store matched {} rows for {}", rows.len(), plan.target);
        Ok(rows)
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        self.evaluate(plan)
    }

    async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError> {
        Ok(self
            .fixture
            .players
            .iter()
            .filter_map(|row| {
                let player_id = row.get("player_id")?.render(None);
                let name = row.get("player_name")?.as_text()?.to_string();
                Some(PlayerListing {
                    player_id,
                    name,
                    team: row.get("team").and_then(|v| v.as_text()).map(str::to_string),
                    role: row
                        .get("role")
                        .and_then(|v| v.as_text())
                        .and_then(|r| r.parse().ok()),
                    aliases: Vec::new(),
                })
            })
            .collect())
    }
}

fn row_matches(row: &Row, target: TargetKind, filter: &Filter) -> bool {
    let expected = filter.value.values();
    let cell_matches = |cell: Option<&FieldValue>| {
        let Some(cell) = cell else { return false };
        match filter.op {
            FilterOp::Eq | FilterOp::In => expected.iter().any(|v| loosely_equal(cell, v)),
            FilterOp::Gte => expected
                .first()
                .and_then(|v| compare(cell, v))
                .map(|o| o != Ordering::Less)
                .unwrap_or(false),
            FilterOp::Lte => expected
                .first()
                .and_then(|v| compare(cell, v))
                .map(|o| o != Ordering::Greater)
                .unwrap_or(false),
        }
    };

    if is_virtual_team(target, &filter.field) {
        cell_matches(row.get("home_team")) || cell_matches(row.get("away_team"))
    } else {
        cell_matches(row.get(&filter.field))
    }
}

fn loosely_equal(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x.eq_ignore_ascii_case(y),
        _ => compare(a, b) == Some(Ordering::Equal),
    }
}

fn compare(a: &FieldValue, b: &FieldValue) -> Option<Ordering> {
    match (a, b) {
        (FieldValue::Null, _) | (_, FieldValue::Null) => None,
        (FieldValue::Text(x), FieldValue::Text(y)) => Some(x.cmp(y)),
        (FieldValue::Boolean(x), FieldValue::Boolean(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Nulls (and missing cells) sort last in both directions.
fn sort_order(a: Option<&FieldValue>, b: Option<&FieldValue>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare(x, y).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dugout_core::PlayerRole;

    const FIXTURE: &str = r#"{
        "players": [
            {"player_id": "1", "player_name": "가", "team": "HH", "role": "batter", "hra": 0.301, "hr": 10},
            {"player_id": "2", "player_name": "나", "team": "HH", "role": "batter", "hra": 0.322, "hr": 3},
            {"player_id": "3", "player_name": "다", "team": "LG", "role": "batter", "hra": 0.290, "hr": 25},
            {"player_id": "4", "player_name": "라", "team": "HH", "role": "pitcher", "hra": null, "hr": null},
            {"player_id": "5", "player_name": "마", "team": "HH", "role": "batter", "hra": 0.301, "hr": 7}
        ],
        "teams": [
            {"team": "LG", "ranking": 1, "wra": 0.603},
            {"team": "HH", "ranking": 2, "wra": 0.593}
        ],
        "games": [
            {"game_id": "g1", "game_date": "2025-09-20", "home_team": "LG", "away_team": "HH", "status": "RESULT"},
            {"game_id": "g2", "game_date": "2025-09-21", "home_team": "SS", "away_team": "NC", "status": "RESULT"},
            {"game_id": "g3", "game_date": "2025-09-22", "home_team": "HH", "away_team": "SS", "status": "BEFORE"}
        ]
    }"#;

    fn store() -> MemoryStore {
        MemoryStore::from_json_str(FIXTURE).unwrap()
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.get("player_id").or_else(|| r.get("game_id")).unwrap().render(None))
            .collect()
    }

    #[test]
    fn ranking_sorts_desc_with_stable_ties() {
        let plan = QueryPlan::new(TargetKind::Player)
            .eq("team", "HH")
            .eq("role", "batter")
            .sort_by("hra", SortDirection::Desc)
            .limit(5);
        let rows = store().evaluate(&plan).unwrap();
        // 1 and 5 tie on .301 and keep fixture order.
        assert_eq!(ids(&rows), vec!["2", "1", "5"]);
    }

    #[test]
    fn nulls_sort_last_even_ascending() {
        let plan = QueryPlan::new(TargetKind::Player)
            .eq("team", "HH")
            .sort_by("hr", SortDirection::Asc);
        let rows = store().evaluate(&plan).unwrap();
        assert_eq!(ids(&rows), vec!["2", "5", "1", "4"]);
    }

    #[test]
    fn in_filter_and_projection_keep_requested_order() {
        let plan = QueryPlan::new(TargetKind::Player)
            .one_of("player_id", vec!["3".into(), "1".into()])
            .fields(&["player_name", "hr"]);
        let rows = store().evaluate(&plan).unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["player_name", "hr"]);
    }

    #[test]
    fn virtual_team_column_matches_home_or_away() {
        let plan = QueryPlan::new(TargetKind::Result).eq("team", "HH").eq("status", "RESULT");
        assert_eq!(ids(&store().evaluate(&plan).unwrap()), vec!["g1"]);

        let both = QueryPlan::new(TargetKind::Schedule).eq("team", "HH").eq("team", "SS");
        assert_eq!(ids(&store().evaluate(&both).unwrap()), vec!["g3"]);
    }

    #[test]
    fn date_range_filters_compare_text_dates() {
        let plan = QueryPlan::new(TargetKind::Schedule)
            .gte("game_date", "2025-09-21")
            .lte("game_date", "2025-09-21");
        assert_eq!(ids(&store().evaluate(&plan).unwrap()), vec!["g2"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let plan = QueryPlan::new(TargetKind::Team).sort_by("payroll", SortDirection::Desc);
        let err = store().evaluate(&plan).unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let plan = QueryPlan::new(TargetKind::Player).eq("team", "KT");
        assert!(store().evaluate(&plan).unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_players_reads_roles() {
        let players = store().list_players().await.unwrap();
        assert_eq!(players.len(), 5);
        assert_eq!(players[3].role, Some(PlayerRole::Pitcher));
        assert_eq!(players[0].team.as_deref(), Some("HH"));
    }
}
