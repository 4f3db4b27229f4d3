//! Intent + entities → store-agnostic [`QueryPlan`].

use chrono::NaiveDate;
use dugout_catalog::{EntityCatalog, QueryPlan};
use dugout_core::config::EngineConfig;
use dugout_core::{EntityKind, FieldValue, IntentKind, SortDirection, TargetKind};
use thiserror::Error;
use tracing::debug;

use crate::intent::Intent;
use crate::params::DateRange;

/// Days ahead covered by a team schedule question with no date.
const UPCOMING_DAYS: u64 = 7;

/// The intent is understood but cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("{intent} needs a {needed} entity")]
    MissingEntity { intent: IntentKind, needed: EntityKind },
    #[error("criterion '{criterion}' has no stat column mapping")]
    CriterionUnmapped { criterion: String, name: String },
    #[error("table '{table}' does not expose sort field '{field}'")]
    SortFieldUnavailable { table: String, field: String },
    #[error("no {0} table in the catalog")]
    TableUnavailable(TargetKind),
    #[error("nothing to plan for an UNKNOWN intent")]
    NothingToPlan,
}

#[derive(Debug, Clone)]
pub struct QueryPlanner {
    default_limit: u32,
    max_limit: u32,
}

impl QueryPlanner {
    pub fn new(config: &EngineConfig) -> Self {
        let max_limit = config.max_limit.max(1);
        Self {
            default_limit: config.default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    /// Explicit handler per intent kind.
    pub fn plan(
        &self,
        intent: &Intent,
        catalog: &EntityCatalog,
        today: NaiveDate,
    ) -> Result<QueryPlan, PlanningError> {
        let plan = match intent.kind {
            IntentKind::Ranking => self.plan_ranking(intent, catalog),
            IntentKind::PlayerLookup => self.plan_player_lookup(intent),
            IntentKind::TeamRoster => self.plan_team_roster(intent),
            IntentKind::Schedule => self.plan_schedule(intent, catalog, today),
            IntentKind::HeadToHead => self.plan_head_to_head(intent),
            IntentKind::Unknown => Err(PlanningError::NothingToPlan),
        }?;
        debug!("Planned {}: {}", intent.kind, plan);
        Ok(plan)
    }

    fn clamp(&self, n: u32) -> u32 {
        n.clamp(1, self.max_limit)
    }

    fn limit_or_default(&self, intent: &Intent) -> u32 {
        self.clamp(intent.params.count.unwrap_or(self.default_limit))
    }

    fn limit_or_max(&self, intent: &Intent) -> u32 {
        self.clamp(intent.params.count.unwrap_or(self.max_limit))
    }

    fn plan_ranking(&self, intent: &Intent, catalog: &EntityCatalog) -> Result<QueryPlan, PlanningError> {
        let missing = PlanningError::MissingEntity {
            intent: IntentKind::Ranking,
            needed: EntityKind::Criterion,
        };
        let criterion_id = intent.params.criterion.as_deref().ok_or(missing.clone())?;
        let criterion = catalog
            .get(EntityKind::Criterion, criterion_id)
            .ok_or(missing)?;
        let mapping = criterion
            .mapping()
            .ok_or_else(|| PlanningError::CriterionUnmapped {
                criterion: criterion.canonical_id.clone(),
                name: criterion.display_name.clone(),
            })?;
        let table = catalog
            .table(mapping.target)
            .ok_or(PlanningError::TableUnavailable(mapping.target))?;
        if !table.has_column(&mapping.column) {
            return Err(PlanningError::SortFieldUnavailable {
                table: table.name.clone(),
                field: mapping.column.clone(),
            });
        }

        let mut plan = QueryPlan::new(mapping.target);
        if table.has_column("team") {
            plan = team_filter(plan, &intent.teams());
        }
        if mapping.target == TargetKind::Player {
            if let Some(role) = intent.params.role.or(mapping.role) {
                plan = plan.eq("role", role.as_str());
            }
        }
        // Natural direction only; "낮은 순" and the like do not flip it.
        Ok(plan
            .sort_by(&mapping.column, mapping.direction)
            .limit(self.limit_or_default(intent)))
    }

    fn plan_player_lookup(&self, intent: &Intent) -> Result<QueryPlan, PlanningError> {
        let players = intent.players();
        let plan = match players.as_slice() {
            [] => {
                return Err(PlanningError::MissingEntity {
                    intent: IntentKind::PlayerLookup,
                    needed: EntityKind::Player,
                })
            }
            [one] => QueryPlan::new(TargetKind::Player).eq("player_id", *one),
            many => QueryPlan::new(TargetKind::Player).one_of("player_id", to_values(many)),
        };
        Ok(plan.limit(self.clamp(players.len() as u32)))
    }

    fn plan_team_roster(&self, intent: &Intent) -> Result<QueryPlan, PlanningError> {
        let teams = intent.teams();
        if teams.is_empty() {
            return Err(PlanningError::MissingEntity {
                intent: IntentKind::TeamRoster,
                needed: EntityKind::Team,
            });
        }
        let mut plan = team_filter(QueryPlan::new(TargetKind::Player), &teams);
        if let Some(role) = intent.params.role {
            plan = plan.eq("role", role.as_str());
        }
        Ok(plan
            .sort_by("player_name", SortDirection::Asc)
            .limit(self.limit_or_max(intent)))
    }

    fn plan_schedule(
        &self,
        intent: &Intent,
        catalog: &EntityCatalog,
        today: NaiveDate,
    ) -> Result<QueryPlan, PlanningError> {
        // "문동주 언제 나와?" asks about the player's team.
        let mut teams = intent.teams();
        if teams.is_empty() {
            for id in intent.players() {
                if let Some(team) = catalog.get(EntityKind::Player, id).and_then(|e| e.player_team()) {
                    if !teams.contains(&team) {
                        teams.push(team);
                    }
                }
            }
        }

        // Without a date a team question means its upcoming games, a league
        // question means today's slate.
        let range = match intent.params.date_range {
            Some(range) => range,
            None if teams.is_empty() => DateRange::day(today),
            None => DateRange::upcoming(today, UPCOMING_DAYS),
        };

        let plan = QueryPlan::new(TargetKind::Schedule)
            .gte("game_date", range.start.to_string())
            .lte("game_date", range.end.to_string());
        let plan = team_filter(plan, &teams);
        let sort_field = if range.is_single_day() { "game_time" } else { "game_date" };
        Ok(plan
            .sort_by(sort_field, SortDirection::Asc)
            .limit(self.limit_or_max(intent)))
    }

    fn plan_head_to_head(&self, intent: &Intent) -> Result<QueryPlan, PlanningError> {
        let teams = intent.teams();
        if teams.is_empty() {
            return Err(PlanningError::MissingEntity {
                intent: IntentKind::HeadToHead,
                needed: EntityKind::Team,
            });
        }

        // Two teams select the games between them; one or three and more
        // select any game involving them.
        let mut plan = match teams.as_slice() {
            [home, away] => QueryPlan::new(TargetKind::Result).eq("team", *home).eq("team", *away),
            many => team_filter(QueryPlan::new(TargetKind::Result), many),
        };
        plan = plan.eq("status", "RESULT");
        if let Some(range) = intent.params.date_range {
            plan = plan
                .gte("game_date", range.start.to_string())
                .lte("game_date", range.end.to_string());
        }
        Ok(plan
            .sort_by("game_date", SortDirection::Desc)
            .limit(self.limit_or_default(intent)))
    }
}

/// `team = X` for one team, `team IN (...)` for several.
fn team_filter(plan: QueryPlan, teams: &[&str]) -> QueryPlan {
    match teams {
        [] => plan,
        [one] => plan.eq("team", *one),
        many => plan.one_of("team", to_values(many)),
    }
}

fn to_values(ids: &[&str]) -> Vec<FieldValue> {
    ids.iter().map(|id| FieldValue::from(*id)).collect()
}
