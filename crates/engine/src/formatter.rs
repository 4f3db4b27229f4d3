//! Korean answer text for results and for every failure kind.

use dugout_catalog::{EntityCatalog, ExecutorError, QueryResult};
use dugout_core::{EntityKind, FieldValue, IntentKind, PlayerRole, Row, TargetKind};

use crate::intent::Intent;
use crate::planner::PlanningError;

pub const NO_DATA: &str = "데이터를 찾을 수 없습니다.";
pub const NOT_UNDERSTOOD: &str =
    "질문을 이해하지 못했어요. 선수 기록, 순위, 팀 명단, 경기 일정이나 결과를 물어봐 주세요.";
const NEED_MORE: &str = "정보가 조금 더 필요해요.";
const RETRY: &str = "잠시 후 다시 시도해 주세요.";

const BATTER_COLUMNS: &[&str] = &["hra", "hr", "rbi", "hit", "sb", "obp", "slg", "ops", "war"];
const PITCHER_COLUMNS: &[&str] = &["era", "w", "l", "sv", "hold", "kk", "inn", "whip", "war"];

/// Renders answers against one catalog snapshot.
pub struct ResponseFormatter<'a> {
    catalog: &'a EntityCatalog,
}

impl<'a> ResponseFormatter<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        Self { catalog }
    }

    pub fn render(&self, intent: &Intent, result: &QueryResult) -> String {
        if result.is_empty() {
            return format!("{} {}", NO_DATA, no_data_hint(intent.kind));
        }
        match intent.kind {
            IntentKind::Ranking => self.ranking(intent, &result.rows),
            IntentKind::PlayerLookup => self.player_summaries(&result.rows),
            IntentKind::TeamRoster => self.roster(intent, &result.rows),
            IntentKind::Schedule => self.schedule(intent, &result.rows),
            IntentKind::HeadToHead => self.results(intent, &result.rows),
            IntentKind::Unknown => NOT_UNDERSTOOD.to_string(),
        }
    }

    pub fn planning_error(&self, err: &PlanningError) -> String {
        let detail = match err {
            PlanningError::MissingEntity { needed, .. } => match needed {
                EntityKind::Criterion => {
                    "어떤 기록으로 순위를 볼까요? (예: 타율, 홈런, 평균자책점)".to_string()
                }
                EntityKind::Player => "어떤 선수인지 이름을 함께 적어 주세요.".to_string(),
                EntityKind::Team => "어느 팀인지 팀 이름을 함께 적어 주세요.".to_string(),
            },
            PlanningError::CriterionUnmapped { name, .. } => {
                format!("'{}' 기록은 아직 제공하지 않아요. 다른 기록으로 물어봐 주세요.", name)
            }
            PlanningError::SortFieldUnavailable { .. } | PlanningError::TableUnavailable(_) => {
                "요청하신 기준으로는 순위를 매길 수 없어요. 다른 기록으로 물어봐 주세요.".to_string()
            }
            PlanningError::NothingToPlan => return NOT_UNDERSTOOD.to_string(),
        };
        format!("{} {}", NEED_MORE, detail)
    }

    fn team_label<'s>(&'s self, code: &'s str) -> &'s str {
        self.catalog.team_name(code).unwrap_or(code)
    }

    fn ranking(&self, intent: &Intent, rows: &[Row]) -> String {
        let criterion = intent
            .params
            .criterion
            .as_deref()
            .and_then(|id| self.catalog.get(EntityKind::Criterion, id));
        let Some((name, mapping)) =
            criterion.and_then(|c| Some((c.display_name.as_str(), c.mapping()?)))
        else {
            return self.player_summaries(rows);
        };

        let mut scope: Vec<&str> = intent.teams().into_iter().map(|t| self.team_label(t)).collect();
        if mapping.target == TargetKind::Player {
            if let Some(role) = intent.params.role.or(mapping.role) {
                scope.push(role.label());
            }
        }
        scope.push(name);
        let header = if name.ends_with("순위") {
            scope.join(" ")
        } else {
            format!("{} 순위", scope.join(" "))
        };

        let mut lines = vec![header];
        for (i, row) in rows.iter().enumerate() {
            let value = render_cell(row, &mapping.column, mapping.precision);
            let line = match mapping.target {
                TargetKind::Team => {
                    let team = text(row, "team_name").or_else(|| text(row, "team")).unwrap_or("-");
                    format!("{}. {} {} {}{}", i + 1, team, name, value, standings_suffix(row))
                }
                _ => {
                    let player = text(row, "player_name").unwrap_or("-");
                    let team = self.row_team(row);
                    format!("{}. {} ({}) {} {}", i + 1, player, team, name, value)
                }
            };
            lines.push(line);
        }
        lines.join("\n")
    }

    fn row_team<'s>(&'s self, row: &'s Row) -> &'s str {
        text(row, "team_name")
            .or_else(|| text(row, "team").map(|code| self.team_label(code)))
            .unwrap_or("-")
    }

    fn player_summaries(&self, rows: &[Row]) -> String {
        rows.iter()
            .map(|row| self.player_summary(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn player_summary(&self, row: &Row) -> String {
        let name = text(row, "player_name").unwrap_or("-");
        let role = text(row, "role").and_then(|r| r.parse::<PlayerRole>().ok());
        let columns = match role {
            Some(PlayerRole::Pitcher) => PITCHER_COLUMNS,
            _ => BATTER_COLUMNS,
        };

        let mut head = vec![self.row_team(row).to_string()];
        if let Some(position) = text(row, "position") {
            head.push(position.to_string());
        } else if let Some(role) = role {
            head.push(role.label().to_string());
        }

        let mut stats = Vec::new();
        if let Some(games) = present(row, "games") {
            stats.push(format!("{}경기", games.render(None)));
        }
        for column in columns {
            let Some(value) = present(row, column) else { continue };
            let (label, precision) = self.column_label(column);
            stats.push(format!("{} {}", label, value.render(precision)));
        }

        if stats.is_empty() {
            format!("{} ({}): 등록된 기록이 없어요.", name, head.join(", "))
        } else {
            format!("{} ({}): {}", name, head.join(", "), stats.join(", "))
        }
    }

    /// Criterion name and precision for a player column.
    fn column_label(&self, column: &str) -> (String, Option<usize>) {
        let mapped = self
            .catalog
            .criterion_for_column(TargetKind::Player, column)
            .and_then(|c| Some((c.display_name.clone(), c.mapping()?.precision)));
        match mapped {
            Some((label, precision)) => (label, precision),
            None => {
                let label = match column {
                    "l" => "패",
                    "games" => "경기",
                    other => other,
                };
                (label.to_string(), None)
            }
        }
    }

    fn roster(&self, intent: &Intent, rows: &[Row]) -> String {
        let mut scope: Vec<&str> = intent.teams().into_iter().map(|t| self.team_label(t)).collect();
        if let Some(role) = intent.params.role {
            scope.push(role.label());
        }
        let several_teams = intent.teams().len() > 1;

        let mut lines = vec![format!("{} 명단 ({}명)", scope.join(" "), rows.len())];
        for row in rows {
            let name = text(row, "player_name").unwrap_or("-");
            let position = text(row, "position")
                .map(str::to_string)
                .or_else(|| {
                    text(row, "role")
                        .and_then(|r| r.parse::<PlayerRole>().ok())
                        .map(|r| r.label().to_string())
                })
                .unwrap_or_else(|| "-".to_string());
            if several_teams {
                lines.push(format!("- {} ({}, {})", name, self.row_team(row), position));
            } else {
                lines.push(format!("- {} ({})", name, position));
            }
        }
        lines.join("\n")
    }

    fn schedule(&self, intent: &Intent, rows: &[Row]) -> String {
        let header = match intent.params.date_range {
            Some(range) => format!("{} 경기 일정", range),
            None => "경기 일정".to_string(),
        };
        let mut lines = vec![header];
        for row in rows {
            let status = match text(row, "status") {
                Some("BEFORE") => match starters(row) {
                    Some(starters) => format!("경기 예정, {}", starters),
                    None => "경기 예정".to_string(),
                },
                Some("RESULT") => format!(
                    "종료 {}:{}",
                    render_cell(row, "away_score", None),
                    render_cell(row, "home_score", None)
                ),
                Some("CANCEL") => "취소".to_string(),
                Some(other) => other.to_string(),
                None => "-".to_string(),
            };
            lines.push(format!(
                "- {} {} {} vs {} @ {} ({})",
                render_cell(row, "game_date", None),
                render_cell(row, "game_time", None),
                self.game_team(row, "away"),
                self.game_team(row, "home"),
                render_cell(row, "stadium", None),
                status
            ));
        }
        lines.join("\n")
    }

    fn game_team<'s>(&'s self, row: &'s Row, side: &str) -> &'s str {
        text(row, &format!("{side}_team_name"))
            .or_else(|| text(row, &format!("{side}_team")).map(|code| self.team_label(code)))
            .unwrap_or("-")
    }

    fn results(&self, intent: &Intent, rows: &[Row]) -> String {
        let teams = intent.teams();
        let names: Vec<&str> = teams.iter().map(|t| self.team_label(t)).collect();
        let mut lines = vec![format!("{} 경기 결과", names.join(" vs "))];

        for row in rows {
            let outcome = match text(row, "winner") {
                Some("DRAW") => "무승부".to_string(),
                Some(code) => format!("{} 승", self.team_label(code)),
                None => "-".to_string(),
            };
            lines.push(format!(
                "- {} {} {} : {} {} @ {} ({})",
                render_cell(row, "game_date", None),
                self.game_team(row, "away"),
                render_cell(row, "away_score", None),
                render_cell(row, "home_score", None),
                self.game_team(row, "home"),
                render_cell(row, "stadium", None),
                outcome
            ));
        }

        if let Some(first) = teams.first() {
            let (w, l, d) = record(rows, first);
            let label = if teams.len() == 2 { "상대 전적" } else { "최근 전적" };
            lines.push(format!(
                "{} ({} 기준): {}승 {}패 {}무",
                label,
                self.team_label(first),
                w,
                l,
                d
            ));
        }
        lines.join("\n")
    }
}

/// Message for a failed store call. Raw errors never reach the answer.
pub fn executor_error(err: &ExecutorError) -> String {
    match err {
        ExecutorError::StoreUnavailable(_) => {
            format!("지금은 기록 데이터에 접근할 수 없어요. {}", RETRY)
        }
        ExecutorError::Query(_) => format!("기록을 조회하는 중 문제가 생겼어요. {}", RETRY),
    }
}

pub fn catalog_unavailable() -> String {
    format!("선수와 팀 정보를 아직 불러오지 못했어요. {}", RETRY)
}

fn no_data_hint(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Ranking => "조건에 맞는 선수가 없어요. 팀이나 포지션 조건을 바꿔 보세요.",
        IntentKind::PlayerLookup => "해당 선수의 기록이 아직 없어요.",
        IntentKind::TeamRoster => "해당 팀의 선수 명단이 비어 있어요.",
        IntentKind::Schedule => "해당 기간에 잡힌 경기가 없어요.",
        IntentKind::HeadToHead => "해당 팀의 경기 결과가 없어요.",
        IntentKind::Unknown => "다른 질문으로 다시 물어봐 주세요.",
    }
}

/// Wins, losses and draws for `team` over finished games.
/// Wins, losses and draws of `team` over the games it played in.
fn record(rows: &[Row], team: &str) -> (usize, usize, usize) {
    let played = |row: &&Row| text(row, "home_team") == Some(team) || text(row, "away_team") == Some(team);
    rows.iter().filter(played).fold((0, 0, 0), |(w, l, d), row| match text(row, "winner") {
        Some("DRAW") => (w, l, d + 1),
        Some(code) if code == team => (w + 1, l, d),
        Some(_) => (w, l + 1, d),
        None => (w, l, d),
    })
}

fn standings_suffix(row: &Row) -> String {
    match (
        present(row, "win_game_count"),
        present(row, "lose_game_count"),
        present(row, "drawn_game_count"),
    ) {
        (Some(w), Some(l), Some(d)) => format!(
            " ({}승 {}패 {}무)",
            w.render(None),
            l.render(None),
            d.render(None)
        ),
        _ => String::new(),
    }
}

fn text<'r>(row: &'r Row, key: &str) -> Option<&'r str> {
    row.get(key).and_then(FieldValue::as_text)
}

fn present<'r>(row: &'r Row, key: &str) -> Option<&'r FieldValue> {
    row.get(key).filter(|v| !v.is_null())
}

/// "선발 away vs home" once either side has been announced.
fn starters(row: &Row) -> Option<String> {
    let away = text(row, "away_starter");
    let home = text(row, "home_starter");
    if away.is_none() && home.is_none() {
        return None;
    }
    Some(format!(
        "선발 {} vs {}",
        away.unwrap_or("미정"),
        home.unwrap_or("미정")
    ))
}

fn render_cell(row: &Row, key: &str, precision: Option<usize>) -> String {
    row.get(key)
        .map(|v| v.render(precision))
        .unwrap_or_else(|| "-".to_string())
}
