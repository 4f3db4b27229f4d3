use dugout_core::{EntityKind, PlayerRole, SortDirection, TargetKind};

use super::*;
use crate::source::PlayerListing;

fn player(id: &str, name: &str, team: &str, role: Option<PlayerRole>) -> PlayerListing {
    PlayerListing {
        player_id: id.into(),
        name: name.into(),
        team: Some(team.into()),
        role,
        aliases: vec![],
    }
}

fn seed() -> CatalogSeed {
    CatalogSeed::bundled().expect("bundled seed parses")
}

#[test]
fn bundled_seed_has_all_ten_clubs() {
    let seed = seed();
    assert_eq!(seed.teams.len(), 10);
    let codes: Vec<&str> = seed.teams.iter().map(|t| t.code.as_str()).collect();
    for code in ["HH", "OB", "HT", "WO", "LT", "SS", "SK", "KT", "NC", "LG"] {
        assert!(codes.contains(&code), "missing {code}");
    }
}

#[test]
fn entries_are_ordered_teams_criteria_players() {
    let seed = seed();
    let catalog = CatalogBuilder::new(&seed)
        .with_players(vec![player("52701", "문동주", "HH", Some(PlayerRole::Pitcher))])
        .build();

    let kinds: Vec<EntityKind> = catalog.entries.iter().map(|e| e.kind).collect();
    let first_criterion = kinds.iter().position(|k| *k == EntityKind::Criterion).unwrap();
    let first_player = kinds.iter().position(|k| *k == EntityKind::Player).unwrap();
    assert!(kinds[..first_criterion].iter().all(|k| *k == EntityKind::Team));
    assert!(kinds[first_criterion..first_player]
        .iter()
        .all(|k| *k == EntityKind::Criterion));
    assert_eq!(first_player, catalog.len() - 1);
}

#[test]
fn duplicate_ids_keep_first_entry() {
    let seed = seed();
    let catalog = CatalogBuilder::new(&seed)
        .with_players(vec![
            player("1", "이승현", "SS", None),
            player("1", "다른이름", "LG", None),
        ])
        .build();
    let players: Vec<_> = catalog.entries_of(EntityKind::Player).collect();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].display_name, "이승현");
}

#[test]
fn same_name_different_ids_both_kept() {
    let seed = seed();
    let catalog = CatalogBuilder::new(&seed)
        .with_players(vec![
            player("51454", "이승현", "SS", None),
            player("60146", "이승현", "LG", None),
        ])
        .build();
    assert_eq!(catalog.entries_of(EntityKind::Player).count(), 2);
}

#[test]
fn team_aliases_include_full_name_without_duplicates() {
    let catalog = CatalogBuilder::new(&seed()).build();
    let hanwha = catalog.get(EntityKind::Team, "HH").unwrap();
    assert_eq!(hanwha.display_name, "한화");
    assert!(hanwha.aliases.contains(&"한화 이글스".to_string()));
    assert!(!hanwha.aliases.contains(&"한화".to_string()));
    assert_eq!(catalog.team_name("LG"), Some("LG"));
}

#[test]
fn seeded_nicknames_and_roles_attach_to_listed_players() {
    let catalog = CatalogBuilder::new(&seed())
        .with_players(vec![player("55730", "폰세", "HH", None)])
        .build();
    let ponce = catalog.get(EntityKind::Player, "55730").unwrap();
    assert!(ponce.names().any(|n| n == "코디 폰세"));
    assert_eq!(ponce.player_team(), Some("HH"));
}

#[test]
fn criterion_mappings_follow_natural_direction() {
    let catalog = CatalogBuilder::new(&seed()).build();
    let avg = catalog.get(EntityKind::Criterion, "batting-average").unwrap().mapping().unwrap();
    assert_eq!(avg.column, "hra");
    assert_eq!(avg.direction, SortDirection::Desc);
    assert_eq!(avg.role, Some(PlayerRole::Batter));

    let era = catalog.get(EntityKind::Criterion, "era").unwrap().mapping().unwrap();
    assert_eq!(era.direction, SortDirection::Asc);
    assert_eq!(era.role, Some(PlayerRole::Pitcher));

    let standings = catalog.get(EntityKind::Criterion, "standings").unwrap().mapping().unwrap();
    assert_eq!(standings.target, TargetKind::Team);

    assert!(catalog.get(EntityKind::Criterion, "clutch-average").unwrap().mapping().is_none());
}

#[test]
fn every_mapped_column_exists_on_its_table() {
    let catalog = CatalogBuilder::new(&seed()).build();
    for criterion in catalog.entries_of(EntityKind::Criterion) {
        if let Some(m) = criterion.mapping() {
            let table = catalog.table(m.target).expect("table for target");
            assert!(table.has_column(&m.column), "{} -> {}", criterion.canonical_id, m.column);
        }
    }
}

#[test]
fn version_ignores_build_order_but_tracks_content() {
    let seed = seed();
    let a = CatalogBuilder::new(&seed)
        .with_players(vec![player("1", "가", "HH", None), player("2", "나", "LG", None)])
        .build();
    let b = CatalogBuilder::new(&seed)
        .with_players(vec![player("2", "나", "LG", None), player("1", "가", "HH", None)])
        .build();
    let c = CatalogBuilder::new(&seed)
        .with_players(vec![player("1", "가", "HH", None)])
        .build();
    assert_eq!(a.version, b.version);
    assert_ne!(a.version, c.version);
}

#[test]
fn version_tracks_team_role_and_schema_changes() {
    let seed = seed();
    let base = CatalogBuilder::new(&seed)
        .with_players(vec![player("1", "가", "HH", None)])
        .build();
    let traded = CatalogBuilder::new(&seed)
        .with_players(vec![player("1", "가", "LG", None)])
        .build();
    let role = CatalogBuilder::new(&seed)
        .with_players(vec![player("1", "가", "HH", Some(PlayerRole::Pitcher))])
        .build();
    assert_ne!(base.version, traded.version);
    assert_ne!(base.version, role.version);

    let mut widened = seed.clone();
    widened.tables[0].columns.push(ColumnSchema {
        name: "extra".into(),
        data_type: "int".into(),
    });
    let schema = CatalogBuilder::new(&widened)
        .with_players(vec![player("1", "가", "HH", None)])
        .build();
    assert_ne!(base.version, schema.version);
}

#[test]
fn role_keywords_are_exposed() {
    let catalog = CatalogBuilder::new(&seed()).build();
    let roles: Vec<(&str, PlayerRole)> = catalog.role_keywords().collect();
    assert!(roles.contains(&("타자", PlayerRole::Batter)));
    assert!(roles.contains(&("투수", PlayerRole::Pitcher)));
}

#[test]
fn criterion_lookup_by_column() {
    let catalog = CatalogBuilder::new(&seed()).build();
    let c = catalog.criterion_for_column(TargetKind::Player, "era").unwrap();
    assert_eq!(c.display_name, "평균자책점");
    assert!(catalog.criterion_for_column(TargetKind::Team, "era").is_none());
}

#[test]
fn vocabulary_prompt_lists_teams_criteria_and_players() {
    let catalog = CatalogBuilder::new(&seed())
        .with_players(vec![player("52701", "문동주", "HH", Some(PlayerRole::Pitcher))])
        .build();
    let prompt = catalog.vocabulary_prompt();
    assert!(prompt.contains("한화 (HH, home 대전)"));
    assert!(prompt.contains("평균자책점 [era asc]"));
    assert!(prompt.contains("득점권 타율 [no stat column]"));
    assert!(prompt.contains("Players (1 known): 문동주"));
}

#[test]
fn seed_from_missing_path_is_an_error() {
    let err = CatalogSeed::from_path(std::path::Path::new("/nonexistent/seed.yaml")).unwrap_err();
    assert!(err.to_string().contains("cannot read seed file"));
}
