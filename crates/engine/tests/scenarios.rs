//! End-to-end questions against the bundled seed and the JSON fixture.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dugout_catalog::{
    CatalogHandle, CatalogRefresher, CatalogSeed, FilterValue, PlayerListing, QueryExecutor,
    QueryPlan, StatsStore, StoreError,
};
use dugout_core::config::EngineConfig;
use dugout_core::{IntentKind, Row, SortDirection, TargetKind};
use dugout_engine::formatter::{NOT_UNDERSTOOD, NO_DATA};
use dugout_engine::{Answerer, Outcome};
use dugout_storage::MemoryStore;

fn fixture_store() -> Arc<MemoryStore> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/fixtures/kbo-sample.json");
    Arc::new(MemoryStore::from_path(&path).unwrap())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 22).unwrap()
}

async fn answerer_over(store: Arc<dyn StatsStore>, config: &EngineConfig) -> Answerer {
    let refresher = CatalogRefresher::new(
        CatalogSeed::bundled().unwrap(),
        store.clone(),
        Duration::from_secs(1),
    );
    let handle = CatalogHandle::new(refresher.build().await.unwrap());
    Answerer::new(
        Arc::new(handle),
        QueryExecutor::new(store, config.store_timeout()),
        config,
    )
    .with_reference_date(today())
}

async fn answerer() -> Answerer {
    answerer_over(fixture_store(), &EngineConfig::default()).await
}

#[tokio::test]
async fn team_batting_average_top_five() {
    let trace = answerer()
        .await
        .answer_detailed("한화 타자 중에 타율 높은 순으로 5명 나열해줘")
        .await;

    let intent = trace.intent.as_ref().unwrap();
    assert_eq!(intent.kind, IntentKind::Ranking);
    assert_eq!(intent.teams(), vec!["HH"]);
    assert_eq!(intent.params.criterion.as_deref(), Some("batting-average"));

    let plan = trace.plan.as_ref().unwrap();
    assert_eq!(plan.target, TargetKind::Player);
    let fields: Vec<&str> = plan.filters.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["team", "role"]);
    let sort = plan.sort.as_ref().unwrap();
    assert_eq!((sort.field.as_str(), sort.direction), ("hra", SortDirection::Desc));
    assert_eq!(plan.limit, Some(5));

    assert_eq!(trace.outcome, Outcome::Answered { rows: 5 });
    assert_eq!(
        trace.answer,
        "한화 타자 타율 순위\n\
         1. 문현빈 (한화) 타율 0.321\n\
         2. 리베라토 (한화) 타율 0.316\n\
         3. 하주석 (한화) 타율 0.296\n\
         4. 채은성 (한화) 타율 0.288\n\
         5. 최재훈 (한화) 타율 0.286"
    );
}

#[tokio::test]
async fn player_lookup_by_exact_name() {
    let trace = answerer().await.answer_detailed("문동주 선수 정보 알려줘").await;

    let intent = trace.intent.as_ref().unwrap();
    assert_eq!(intent.kind, IntentKind::PlayerLookup);
    assert_eq!(intent.entities[0].canonical_id, "52701");
    assert_eq!(intent.entities[0].confidence, 1.0);
    assert_eq!(trace.outcome, Outcome::Answered { rows: 1 });
    assert!(
        trace.answer.starts_with("문동주 (한화, 투수): 24경기, 평균자책점 4.02"),
        "{}",
        trace.answer
    );
}

#[tokio::test]
async fn misspelled_name_within_threshold_resolves() {
    let trace = answerer().await.answer_detailed("문동쥬 기록 알려줘").await;
    let intent = trace.intent.as_ref().unwrap();
    assert_eq!(intent.kind, IntentKind::PlayerLookup);
    assert_eq!(intent.players(), vec!["52701"]);
    assert!(intent.entities[0].confidence < 1.0);
}

#[tokio::test]
async fn name_below_threshold_resolves_to_nothing() {
    let trace = answerer().await.answer_detailed("문재인 기록 알려줘").await;
    assert!(trace.resolution.is_empty());
    assert_eq!(trace.answer, NOT_UNDERSTOOD);
}

#[tokio::test]
async fn greeting_is_not_understood() {
    let trace = answerer().await.answer_detailed("안녕하세요").await;
    assert_eq!(trace.intent.unwrap().kind, IntentKind::Unknown);
    assert_eq!(trace.outcome, Outcome::NotUnderstood);
    assert_eq!(trace.answer, NOT_UNDERSTOOD);
}

#[tokio::test]
async fn answers_are_idempotent() {
    let answerer = answerer().await;
    for question in [
        "한화 타자 중에 타율 높은 순으로 5명 나열해줘",
        "이승현 기록",
        "내일 한화 경기 일정",
    ] {
        let first = answerer.answer(question).await;
        let second = answerer.answer(question).await;
        assert_eq!(first, second, "{question}");
    }
}

#[tokio::test]
async fn requested_count_is_clamped_to_max() {
    let trace = answerer().await.answer_detailed("한화 타자 타율 순위 100명").await;
    assert_eq!(trace.plan.as_ref().unwrap().limit, Some(30));
    // only nine Hanwha batters in the fixture
    assert_eq!(trace.outcome, Outcome::Answered { rows: 9 });
}

#[tokio::test]
async fn era_ranks_ascending() {
    let trace = answerer().await.answer_detailed("평균자책점 순위 알려줘").await;
    let lines: Vec<&str> = trace.answer.lines().collect();
    assert_eq!(lines[0], "투수 평균자책점 순위");
    assert_eq!(lines[1], "1. 폰세 (한화) 평균자책점 1.89");
    assert_eq!(lines.len(), 6);
}

#[tokio::test]
async fn team_standings_show_records() {
    let trace = answerer().await.answer_detailed("팀 순위 알려줘").await;
    let lines: Vec<&str> = trace.answer.lines().collect();
    assert_eq!(lines[1], "1. LG 팀 순위 1 (85승 56패 3무)");
    assert!(lines[2].starts_with("2. 한화"));
}

#[tokio::test]
async fn head_to_head_record() {
    let trace = answerer().await.answer_detailed("한화 LG 상대전적 알려줘").await;
    assert_eq!(trace.intent.as_ref().unwrap().kind, IntentKind::HeadToHead);
    assert_eq!(trace.outcome, Outcome::Answered { rows: 4 });
    assert!(trace.answer.starts_with("한화 vs LG 경기 결과\n- 2025-09-21"), "{}", trace.answer);
    assert!(trace.answer.ends_with("상대 전적 (한화 기준): 2승 1패 1무"), "{}", trace.answer);
}

#[tokio::test]
async fn tomorrow_schedule_for_team() {
    let trace = answerer().await.answer_detailed("내일 한화 경기 일정").await;
    assert_eq!(trace.intent.as_ref().unwrap().kind, IntentKind::Schedule);
    assert_eq!(
        trace.answer,
        "2025-09-23 경기 일정\n- 2025-09-23 18:30 삼성 vs 한화 @ 대전 (경기 예정, 선발 후라도 vs 문동주)"
    );
}

#[tokio::test]
async fn team_schedule_without_date_covers_the_coming_week() {
    let trace = answerer().await.answer_detailed("한화 경기 일정").await;
    let plan = trace.plan.as_ref().unwrap();
    assert_eq!(plan.filters[0].value, FilterValue::Single("2025-09-22".into()));
    assert_eq!(plan.filters[1].value, FilterValue::Single("2025-09-29".into()));
    assert_eq!(trace.outcome, Outcome::Answered { rows: 3 });
    let lines: Vec<&str> = trace.answer.lines().collect();
    assert!(lines[1].starts_with("- 2025-09-22"), "{}", trace.answer);
    assert!(lines[3].starts_with("- 2025-09-24 18:30 NC vs 한화"), "{}", trace.answer);
}

#[tokio::test]
async fn starting_pitcher_question_lists_upcoming_starters() {
    let trace = answerer().await.answer_detailed("한화 선발투수 누구야").await;
    assert_eq!(trace.intent.as_ref().unwrap().kind, IntentKind::Schedule);
    assert_eq!(trace.plan.as_ref().unwrap().target, TargetKind::Schedule);
    assert_eq!(trace.outcome, Outcome::Answered { rows: 3 });
    assert!(
        trace.answer.contains("- 2025-09-22 18:30 삼성 vs 한화 @ 대전 (경기 예정, 선발 원태인 vs 폰세)"),
        "{}",
        trace.answer
    );
    assert!(trace.answer.contains("선발 라일리 vs 미정"), "{}", trace.answer);
}

#[tokio::test]
async fn player_questions_mentioning_games_or_dates_stay_player_lookups() {
    let answerer = answerer().await;
    for question in ["문동주 경기 기록 알려줘", "노시환 몇 경기 나왔어?", "오늘 문동주 성적"] {
        let trace = answerer.answer_detailed(question).await;
        assert_eq!(trace.intent.as_ref().unwrap().kind, IntentKind::PlayerLookup, "{question}");
        assert_eq!(trace.outcome, Outcome::Answered { rows: 1 }, "{question}");
    }
}

#[tokio::test]
async fn results_for_three_teams_cover_each_of_them() {
    let trace = answerer().await.answer_detailed("한화 LG 삼성 경기 결과").await;
    assert_eq!(trace.intent.as_ref().unwrap().kind, IntentKind::HeadToHead);
    assert_eq!(trace.outcome, Outcome::Answered { rows: 5 });
    assert!(trace.answer.starts_with("한화 vs LG vs 삼성 경기 결과"), "{}", trace.answer);
    assert!(trace.answer.contains("삼성 8 : 4 NC"), "{}", trace.answer);
    assert!(trace.answer.ends_with("최근 전적 (한화 기준): 2승 1패 1무"), "{}", trace.answer);
}

#[tokio::test]
async fn schedule_without_games_says_no_data() {
    let trace = answerer().await.answer_detailed("다음주 두산 경기 일정").await;
    assert_eq!(trace.outcome, Outcome::NoData);
    assert!(trace.answer.starts_with(NO_DATA));
}

/// Never answers within any reasonable timeout.
struct StalledStore {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl StatsStore for StalledStore {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn execute(&self, _plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError> {
        self.inner.list_players().await
    }
}

#[tokio::test]
async fn store_timeout_suggests_retry() {
    let config = EngineConfig {
        store_timeout_ms: 50,
        ..EngineConfig::default()
    };
    let store = Arc::new(StalledStore {
        inner: fixture_store(),
    });
    let trace = answerer_over(store, &config)
        .await
        .answer_detailed("문동주 선수 정보 알려줘")
        .await;

    assert!(matches!(
        trace.outcome,
        Outcome::StoreFailed {
            retryable: true,
            ..
        }
    ));
    assert!(trace.answer.contains("다시 시도"), "{}", trace.answer);
    assert!(!trace.answer.contains("timed out"));
}

#[tokio::test]
async fn empty_catalog_asks_to_retry() {
    let seed = CatalogSeed {
        tables: Vec::new(),
        teams: Vec::new(),
        criteria: Vec::new(),
        roles: Vec::new(),
        player_aliases: Vec::new(),
    };
    let catalog = dugout_catalog::CatalogBuilder::new(&seed).build();
    let config = EngineConfig::default();
    let answerer = Answerer::new(
        Arc::new(CatalogHandle::new(catalog)),
        QueryExecutor::new(fixture_store(), config.store_timeout()),
        &config,
    );

    let trace = answerer.answer_detailed("문동주 선수 정보 알려줘").await;
    assert!(matches!(trace.outcome, Outcome::CatalogUnavailable { .. }));
    assert!(trace.answer.contains("다시 시도"));
}
