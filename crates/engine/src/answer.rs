//! End-to-end pipeline: resolve, classify, plan, execute, format.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use dugout_catalog::{CatalogProvider, EntityCatalog, QueryExecutor, QueryPlan};
use dugout_core::config::EngineConfig;
use dugout_llm::IntentFallback;
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::IntentClassifier;
use crate::error::AnswerError;
use crate::formatter::{self, ResponseFormatter, NOT_UNDERSTOOD};
use crate::intent::Intent;
use crate::planner::{PlanningError, QueryPlanner};
use crate::resolver::{EntityResolver, Resolution};

/// How one request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Answered { rows: usize },
    NoData,
    NotUnderstood,
    NeedsMoreInfo { reason: String },
    StoreFailed { reason: String, retryable: bool },
    CatalogUnavailable { reason: String },
}

/// Everything the pipeline decided for one utterance.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerTrace {
    pub utterance: String,
    pub reference_date: NaiveDate,
    pub catalog_version: Option<String>,
    pub resolution: Resolution,
    pub intent: Option<Intent>,
    pub plan: Option<QueryPlan>,
    pub outcome: Outcome,
    /// Non-fatal observations: ambiguous spans, fallback failures.
    pub notes: Vec<String>,
    pub answer: String,
}

/// Answers Korean baseball questions. Shareable across tasks.
pub struct Answerer {
    catalog: Arc<dyn CatalogProvider>,
    executor: QueryExecutor,
    resolver: EntityResolver,
    classifier: IntentClassifier,
    planner: QueryPlanner,
    reference_date: Option<NaiveDate>,
}

impl Answerer {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        executor: QueryExecutor,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            executor,
            resolver: EntityResolver::new(config.fuzzy_threshold),
            classifier: IntentClassifier::new(config.classifier_timeout()),
            planner: QueryPlanner::new(config),
            reference_date: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn IntentFallback>) -> Self {
        self.classifier = self.classifier.with_fallback(fallback);
        self
    }

    /// Pin "today" for relative dates. Defaults to the local date per request.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub async fn answer(&self, utterance: &str) -> String {
        self.answer_detailed(utterance).await.answer
    }

    pub async fn answer_detailed(&self, utterance: &str) -> AnswerTrace {
        let mut trace = AnswerTrace {
            utterance: utterance.to_string(),
            reference_date: self.today(),
            catalog_version: None,
            resolution: Resolution::default(),
            intent: None,
            plan: None,
            outcome: Outcome::NotUnderstood,
            notes: Vec::new(),
            answer: String::new(),
        };

        let catalog = match self.catalog.load_catalog() {
            Ok(catalog) => catalog,
            Err(e) => {
                let err = AnswerError::from(e);
                warn!("Cannot answer, {}", err);
                trace.outcome = Outcome::CatalogUnavailable {
                    reason: err.to_string(),
                };
                trace.answer = formatter::catalog_unavailable();
                return trace;
            }
        };
        trace.catalog_version = Some(catalog.version.clone());

        match self.run(&catalog, &mut trace).await {
            Ok(()) => {}
            Err(err) => {
                warn!("Answer failed at {}: {}", err.stage(), err);
                let text = self.describe_failure(&catalog, &err, &mut trace);
                trace.answer = text;
            }
        }
        trace
    }

    async fn run(&self, catalog: &EntityCatalog, trace: &mut AnswerTrace) -> Result<(), AnswerError> {
        let resolution = self.resolver.resolve(&trace.utterance, catalog);
        info!(
            "Resolved {} span(s), {} role qualifier(s)",
            resolution.spans.len(),
            resolution.roles.len()
        );
        if resolution.is_empty() {
            trace.notes.push("no entity recognized".to_string());
        }
        for span in resolution.ambiguous() {
            let choices: Vec<String> = span
                .candidates
                .iter()
                .map(|c| format!("{}:{}", c.kind, c.canonical_id))
                .collect();
            trace.notes.push(format!(
                "'{}' is ambiguous ({}), picked the first",
                span.span,
                choices.join(", ")
            ));
        }

        let classification = self
            .classifier
            .classify(&trace.utterance, &resolution, catalog, trace.reference_date)
            .await;
        trace.resolution = resolution;
        if let Some(e) = classification.fallback_error {
            trace.notes.push(format!("fallback classifier unavailable: {}", e));
        }
        let intent = classification.intent;
        trace.intent = Some(intent.clone());

        if intent.kind == dugout_core::IntentKind::Unknown {
            trace.outcome = Outcome::NotUnderstood;
            trace.answer = NOT_UNDERSTOOD.to_string();
            return Ok(());
        }

        let plan = self.planner.plan(&intent, catalog, trace.reference_date)?;
        info!("Plan: {}", plan);
        trace.plan = Some(plan.clone());

        let result = self.executor.execute(&plan).await?;
        info!("{} row(s) for {}", result.rows.len(), intent.kind);

        trace.outcome = if result.is_empty() {
            Outcome::NoData
        } else {
            Outcome::Answered {
                rows: result.rows.len(),
            }
        };
        trace.answer = ResponseFormatter::new(catalog).render(&intent, &result);
        Ok(())
    }

    fn describe_failure(
        &self,
        catalog: &EntityCatalog,
        err: &AnswerError,
        trace: &mut AnswerTrace,
    ) -> String {
        match err {
            AnswerError::Catalog(e) => {
                trace.outcome = Outcome::CatalogUnavailable {
                    reason: e.to_string(),
                };
                formatter::catalog_unavailable()
            }
            AnswerError::Planning(e) => {
                trace.outcome = if *e == PlanningError::NothingToPlan {
                    Outcome::NotUnderstood
                } else {
                    Outcome::NeedsMoreInfo {
                        reason: e.to_string(),
                    }
                };
                ResponseFormatter::new(catalog).planning_error(e)
            }
            AnswerError::Executor(e) => {
                trace.outcome = Outcome::StoreFailed {
                    reason: e.to_string(),
                    retryable: err.is_retryable(),
                };
                formatter::executor_error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dugout_catalog::{CatalogError, PlayerListing, StatsStore, StoreError};
    use dugout_core::Row;
    use std::sync::Mutex;

    use crate::testing;

    struct FixedCatalog(Option<Arc<EntityCatalog>>);

    impl CatalogProvider for FixedCatalog {
        fn load_catalog(&self) -> Result<Arc<EntityCatalog>, CatalogError> {
            self.0.clone().ok_or(CatalogError::Empty)
        }
    }

    /// Records plans and returns canned rows.
    struct RecordingStore {
        rows: Vec<Row>,
        fail: Option<StoreError>,
        plans: Mutex<Vec<QueryPlan>>,
    }

    impl RecordingStore {
        fn returning(rows: Vec<Row>) -> Arc<Self> {
            Arc::new(Self {
                rows,
                fail: None,
                plans: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: StoreError) -> Arc<Self> {
            Arc::new(Self {
                rows: Vec::new(),
                fail: Some(err),
                plans: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StatsStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn execute(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
            self.plans.lock().unwrap().push(plan.clone());
            match &self.fail {
                Some(StoreError::Unavailable(m)) => Err(StoreError::Unavailable(m.clone())),
                Some(other) => Err(StoreError::Query(other.to_string())),
                None => Ok(self.rows.clone()),
            }
        }

        async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn answerer(store: Arc<RecordingStore>) -> Answerer {
        let config = EngineConfig::default();
        let executor = QueryExecutor::new(store, config.store_timeout());
        Answerer::new(
            Arc::new(FixedCatalog(Some(Arc::new(testing::catalog())))),
            executor,
            &config,
        )
        .with_reference_date(testing::today())
    }

    #[tokio::test]
    async fn unknown_skips_planning_and_store() {
        let store = RecordingStore::returning(Vec::new());
        let trace = answerer(store.clone()).answer_detailed("안녕하세요").await;
        assert_eq!(trace.answer, NOT_UNDERSTOOD);
        assert_eq!(trace.outcome, Outcome::NotUnderstood);
        assert!(trace.plan.is_none());
        assert!(store.plans.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_result_is_no_data() {
        let store = RecordingStore::returning(Vec::new());
        let trace = answerer(store).answer_detailed("문동주 선수 정보 알려줘").await;
        assert_eq!(trace.outcome, Outcome::NoData);
        assert!(trace.answer.starts_with(formatter::NO_DATA));
    }

    #[tokio::test]
    async fn store_errors_never_leak() {
        let store = RecordingStore::failing(StoreError::Query("relation \"x\" does not exist".into()));
        let trace = answerer(store).answer_detailed("문동주 선수 정보 알려줘").await;
        assert!(matches!(trace.outcome, Outcome::StoreFailed { retryable: false, .. }));
        assert!(!trace.answer.contains("relation"));
    }

    #[tokio::test]
    async fn unmapped_criterion_asks_for_another() {
        let store = RecordingStore::returning(Vec::new());
        let trace = answerer(store).answer_detailed("득점권 타율 순위 알려줘").await;
        assert!(matches!(trace.outcome, Outcome::NeedsMoreInfo { .. }));
        assert!(trace.answer.contains("득점권 타율"));
    }

    #[tokio::test]
    async fn missing_catalog_asks_to_retry() {
        let store = RecordingStore::returning(Vec::new());
        let config = EngineConfig::default();
        let answerer = Answerer::new(
            Arc::new(FixedCatalog(None)),
            QueryExecutor::new(store, config.store_timeout()),
            &config,
        );
        let trace = answerer.answer_detailed("문동주").await;
        assert!(matches!(trace.outcome, Outcome::CatalogUnavailable { .. }));
        assert_eq!(trace.answer, formatter::catalog_unavailable());
    }

    #[tokio::test]
    async fn ambiguous_span_is_noted() {
        let store = RecordingStore::returning(Vec::new());
        let trace = answerer(store).answer_detailed("이승현 기록").await;
        assert!(trace.notes.iter().any(|n| n.contains("이승현")), "{:?}", trace.notes);
    }
}
