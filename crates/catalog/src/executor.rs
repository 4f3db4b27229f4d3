use std::sync::Arc;
use std::time::Duration;

use dugout_core::{Row, TargetKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::plan::QueryPlan;
use crate::source::{StatsStore, StoreError};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl ExecutorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorError::StoreUnavailable(_))
    }
}

impl From<StoreError> for ExecutorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ExecutorError::StoreUnavailable(msg),
            other => ExecutorError::Query(other.to_string()),
        }
    }
}

/// Rows returned for one plan, in store order.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub target: TargetKind,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Runs plans against a [`StatsStore`] with a bounded wait.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn StatsStore>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn StatsStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn StatsStore> {
        &self.store
    }

    /// Execute a plan. Rows are never re-ordered; anything past the plan
    /// limit is dropped.
    pub async fn execute(&self, plan: &QueryPlan) -> Result<QueryResult, ExecutorError> {
        debug!("Executing on {}: {}", self.store.name(), plan);

        let mut rows = match tokio::time::timeout(self.timeout, self.store.execute(plan)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Store '{}' did not answer within {} ms",
                    self.store.name(),
                    self.timeout.as_millis()
                );
                return Err(ExecutorError::StoreUnavailable(format!(
                    "timed out after {} ms",
                    self.timeout.as_millis()
                )));
            }
        };

        if let Some(limit) = plan.limit {
            let limit = limit as usize;
            if rows.len() > limit {
                debug!("Store returned {} rows, truncating to {}", rows.len(), limit);
                rows.truncate(limit);
            }
        }

        debug!("Plan returned {} rows", rows.len());
        Ok(QueryResult {
            target: plan.target,
            rows,
        })
    }
}
