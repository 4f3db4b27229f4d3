use async_trait::async_trait;
use dugout_core::{PlayerRole, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::QueryPlan;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or availability problem; the caller may retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("unknown field '{field}' on {table}")]
    InvalidField { table: String, field: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// One player as listed by the store, used to populate the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerListing {
    pub player_id: String,
    pub name: String,
    pub team: Option<String>,
    pub role: Option<PlayerRole>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Read-only access to the normalized statistics tables.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Short backend name for logs ("memory", "postgres").
    fn name(&self) -> &str;

    /// Run a plan. Zero matching rows is `Ok(vec![])`.
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<Row>, StoreError>;

    async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError>;
}
