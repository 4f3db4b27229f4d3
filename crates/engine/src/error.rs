use dugout_catalog::{CatalogError, ExecutorError};
use thiserror::Error;

use crate::planner::PlanningError;

/// Any stage failure inside one answer. Never shown to the user verbatim.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("execution failed: {0}")]
    Executor(#[from] ExecutorError),
}

impl AnswerError {
    /// Stage label for logs and traces.
    pub fn stage(&self) -> &'static str {
        match self {
            AnswerError::Catalog(_) => "catalog",
            AnswerError::Planning(_) => "planning",
            AnswerError::Executor(_) => "execution",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AnswerError::Catalog(_) => true,
            AnswerError::Planning(_) => false,
            AnswerError::Executor(e) => e.is_retryable(),
        }
    }
}
