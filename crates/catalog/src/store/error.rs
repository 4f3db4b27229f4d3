use thiserror::Error;

/// Errors produced by [`CatalogStore`](super::CatalogStore) operations.
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
