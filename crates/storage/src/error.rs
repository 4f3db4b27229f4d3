use thiserror::Error;

/// Errors raised while opening a stats store. Query-time failures use
/// [`dugout_catalog::StoreError`] instead.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fixture parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("catalog seed error: {0}")]
    Catalog(#[from] dugout_catalog::CatalogError),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("unknown store backend '{0}' (expected memory or postgres)")]
    UnknownBackend(String),
}
