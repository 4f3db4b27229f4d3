use thiserror::Error;

use crate::source::StoreError;
use crate::store::CatalogStoreError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read seed file {path}: {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid seed: {0}")]
    SeedParse(#[from] serde_yaml::Error),
    #[error("player listing failed: {0}")]
    Store(#[from] StoreError),
    #[error("player listing timed out after {0} ms")]
    StoreTimeout(u64),
    #[error("catalog persistence failed: {0}")]
    Persist(#[from] CatalogStoreError),
    #[error("catalog is empty")]
    Empty,
}
