pub mod catalog;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod plan;
pub mod refresh;
pub mod snapshot;
pub mod source;
pub mod store;

pub use catalog::{
    CatalogBuilder, CatalogEntry, CatalogSeed, ColumnSchema, CriterionMapping, EntityCatalog,
    EntryMetadata, RoleKeywords, TableSchema,
};
pub use error::CatalogError;
pub use executor::{ExecutorError, QueryExecutor, QueryResult};
pub use manifest::CatalogManifest;
pub use plan::{Filter, FilterOp, FilterValue, QueryPlan, SortKey};
pub use refresh::{CatalogRefresher, RefreshOutcome};
pub use snapshot::{CatalogHandle, CatalogProvider};
pub use source::{PlayerListing, StatsStore, StoreError};
pub use store::{CatalogStore, CatalogStoreError};
