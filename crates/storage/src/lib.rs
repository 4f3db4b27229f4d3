pub mod error;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use dugout_catalog::{CatalogSeed, StatsStore};
use dugout_core::{Config, TargetKind};
use tracing::info;

pub use error::StorageError;
pub use memory::{Fixture, MemoryStore};
pub use postgres::{build_select, PgStore};

/// `team` on game targets means "home or away team"; no physical column backs it.
pub(crate) fn is_virtual_team(target: TargetKind, field: &str) -> bool {
    field == "team" && matches!(target, TargetKind::Schedule | TargetKind::Result)
}

/// Open the stats store selected by `STORE_BACKEND`.
pub fn create_store(config: &Config) -> Result<Arc<dyn StatsStore>, StorageError> {
    match config.store.backend.as_str() {
        "memory" => {
            let store = MemoryStore::from_path(&config.store.fixture_path)?;
            Ok(Arc::new(store))
        }
        "postgres" => {
            if !config.postgres.is_configured() {
                return Err(StorageError::NotConfigured("PG_USERNAME not set".into()));
            }
            let seed = CatalogSeed::load(config.catalog.seed_path.as_deref())?;
            let store = PgStore::connect_lazy(
                &config.postgres,
                seed.tables,
                config.engine.store_timeout(),
            )?;
            info!("Stats store: postgres ({})", config.postgres.host);
            Ok(Arc::new(store))
        }
        other => Err(StorageError::UnknownBackend(other.to_string())),
    }
}
