use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::{CatalogBuilder, CatalogSeed, EntityCatalog};
use crate::error::CatalogError;
use crate::snapshot::CatalogHandle;
use crate::source::StatsStore;
use crate::store::CatalogStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Rebuilt catalog had the same content hash; nothing swapped.
    Unchanged { version: String },
    Replaced { version: String, entries: usize },
}

/// Rebuilds the catalog from seed + store listing and swaps it in.
pub struct CatalogRefresher {
    seed: CatalogSeed,
    store: Arc<dyn StatsStore>,
    persist: Option<CatalogStore>,
    timeout: Duration,
}

impl CatalogRefresher {
    pub fn new(seed: CatalogSeed, store: Arc<dyn StatsStore>, timeout: Duration) -> Self {
        Self {
            seed,
            store,
            persist: None,
            timeout,
        }
    }

    pub fn with_persistence(mut self, store: CatalogStore) -> Self {
        self.persist = Some(store);
        self
    }

    /// Build a catalog without touching any handle.
    pub async fn build(&self) -> Result<EntityCatalog, CatalogError> {
        let players = tokio::time::timeout(self.timeout, self.store.list_players())
            .await
            .map_err(|_| CatalogError::StoreTimeout(self.timeout.as_millis() as u64))??;
        info!("Listed {} players from {}", players.len(), self.store.name());
        Ok(CatalogBuilder::new(&self.seed).with_players(players).build())
    }

    /// Build, then swap into `handle` unless the content hash is unchanged.
    pub async fn refresh(&self, handle: &CatalogHandle) -> Result<RefreshOutcome, CatalogError> {
        let catalog = self.build().await?;
        let version = catalog.version.clone();

        if handle.version() == version {
            info!("Catalog unchanged, keeping current snapshot");
            return Ok(RefreshOutcome::Unchanged { version });
        }

        if let Some(persist) = &self.persist {
            if let Err(e) = persist.persist(&catalog) {
                warn!("Catalog rebuilt but not persisted: {}", e);
            }
        }

        let entries = catalog.len();
        handle.replace(catalog);
        Ok(RefreshOutcome::Replaced { version, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::QueryPlan;
    use crate::source::{PlayerListing, StoreError};
    use async_trait::async_trait;
    use dugout_core::{EntityKind, Row};
    use std::sync::Mutex;

    struct ListingStore {
        players: Mutex<Vec<PlayerListing>>,
    }

    #[async_trait]
    impl StatsStore for ListingStore {
        fn name(&self) -> &str {
            "listing"
        }

        async fn execute(&self, _plan: &QueryPlan) -> Result<Vec<Row>, StoreError> {
            Ok(Vec::new())
        }

        async fn list_players(&self) -> Result<Vec<PlayerListing>, StoreError> {
            Ok(self.players.lock().unwrap().clone())
        }
    }

    fn listing(id: &str, name: &str) -> PlayerListing {
        PlayerListing {
            player_id: id.into(),
            name: name.into(),
            team: Some("HH".into()),
            role: None,
            aliases: vec![],
        }
    }

    #[tokio::test]
    async fn refresh_swaps_only_when_content_changes() {
        let store = Arc::new(ListingStore {
            players: Mutex::new(vec![listing("1", "노시환")]),
        });
        let seed = CatalogSeed::bundled().unwrap();
        let refresher = CatalogRefresher::new(seed.clone(), store.clone(), Duration::from_secs(1));
        let handle = CatalogHandle::new(CatalogBuilder::new(&seed).build());

        let first = refresher.refresh(&handle).await.unwrap();
        assert!(matches!(first, RefreshOutcome::Replaced { .. }));
        let before = handle.snapshot();

        let second = refresher.refresh(&handle).await.unwrap();
        assert!(matches!(second, RefreshOutcome::Unchanged { .. }));
        assert!(Arc::ptr_eq(&before, &handle.snapshot()));

        store.players.lock().unwrap().push(listing("2", "문현빈"));
        refresher.refresh(&handle).await.unwrap();
        assert!(handle.snapshot().get(EntityKind::Player, "2").is_some());
        // The old snapshot is unaffected by the swap.
        assert!(before.get(EntityKind::Player, "2").is_none());
    }

    #[tokio::test]
    async fn refresh_picks_up_trades_and_new_aliases() {
        let store = Arc::new(ListingStore {
            players: Mutex::new(vec![listing("1", "노시환")]),
        });
        let seed = CatalogSeed::bundled().unwrap();
        let refresher = CatalogRefresher::new(seed.clone(), store.clone(), Duration::from_secs(1));
        let handle = CatalogHandle::new(CatalogBuilder::new(&seed).build());
        refresher.refresh(&handle).await.unwrap();

        store.players.lock().unwrap()[0].team = Some("LG".into());
        let traded = refresher.refresh(&handle).await.unwrap();
        assert!(matches!(traded, RefreshOutcome::Replaced { .. }));
        let snapshot = handle.snapshot();
        let player = snapshot.get(EntityKind::Player, "1").unwrap();
        assert_eq!(player.player_team(), Some("LG"));

        store.players.lock().unwrap()[0].aliases = vec!["시환".into()];
        let aliased = refresher.refresh(&handle).await.unwrap();
        assert!(matches!(aliased, RefreshOutcome::Replaced { .. }));
        let snapshot = handle.snapshot();
        let player = snapshot.get(EntityKind::Player, "1").unwrap();
        assert!(player.aliases.iter().any(|a| a == "시환"));
    }

    #[tokio::test]
    async fn refresh_persists_when_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(ListingStore {
            players: Mutex::new(vec![listing("1", "노시환")]),
        });
        let seed = CatalogSeed::bundled().unwrap();
        let refresher = CatalogRefresher::new(seed.clone(), store, Duration::from_secs(1))
            .with_persistence(CatalogStore::new(tmp.path()).unwrap());
        let handle = CatalogHandle::new(CatalogBuilder::new(&seed).build());

        refresher.refresh(&handle).await.unwrap();
        let persisted = CatalogStore::new(tmp.path()).unwrap().load_current().unwrap();
        assert_eq!(persisted.map(|c| c.version), Some(handle.version()));
    }
}
