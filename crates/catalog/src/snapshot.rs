use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::catalog::EntityCatalog;
use crate::error::CatalogError;
use crate::manifest::short_version;

/// Source of the catalog snapshot used for one request.
pub trait CatalogProvider: Send + Sync {
    /// Current snapshot, or an error if no usable catalog is loaded.
    fn load_catalog(&self) -> Result<Arc<EntityCatalog>, CatalogError>;
}

/// Atomically swappable pointer to the live catalog.
///
/// Readers take a snapshot once per request and keep using it even if a
/// refresh swaps in a newer catalog meanwhile.
pub struct CatalogHandle {
    current: ArcSwap<EntityCatalog>,
}

impl CatalogHandle {
    pub fn new(catalog: EntityCatalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(catalog),
        }
    }

    pub fn snapshot(&self) -> Arc<EntityCatalog> {
        self.current.load_full()
    }

    /// Swap in a new catalog, returning the one it replaced.
    pub fn replace(&self, catalog: EntityCatalog) -> Arc<EntityCatalog> {
        let version = catalog.version.clone();
        let entries = catalog.len();
        let previous = self.current.swap(Arc::new(catalog));
        info!(
            "Catalog swapped: {} -> {} ({} entries)",
            short_version(&previous.version),
            short_version(&version),
            entries
        );
        previous
    }

    pub fn version(&self) -> String {
        self.current.load().version.clone()
    }
}

impl CatalogProvider for CatalogHandle {
    fn load_catalog(&self) -> Result<Arc<EntityCatalog>, CatalogError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(snapshot)
    }
}
