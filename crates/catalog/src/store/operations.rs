use tracing::info;

use crate::catalog::EntityCatalog;
use crate::manifest::CatalogManifest;

use super::error::CatalogStoreError;
use super::CatalogStore;

impl CatalogStore {
    // ── Snapshots ───────────────────────────────────────────────

    /// Save a snapshot of the catalog with a timestamp-based filename.
    pub fn save_snapshot(&self, catalog: &EntityCatalog) -> Result<String, CatalogStoreError> {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let filename = format!("{}.json", ts);
        let path = self.base_dir.join("snapshots").join(&filename);
        let json = serde_json::to_string_pretty(catalog)?;
        std::fs::write(path, json)?;
        Ok(filename)
    }

    /// Snapshot filenames, oldest first.
    pub fn list_snapshots(&self) -> Result<Vec<String>, CatalogStoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.base_dir.join("snapshots"))? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete all but the newest `keep` snapshots. Returns how many were removed.
    pub fn prune_snapshots(&self, keep: usize) -> Result<usize, CatalogStoreError> {
        let names = self.list_snapshots()?;
        let excess = names.len().saturating_sub(keep);
        for name in &names[..excess] {
            std::fs::remove_file(self.base_dir.join("snapshots").join(name))?;
        }
        Ok(excess)
    }

    // ── High-level operations ───────────────────────────────────

    /// Persist a freshly built catalog: `current.json`, manifest and a snapshot.
    pub fn persist(&self, catalog: &EntityCatalog) -> Result<CatalogManifest, CatalogStoreError> {
        self.save_current(catalog)?;
        let manifest = CatalogManifest::new(catalog.len(), &catalog.content_keys());
        self.save_manifest(&manifest)?;
        let snapshot = self.save_snapshot(catalog)?;

        info!(
            "Catalog persisted to {}: {} entries, snapshot {}",
            self.base_dir.display(),
            catalog.len(),
            snapshot
        );

        Ok(manifest)
    }

    /// Whether the persisted manifest matches `catalog`.
    pub fn is_current(&self, catalog: &EntityCatalog) -> Result<bool, CatalogStoreError> {
        Ok(self
            .load_manifest()?
            .map(|m| m.is_fresh(&catalog.version))
            .unwrap_or(false))
    }
}
