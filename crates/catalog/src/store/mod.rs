mod error;
mod operations;

pub use error::CatalogStoreError;

use std::path::{Path, PathBuf};

use crate::catalog::EntityCatalog;
use crate::manifest::CatalogManifest;

/// Filesystem-backed catalog persistence.
///
/// Manages the catalog directory:
/// ```text
/// catalog/
///   current.json                <- latest built catalog
///   manifest.json               <- entry count + hash, timestamp
///   snapshots/
///     2025-09-22T04-16-00.json  <- historical snapshots
/// ```
pub struct CatalogStore {
    base_dir: PathBuf,
}

impl CatalogStore {
    /// Create a new CatalogStore, ensuring the directory structure exists.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, CatalogStoreError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join("snapshots"))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Current catalog ─────────────────────────────────────────

    pub fn save_current(&self, catalog: &EntityCatalog) -> Result<(), CatalogStoreError> {
        let json = serde_json::to_string_pretty(catalog)?;
        std::fs::write(self.base_dir.join("current.json"), json)?;
        Ok(())
    }

    pub fn load_current(&self) -> Result<Option<EntityCatalog>, CatalogStoreError> {
        let path = self.base_dir.join("current.json");
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    // ── Manifest ────────────────────────────────────────────────

    pub fn save_manifest(&self, manifest: &CatalogManifest) -> Result<(), CatalogStoreError> {
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(self.base_dir.join("manifest.json"), json)?;
        Ok(())
    }

    pub fn load_manifest(&self) -> Result<Option<CatalogManifest>, CatalogStoreError> {
        let path = self.base_dir.join("manifest.json");
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

#[cfg(test)]
mod tests;
