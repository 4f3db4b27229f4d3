use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Manifest describing which entries a persisted catalog contains.
///
/// `entries_hash` is a SHA-256 hex digest of the sorted, newline-joined
/// content keys. Equal hashes mean a rebuild would not change anything the
/// resolver or planner can see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub entry_count: usize,
    pub entries_hash: String,
    /// ISO 8601 timestamp of when this manifest was created.
    pub created_at: String,
    pub version: u32,
}

impl CatalogManifest {
    /// Keys are sorted internally so insertion order does not affect the hash.
    pub fn new(entry_count: usize, content_keys: &[String]) -> Self {
        Self {
            entry_count,
            entries_hash: hash_content_keys(content_keys),
            created_at: Utc::now().to_rfc3339(),
            version: 1,
        }
    }

    /// Whether this manifest still describes the catalog with hash `current_hash`.
    pub fn is_fresh(&self, current_hash: &str) -> bool {
        self.entries_hash == current_hash
    }
}

/// Deterministic SHA-256 hex hash of content keys, order-independent.
pub fn hash_content_keys(content_keys: &[String]) -> String {
    let mut sorted = content_keys.to_vec();
    sorted.sort();
    let digest = Sha256::digest(sorted.join("\n").as_bytes());
    format!("{digest:x}")
}

/// First 12 characters of a version for log lines.
pub fn short_version(version: &str) -> &str {
    match version.char_indices().nth(12) {
        Some((end, _)) => &version[..end],
        None => version,
    }
}
