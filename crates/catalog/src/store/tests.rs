use super::*;
use crate::catalog::{CatalogBuilder, CatalogSeed};
use crate::source::PlayerListing;
use dugout_core::PlayerRole;

fn sample_catalog() -> EntityCatalog {
    let seed = CatalogSeed::bundled().expect("bundled seed parses");
    CatalogBuilder::new(&seed)
        .with_players(vec![PlayerListing {
            player_id: "52701".into(),
            name: "문동주".into(),
            team: Some("HH".into()),
            role: Some(PlayerRole::Pitcher),
            aliases: vec![],
        }])
        .build()
}

#[test]
fn new_creates_directory_structure() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(tmp.path().join("catalog")).unwrap();
    assert!(store.base_dir().join("snapshots").is_dir());
}

#[test]
fn load_current_missing_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(tmp.path()).unwrap();
    assert!(store.load_current().unwrap().is_none());
    assert!(store.load_manifest().unwrap().is_none());
}

#[test]
fn persist_then_load_keeps_entries_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(tmp.path()).unwrap();
    let catalog = sample_catalog();

    let manifest = store.persist(&catalog).unwrap();
    assert_eq!(manifest.entries_hash, catalog.version);
    assert_eq!(manifest.entry_count, catalog.len());

    let loaded = store.load_current().unwrap().expect("current.json written");
    assert_eq!(loaded.version, catalog.version);
    let ids: Vec<&str> = loaded.entries.iter().map(|e| e.canonical_id.as_str()).collect();
    let expected: Vec<&str> = catalog.entries.iter().map(|e| e.canonical_id.as_str()).collect();
    assert_eq!(ids, expected);
    assert!(store.is_current(&catalog).unwrap());
    assert_eq!(store.list_snapshots().unwrap().len(), 1);
}

#[test]
fn prune_keeps_newest_snapshots() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(tmp.path()).unwrap();
    for name in ["2025-01-01T00-00-00.000.json", "2025-01-02T00-00-00.000.json", "2025-01-03T00-00-00.000.json"] {
        std::fs::write(tmp.path().join("snapshots").join(name), "{}").unwrap();
    }
    assert_eq!(store.prune_snapshots(1).unwrap(), 2);
    assert_eq!(store.list_snapshots().unwrap(), vec!["2025-01-03T00-00-00.000.json"]);
}
