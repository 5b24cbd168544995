//! Tamper and version checks against on-disk documents

use posture_model::SCHEMA_VERSION;
use posture_store::{SnapshotStore, StoreError};
use posture_test_utils::{period, snapshot};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn stored(dir: &TempDir) -> (SnapshotStore, Value) {
    let store = SnapshotStore::new(dir.path());
    store
        .put(&snapshot("2025-11", &["ann@corp.io"], &["S-100"]))
        .unwrap();
    let raw = std::fs::read(store.path_for(period("2025-11"))).unwrap();
    (store, serde_json::from_slice(&raw).unwrap())
}

fn overwrite(store: &SnapshotStore, document: &Value) {
    std::fs::write(
        store.path_for(period("2025-11")),
        serde_json::to_vec(document).unwrap(),
    )
    .unwrap();
}

#[test]
fn document_layout() {
    let dir = TempDir::new().unwrap();
    let (_, document) = stored(&dir);

    assert_eq!(document["schema_version"], SCHEMA_VERSION);
    assert_eq!(document["fingerprint"].as_str().map(str::len), Some(64));
    assert_eq!(document["snapshot"]["period"], "2025-11");
}

#[test]
fn edited_snapshot_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let (store, mut document) = stored(&dir);
    document["snapshot"]["users"] = serde_json::json!({});
    overwrite(&store, &document);

    assert!(matches!(
        store.get(period("2025-11")),
        Err(StoreError::Corrupt { .. })
    ));
}

#[test]
fn other_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (store, mut document) = stored(&dir);
    document["schema_version"] = (SCHEMA_VERSION + 1).into();
    overwrite(&store, &document);

    match store.get(period("2025-11")) {
        Err(StoreError::SchemaVersion(err)) => {
            assert_eq!(err.found, SCHEMA_VERSION + 1);
            assert_eq!(err.expected, SCHEMA_VERSION);
        }
        other => panic!("expected version mismatch, got {other:?}"),
    }
}

#[test]
fn garbage_is_an_encoding_error() {
    let dir = TempDir::new().unwrap();
    let (store, _) = stored(&dir);
    std::fs::write(store.path_for(period("2025-11")), b"not json").unwrap();

    assert!(matches!(
        store.get(period("2025-11")),
        Err(StoreError::Encoding { .. })
    ));
}
