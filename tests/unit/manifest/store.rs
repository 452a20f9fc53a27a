use std::path::Path;

use chrono::{TimeZone, Utc};

use super::*;
use crate::sequence::model::{Destination, SequenceMetadata};

fn store() -> (tempfile::TempDir, ManifestStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ManifestStore::open(WorkspaceLayout::new(dir.path())).unwrap();
    (dir, store)
}

fn committed(store: &ManifestStore, id: &str, name: &str, kind: DestinationKind) -> SequenceResult {
    let seq_dir = store.layout().sequence_dir(name);
    std::fs::create_dir_all(&seq_dir).unwrap();
    let r = SequenceResult {
        sequence: SequenceMetadata {
            id: id.to_string(),
            name: name.to_string(),
            camera: String::new(),
            created: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            uploader_sequence_name: seq_dir,
            destination: Destination {
                kind,
                external_sequence_id: None,
            },
        },
        photo: Default::default(),
    };
    store.put(&r).unwrap();
    r
}

#[test]
fn missing_manifest_reads_empty() {
    let (_dir, store) = store();
    assert!(store.entries().unwrap().is_empty());
    assert!(store.list(None).unwrap().is_empty());
}

#[test]
fn corrupt_manifest_is_manifest_io() {
    let (_dir, store) = store();
    std::fs::write(store.layout().manifest_path(), "{ not json").unwrap();
    assert_eq!(store.entries().unwrap_err().kind(), "manifest_io");
}

#[test]
fn put_is_an_upsert() {
    let (_dir, store) = store();
    let mut r = committed(&store, "a", "ride", DestinationKind::Local);
    r.sequence.camera = "gopro".to_string();
    store.put(&r).unwrap();
    let all = store.entries().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["a"].sequence.camera, "gopro");
    assert_eq!(store.get("a").unwrap().unwrap(), r);
    assert_eq!(store.get("zzz").unwrap(), None);
}

#[test]
fn put_refuses_a_second_owner_for_one_asset_directory() {
    let (_dir, store) = store();
    committed(&store, "a", "ride", DestinationKind::Local);
    let mut rival = store.get("a").unwrap().unwrap();
    rival.sequence.id = "b".to_string();

    let err = store.put(&rival).unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(err.to_string().contains("already belongs to sequence 'a'"));
    let all = store.entries().unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn remove_deletes_assets_and_sidecar_and_is_idempotent() {
    let (_dir, store) = store();
    let r = committed(&store, "a", "ride", DestinationKind::Local);
    let sidecar = store.layout().sidecar_path("ride");
    std::fs::write(&sidecar, "<gpx/>").unwrap();

    assert!(store.remove("a").unwrap());
    assert!(!r.sequence.uploader_sequence_name.exists());
    assert!(!sidecar.exists());
    assert!(store.list(None).unwrap().is_empty());

    assert!(!store.remove("a").unwrap());
}

#[test]
fn reset_keeps_committed_directories() {
    let (_dir, store) = store();
    let r = committed(&store, "a", "ride", DestinationKind::Local);
    std::fs::write(store.layout().scratch_dir().join("preview.png"), "x").unwrap();

    store.reset(&SequenceConfig::named("ride")).unwrap();
    assert!(r.sequence.uploader_sequence_name.is_dir());
    assert!(store.layout().scratch_dir().is_dir());
    assert_eq!(std::fs::read_dir(store.layout().scratch_dir()).unwrap().count(), 0);
}

#[test]
fn reset_discards_uncommitted_work_twice_without_error() {
    let (_dir, store) = store();
    let dir = store.layout().originals_dir("draft");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.png"), "x").unwrap();

    let config = SequenceConfig::named("draft");
    store.reset(&config).unwrap();
    assert!(!store.layout().sequence_dir("draft").exists());
    store.reset(&config).unwrap();
    assert!(store.entries().unwrap().is_empty());
}

#[test]
fn reset_rejects_unsafe_names() {
    let (_dir, store) = store();
    let err = store.reset(&SequenceConfig::named("../escape")).unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(Path::new(store.layout().root()).is_dir());
}

#[test]
fn link_destination_is_last_write_wins() {
    let (_dir, store) = store();
    committed(&store, "a", "ride", DestinationKind::Mapillary);
    store.link_destination("a", "first").unwrap();
    let r = store.link_destination("a", "second").unwrap();
    assert_eq!(r.sequence.destination.external_sequence_id.as_deref(), Some("second"));
    let listed = store.list(None).unwrap();
    assert_eq!(
        listed[0].destination,
        DestinationStatus::Pending {
            key: "second".to_string()
        }
    );
}

#[test]
fn link_destination_rejects_local_and_unknown() {
    let (_dir, store) = store();
    committed(&store, "a", "ride", DestinationKind::Local);
    assert_eq!(store.link_destination("a", "k").unwrap_err().kind(), "validation");
    assert_eq!(store.link_destination("nope", "k").unwrap_err().kind(), "validation");
    assert_eq!(store.link_destination("a", " ").unwrap_err().kind(), "validation");
}
