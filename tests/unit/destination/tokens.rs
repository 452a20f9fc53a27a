use super::*;

#[test]
fn missing_store_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::open(dir.path().join("tokens.json"));
    assert!(store.all().unwrap().is_empty());
    assert_eq!(store.get("mapillary").unwrap(), None);
}

#[test]
fn set_get_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::open(dir.path().join("tokens.json"));
    store.set("mapillary", "t0").unwrap();
    store.set("mapillary", "t1").unwrap();
    store.set("other", "x").unwrap();
    assert_eq!(store.get("mapillary").unwrap().as_deref(), Some("t1"));
    assert_eq!(store.all().unwrap().len(), 2);

    store.set("other", "").unwrap();
    assert_eq!(store.get("other").unwrap(), None);

    // survives reopen
    let reopened = TokenStore::open(store.path());
    assert_eq!(reopened.get("mapillary").unwrap().as_deref(), Some("t1"));
}

#[test]
fn corrupt_store_is_manifest_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = TokenStore::open(&path).all().unwrap_err();
    assert_eq!(err.kind(), "manifest_io");
}
