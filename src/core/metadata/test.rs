use super::*;

use std::time::{Duration, UNIX_EPOCH};

use tempfile::tempdir;

fn ts(secs: u64, nanos: u32) -> Timestamp {
    Timestamp::from(UNIX_EPOCH + Duration::new(secs, nanos))
}

#[test]
fn test_load_creates_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");

    let store = MetadataStore::load(&path).unwrap();

    assert!(store.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn test_set_persists_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");

    let mut store = MetadataStore::load(&path).unwrap();
    store.set("/data/a.txt", ts(1_600_000_000, 5)).unwrap();

    let reloaded = MetadataStore::load(&path).unwrap();
    assert_eq!(reloaded.get("/data/a.txt"), Some(ts(1_600_000_000, 5)));
    assert_eq!(reloaded.get("/data/b.txt"), None);
}

#[test]
fn test_remove_persists_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");

    let mut store = MetadataStore::load(&path).unwrap();
    store.set("a", ts(1, 0)).unwrap();
    store.set("b", ts(2, 0)).unwrap();

    assert!(store.remove("a").unwrap());
    assert!(!store.remove("a").unwrap());

    let reloaded = MetadataStore::load(&path).unwrap();
    assert_eq!(reloaded.keys().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn test_keys_are_sorted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");

    let mut store = MetadataStore::load(&path).unwrap();
    for k in &["c", "a", "b"] {
        store.set(k, ts(1, 0)).unwrap();
    }

    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_load_reads_iso8601_with_offset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(
        &path,
        r#"{"/home/me/a.txt":"2023-04-05T10:11:12.123456789+09:00"}"#,
    )
    .unwrap();

    let store = MetadataStore::load(&path).unwrap();

    let expected: Timestamp = serde_json::from_str(r#""2023-04-05T01:11:12.123456789Z""#).unwrap();
    assert_eq!(store.get("/home/me/a.txt"), Some(expected));
}

#[test]
fn test_load_fails_with_corrupted_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(&path, r#"{"/a": "yesterday"}"#).unwrap();

    match MetadataStore::load(&path) {
        Err(Error::Parse { path: p, .. }) => assert_eq!(p, path),
        other => panic!("{:?}", other),
    }
}
