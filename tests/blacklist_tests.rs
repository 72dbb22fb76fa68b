use gantry::blacklist::{BlacklistStore, JsonFileStore, MemoryStore, TokenBlacklist};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_json_store_creates_empty_document_on_first_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blacklist.json");
    let store = JsonFileStore::new(&path);
    let doc = store.load().unwrap();
    assert!(doc.entries.is_empty());
    assert!(path.is_file());
}

#[test]
fn test_json_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blacklist.json");

    {
        let bl = TokenBlacklist::open(
            Arc::new(JsonFileStore::new(&path)),
            Duration::from_secs(1800),
        )
        .unwrap();
        bl.add("revoked.token").unwrap();
    }

    let reloaded = TokenBlacklist::open(
        Arc::new(JsonFileStore::new(&path)),
        Duration::from_secs(1800),
    )
    .unwrap();
    assert!(reloaded.contains("revoked.token"));
    assert!(!reloaded.contains("other.token"));
}

#[test]
fn test_membership_is_immediate_after_add() {
    let bl = TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::from_secs(1800)).unwrap();
    assert!(!bl.contains("tok"));
    bl.add("tok").unwrap();
    assert!(bl.contains("tok"));
}

#[test]
fn test_replace_newer_than_keeps_only_young_entries() {
    let store = MemoryStore::new();
    store.append(100, "old").unwrap();
    store.append(200, "young").unwrap();
    let doc = store.replace_newer_than(150).unwrap();
    assert_eq!(doc.entries.len(), 1);
    assert_eq!(doc.entries.get(&200).map(String::as_str), Some("young"));
    // last_purge is restamped
    assert!(doc.last_purge_ns > 150);
}

#[test]
fn test_purge_worker_clears_expired_tokens() {
    // zero window: the first purge tick removes everything
    let bl = TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::ZERO).unwrap();
    bl.add("tok").unwrap();
    let handle = bl.spawn_purge_worker().unwrap();
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while bl.contains("tok") && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.stop();
    assert!(!bl.contains("tok"));
}

#[test]
fn test_purge_worker_stops_promptly_with_long_window() {
    let bl = TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::from_secs(3600)).unwrap();
    let handle = bl.spawn_purge_worker().unwrap();
    let started = std::time::Instant::now();
    handle.stop();
    // stop interrupts the sleep instead of waiting out the window
    assert!(started.elapsed() < Duration::from_secs(5));
}
