/*!
 * Tests for translation cache functionality
 */

use std::sync::Arc;
use std::time::Duration;

use page_translator::database::Repository;
use page_translator::translation::{CacheStore, MemoryStore, SqliteStore, TieredCache, fingerprint};

const TTL: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_memoryStore_set_shouldStoreTranslation() {
    let cache = MemoryStore::new();
    cache.set("hello", "ciao", TTL).await.unwrap();

    assert_eq!(cache.get("hello").await.unwrap().as_deref(), Some("ciao"));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_memoryStore_get_withMissingKey_shouldReturnNone() {
    let cache = MemoryStore::new();
    assert!(cache.get("nonexistent").await.unwrap().is_none());
}

#[tokio::test]
async fn test_memoryStore_clear_shouldResetEntriesAndCounters() {
    let cache = MemoryStore::new();
    cache.set("a", "1", TTL).await.unwrap();
    cache.get("a").await.unwrap();

    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 0, 0.0));
}

#[tokio::test]
async fn test_sqliteStore_withExpiredRow_shouldMissAndPurge() {
    let store = SqliteStore::new(Repository::new_in_memory().unwrap());
    store.set("old", "value", Duration::from_secs(0)).await.unwrap();
    store.set("fresh", "value", TTL).await.unwrap();

    assert!(store.get("old").await.unwrap().is_none());
    assert_eq!(store.purge_expired().await.unwrap(), 1);
    assert_eq!(store.get("fresh").await.unwrap().as_deref(), Some("value"));
}

#[tokio::test]
async fn test_sqliteStore_set_withExistingKey_shouldOverwrite() {
    let store = SqliteStore::new(Repository::new_in_memory().unwrap());
    store.set("k", "first", TTL).await.unwrap();
    store.set("k", "second", TTL).await.unwrap();

    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_tieredCache_afterMemoryLoss_shouldServeFromDatabase() {
    let repository = Repository::new_in_memory().unwrap();
    let memory = MemoryStore::new();
    let cache = TieredCache::new(
        Arc::new(memory.clone()),
        Arc::new(SqliteStore::new(repository.clone())),
        TTL,
    );
    let key = fingerprint("Hello", "en", "it", "google");

    cache.set(&key, "Ciao", TTL).await.unwrap();
    memory.clear();

    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("Ciao"));
    assert_eq!(memory.len(), 1);
    assert_eq!(repository.get_cache_stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_tieredCache_withShortDurableTtl_shouldExpireFromMemoryToo() {
    let memory = MemoryStore::new();
    let durable = SqliteStore::new(Repository::new_in_memory().unwrap());
    durable.set("protection_map_it", "{}", Duration::from_secs(2)).await.unwrap();
    let cache = TieredCache::new(Arc::new(memory.clone()), Arc::new(durable.clone()), Duration::from_secs(86_400));

    assert!(cache.get("protection_map_it").await.unwrap().is_some());
    assert_eq!(memory.len(), 1);

    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(durable.get("protection_map_it").await.unwrap().is_none());
    assert!(cache.get("protection_map_it").await.unwrap().is_none());
}

#[test]
fn test_fingerprint_shouldBeHexSha256() {
    let key = fingerprint("Hello", "en", "it", "google");
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}
