/*!
 * Translation caching functionality.
 *
 * Caching is expressed through the `CacheStore` trait so the pipeline can be
 * given any key-value TTL store:
 * - `MemoryStore`: process-local map with per-entry expiry
 * - `SqliteStore`: durable store backed by the repository
 * - `TieredCache`: memory first, durable on miss, writes go to both
 *
 * Keys are fingerprints of the content and the translation route, see
 * [`fingerprint`].
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::database::{CacheRecord, Repository};
use crate::errors::TranslationError;

/// Separator between fingerprint components, cannot appear in language codes
const FINGERPRINT_SEPARATOR: char = '\u{1f}';

/// Stable cache key for a translation of `content` from `source` to `target`
/// through `provider`.
///
/// Surrounding whitespace of the content does not change the key; every
/// other difference does.
pub fn fingerprint(content: &str, source: &str, target: &str, provider: &str) -> String {
    hash_parts(&[content.trim(), source, target, provider])
}

/// Hex SHA-256 of `parts` joined by the fingerprint separator
pub(crate) fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            let mut buf = [0u8; 4];
            hasher.update(FINGERPRINT_SEPARATOR.encode_utf8(&mut buf).as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Key-value store with per-entry time-to-live
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Live value for `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        Ok(self.get_with_ttl(key).await?.map(|(value, _)| value))
    }

    /// Live value for `key` with its remaining lifetime
    async fn get_with_ttl(&self, key: &str) -> Result<Option<(String, Duration)>, TranslationError>;

    /// Store `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError>;

    /// Remove `key`, returning whether it was present
    async fn remove(&self, key: &str) -> Result<bool, TranslationError>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process cache tier
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Hits, misses and hit rate since creation or the last clear
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Memory cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn lookup(&self, key: &str) -> Option<(String, Duration)> {
        let now = Instant::now();
        let found = self
            .entries
            .read()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| (entry.value.clone(), entry.expires_at - now));

        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Memory cache hit for {}", truncate_text(key, 16));
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Memory cache miss for {}", truncate_text(key, 16));
            }
        }

        found
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_with_ttl(&self, key: &str) -> Result<Option<(String, Duration)>, TranslationError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError> {
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, TranslationError> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

/// Durable cache tier stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteStore {
    repository: Repository,
}

impl SqliteStore {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Delete expired rows
    pub async fn purge_expired(&self) -> Result<i64, TranslationError> {
        self.repository
            .purge_expired_cache()
            .await
            .map_err(|e| TranslationError::Cache(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get_with_ttl(&self, key: &str) -> Result<Option<(String, Duration)>, TranslationError> {
        let entry = self
            .repository
            .get_cache_entry_with_expiry(key)
            .await
            .map_err(|e| TranslationError::Cache(e.to_string()))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(entry.map(|(value, expires_at)| {
            let remaining_ms = u64::try_from(expires_at * 1000 - now_ms).unwrap_or(0);
            (value, Duration::from_millis(remaining_ms))
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError> {
        let record = CacheRecord::new(key.to_string(), value.to_string(), ttl.as_secs());
        self.repository
            .set_cache_entry(&record)
            .await
            .map_err(|e| TranslationError::Cache(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<bool, TranslationError> {
        self.repository
            .delete_cache_entry(key)
            .await
            .map_err(|e| TranslationError::Cache(e.to_string()))
    }
}

/// Two-tier cache: a fast tier in front of a durable one
pub struct TieredCache {
    fast: Arc<dyn CacheStore>,
    durable: Arc<dyn CacheStore>,
    /// Upper bound on the lifetime of values promoted from the durable tier
    promote_ttl: Duration,
}

impl TieredCache {
    pub fn new(fast: Arc<dyn CacheStore>, durable: Arc<dyn CacheStore>, promote_ttl: Duration) -> Self {
        Self {
            fast,
            durable,
            promote_ttl,
        }
    }
}

#[async_trait]
impl CacheStore for TieredCache {
    async fn get_with_ttl(&self, key: &str) -> Result<Option<(String, Duration)>, TranslationError> {
        if let Some(entry) = self.fast.get_with_ttl(key).await? {
            return Ok(Some(entry));
        }

        let entry = self.durable.get_with_ttl(key).await?;
        if let Some((value, remaining)) = &entry {
            // a promoted value never outlives its durable row
            self.fast.set(key, value, (*remaining).min(self.promote_ttl)).await?;
        }

        Ok(entry)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError> {
        self.fast.set(key, value, ttl).await?;
        self.durable.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, TranslationError> {
        let in_fast = self.fast.remove(key).await?;
        let in_durable = self.durable.remove(key).await?;
        Ok(in_fast || in_durable)
    }
}

/// Truncate text to a maximum length with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
