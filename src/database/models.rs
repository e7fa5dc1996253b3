/*!
 * Database record types.
 */

use serde::{Deserialize, Serialize};

/// Row of the durable translation cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Fingerprint or namespaced key
    pub key: String,
    /// Cached value
    pub value: String,
    /// Absolute expiry in unix seconds
    pub expires_at: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Number of reads served
    pub hit_count: i64,
}

impl CacheRecord {
    /// Create a record that expires `ttl_secs` from now
    pub fn new(key: String, value: String, ttl_secs: u64) -> Self {
        let now = chrono::Utc::now();
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);

        Self {
            key,
            value,
            expires_at: now.timestamp().saturating_add(ttl),
            created_at: now.to_rfc3339(),
            hit_count: 0,
        }
    }

    /// Whether the record is past its expiry at `now` (unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Cache table statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of rows
    pub total_entries: i64,
    /// Rows not yet expired
    pub live_entries: i64,
    /// Total hits across all rows
    pub total_hits: i64,
}
