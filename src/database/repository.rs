/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for the durable cache and the
 * statistics tables, abstracting away the SQL details.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::Path;

use super::connection::DatabaseConnection;
use super::models::{CacheRecord, CacheStats};
use crate::translation::stats::{ModelStats, PerformanceStats};

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository backed by the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = DatabaseConnection::new(path)?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    // =========================================================================
    // Cache Operations
    // =========================================================================

    /// Get a live cache value; expired rows read as absent
    pub async fn get_cache_entry(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_cache_entry_with_expiry(key).await?.map(|(value, _)| value))
    }

    /// Get a live cache value together with its `expires_at` unix timestamp
    pub async fn get_cache_entry_with_expiry(&self, key: &str) -> Result<Option<(String, i64)>> {
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp();

        self.db
            .execute_async(move |conn| {
                let entry: Option<(String, i64)> = conn
                    .query_row(
                        "SELECT cache_value, expires_at FROM translation_cache WHERE cache_key = ?1 AND expires_at > ?2",
                        params![key, now],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                if entry.is_some() {
                    conn.execute(
                        "UPDATE translation_cache SET hit_count = hit_count + 1 WHERE cache_key = ?1",
                        [&key],
                    )?;
                }

                Ok(entry)
            })
            .await
    }

    /// Insert or replace a cache value
    pub async fn set_cache_entry(&self, record: &CacheRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_cache (cache_key, cache_value, expires_at, created_at, hit_count)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(cache_key) DO UPDATE SET
                        cache_value = excluded.cache_value,
                        expires_at = excluded.expires_at,
                        created_at = excluded.created_at
                    "#,
                    params![
                        record.key,
                        record.value,
                        record.expires_at,
                        record.created_at,
                        record.hit_count,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Remove a single cache row
    pub async fn delete_cache_entry(&self, key: &str) -> Result<bool> {
        let key = key.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translation_cache WHERE cache_key = ?1", [&key])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Delete every expired row, returning how many were removed
    pub async fn purge_expired_cache(&self) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translation_cache WHERE expires_at <= ?1", [now])?;
                if deleted > 0 {
                    debug!("Purged {} expired cache entries", deleted);
                }
                Ok(deleted as i64)
            })
            .await
    }

    /// Get cache statistics
    pub async fn get_cache_stats(&self) -> Result<CacheStats> {
        let now = chrono::Utc::now().timestamp();

        self.db
            .execute_async(move |conn| {
                let total_entries: i64 = conn
                    .query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))
                    .unwrap_or(0);

                let live_entries: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM translation_cache WHERE expires_at > ?1",
                        [now],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                let total_hits: i64 = conn
                    .query_row(
                        "SELECT COALESCE(SUM(hit_count), 0) FROM translation_cache",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                Ok(CacheStats {
                    total_entries,
                    live_entries,
                    total_hits,
                })
            })
            .await
    }

    /// Clear the translation cache
    pub async fn clear_cache(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM translation_cache", [])?;
                Ok(deleted as i64)
            })
            .await
    }

    // =========================================================================
    // Statistics Operations
    // =========================================================================

    /// Load the performance aggregate, if one was stored
    pub async fn load_performance_stats(&self) -> Result<Option<PerformanceStats>> {
        self.db
            .execute_async(|conn| {
                let stats = conn
                    .query_row(
                        r#"
                        SELECT total_translations, total_time_ms, average_time_ms,
                               fastest_time_ms, slowest_time_ms
                        FROM performance_stats WHERE id = 1
                        "#,
                        [],
                        |row| {
                            Ok(PerformanceStats {
                                total_translations: row.get::<_, i64>(0)?.max(0) as u64,
                                total_time_ms: row.get(1)?,
                                average_time_ms: row.get(2)?,
                                fastest_time_ms: row.get(3)?,
                                slowest_time_ms: row.get(4)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(stats)
            })
            .await
    }

    /// Store the performance aggregate
    pub async fn save_performance_stats(&self, stats: &PerformanceStats) -> Result<()> {
        let stats = stats.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO performance_stats (
                        id, total_translations, total_time_ms, average_time_ms,
                        fastest_time_ms, slowest_time_ms, updated_at
                    ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        stats.total_translations as i64,
                        stats.total_time_ms,
                        stats.average_time_ms,
                        stats.fastest_time_ms,
                        stats.slowest_time_ms,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Store statistics for one model, keyed by the hash of its id
    pub async fn save_model_stats(&self, stats: &ModelStats) -> Result<()> {
        let stats = stats.clone();
        let model_hash = Self::hash_text(&stats.model_id);

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO model_stats (
                        model_hash, model_id, usage_count, total_tests, successful_tests,
                        avg_response_ms, success_rate, last_used
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        model_hash,
                        stats.model_id,
                        stats.usage_count as i64,
                        stats.total_tests as i64,
                        stats.successful_tests as i64,
                        stats.avg_response_ms,
                        stats.success_rate,
                        stats.last_used,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Load statistics for one model
    pub async fn get_model_stats(&self, model_id: &str) -> Result<Option<ModelStats>> {
        let model_hash = Self::hash_text(model_id);

        self.db
            .execute_async(move |conn| {
                let stats = conn
                    .query_row(
                        r#"
                        SELECT model_id, usage_count, total_tests, successful_tests,
                               avg_response_ms, success_rate, last_used
                        FROM model_stats WHERE model_hash = ?1
                        "#,
                        [&model_hash],
                        parse_model_stats_row,
                    )
                    .optional()?;
                Ok(stats)
            })
            .await
    }

    /// List statistics for every tracked model
    pub async fn list_model_stats(&self) -> Result<Vec<ModelStats>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT model_id, usage_count, total_tests, successful_tests,
                           avg_response_ms, success_rate, last_used
                    FROM model_stats
                    ORDER BY usage_count DESC, model_id
                    "#,
                )?;

                let stats: Vec<ModelStats> = stmt
                    .query_map([], parse_model_stats_row)?
                    .filter_map(|r| r.ok())
                    .collect();

                Ok(stats)
            })
            .await
    }
}

fn parse_model_stats_row(row: &rusqlite::Row) -> rusqlite::Result<ModelStats> {
    Ok(ModelStats {
        model_id: row.get(0)?,
        usage_count: row.get::<_, i64>(1)?.max(0) as u64,
        total_tests: row.get::<_, i64>(2)?.max(0) as u64,
        successful_tests: row.get::<_, i64>(3)?.max(0) as u64,
        avg_response_ms: row.get(4)?,
        success_rate: row.get(5)?,
        last_used: row.get(6)?,
    })
}
