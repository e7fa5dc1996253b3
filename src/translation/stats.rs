/*!
 * Translation performance and per-model statistics.
 *
 * Aggregates are updated under a single lock each so concurrent requests
 * never lose counter updates. When a repository is attached the aggregates
 * are loaded from and persisted to SQLite.
 */

use anyhow::Result;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::Repository;

/// Timing aggregate over every provider-backed translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_translations: u64,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
    pub fastest_time_ms: f64,
    pub slowest_time_ms: f64,
}

impl PerformanceStats {
    /// Fold one translation duration into the aggregate
    pub fn record(&mut self, elapsed_ms: f64) {
        if self.total_translations == 0 || elapsed_ms < self.fastest_time_ms {
            self.fastest_time_ms = elapsed_ms;
        }
        if elapsed_ms > self.slowest_time_ms {
            self.slowest_time_ms = elapsed_ms;
        }

        self.total_translations += 1;
        self.total_time_ms += elapsed_ms;
        self.average_time_ms = self.total_time_ms / self.total_translations as f64;
    }
}

/// Usage and reliability of one provider model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub model_id: String,
    pub usage_count: u64,
    pub total_tests: u64,
    pub successful_tests: u64,
    pub avg_response_ms: f64,
    /// Percentage of successful calls (0-100)
    pub success_rate: f64,
    pub last_used: Option<String>,
}

impl ModelStats {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            usage_count: 0,
            total_tests: 0,
            successful_tests: 0,
            avg_response_ms: 0.0,
            success_rate: 0.0,
            last_used: None,
        }
    }

    /// Record one call: the response time feeds a running mean
    pub fn record(&mut self, elapsed_ms: f64, success: bool) {
        self.usage_count += 1;
        self.total_tests += 1;
        if success {
            self.successful_tests += 1;
        }

        let n = self.total_tests as f64;
        self.avg_response_ms = (self.avg_response_ms * (n - 1.0) + elapsed_ms) / n;
        self.success_rate = self.successful_tests as f64 / n * 100.0;
        self.last_used = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// Serialized writer for the statistics aggregates
#[derive(Debug, Default)]
pub struct StatsRecorder {
    performance: Mutex<PerformanceStats>,
    models: Mutex<HashMap<String, ModelStats>>,
    repository: Option<Repository>,
}

impl StatsRecorder {
    /// In-memory recorder, nothing is persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder backed by the repository, seeded with the stored aggregates
    pub async fn with_repository(repository: Repository) -> Result<Self> {
        let performance = repository.load_performance_stats().await?.unwrap_or_default();
        let models = repository
            .list_model_stats()
            .await?
            .into_iter()
            .map(|stats| (stats.model_id.clone(), stats))
            .collect();

        Ok(Self {
            performance: Mutex::new(performance),
            models: Mutex::new(models),
            repository: Some(repository),
        })
    }

    pub fn record_translation(&self, elapsed_ms: f64) {
        self.performance.lock().record(elapsed_ms);
    }

    pub fn record_model_call(&self, model_id: &str, elapsed_ms: f64, success: bool) {
        if model_id.is_empty() {
            return;
        }

        let mut models = self.models.lock();
        models
            .entry(model_id.to_string())
            .or_insert_with(|| ModelStats::new(model_id))
            .record(elapsed_ms, success);
    }

    pub fn performance(&self) -> PerformanceStats {
        self.performance.lock().clone()
    }

    /// Snapshot of every model, most used first
    pub fn model_stats(&self) -> Vec<ModelStats> {
        let mut stats: Vec<ModelStats> = self.models.lock().values().cloned().collect();
        stats.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.model_id.cmp(&b.model_id))
        });
        stats
    }

    /// Write the current aggregates through the repository, if any
    pub async fn persist(&self) -> Result<()> {
        let Some(repository) = &self.repository else {
            return Ok(());
        };

        repository.save_performance_stats(&self.performance()).await?;
        for stats in self.model_stats() {
            repository.save_model_stats(&stats).await?;
        }

        debug!("Persisted translation statistics");
        Ok(())
    }
}
