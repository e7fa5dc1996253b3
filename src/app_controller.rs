use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider};
use crate::database::{DatabaseConnection, DatabaseStats, Repository};
use crate::providers::catalog::{ModelCatalog, ModelDescriptor, ModelFilter, UseCase};
use crate::providers::openrouter::OpenRouter;
use crate::providers::{CallOptions, ProviderClient, create_client};
use crate::storefront::StorefrontTranslator;
use crate::translation::{
    BatchResponse, CacheStore, CustomDictionary, DictionaryResolver, DictionaryRulesStage, EntryKind, LiveResponse,
    MemoryStore, ModelStats, PerformanceStats, PipelineOptions, Priority, Resolution, SqliteStore, StageRegistry,
    StatsRecorder, TieredCache, TranslationPipeline,
};
use crate::translation::patterns::PatternCache;

// @module: Application controller wiring config, storage and the translation pipeline

const DICTIONARY_FILENAME: &str = "dictionary.json";
const CATALOG_FILENAME: &str = "models.json";

/// Text used by the model connectivity test
const MODEL_TEST_TEXT: &str = "Hello world";

/// Outcome of a model connectivity test
#[derive(Debug, Clone, Serialize)]
pub struct ModelTestReport {
    pub model: String,
    pub success: bool,
    pub translation: Option<String>,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a provider connectivity check
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub provider: TranslationProvider,
    pub connected: bool,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// The failure is fixed in the configuration rather than on the remote side
    pub config_error: bool,
}

/// Everything reported by the `stats` command
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub performance: PerformanceStats,
    pub models: Vec<ModelStats>,
    pub database: DatabaseStats,
    pub memory_cache_entries: usize,
    pub memory_hit_rate: f64,
}

/// Rows removed by a purge
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurgeReport {
    pub memory: usize,
    pub database: i64,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    repository: Repository,
    memory: MemoryStore,
    durable: SqliteStore,
    cache: Arc<dyn CacheStore>,
    pipeline: Arc<TranslationPipeline>,
    catalog: RwLock<ModelCatalog>,
    dictionary_path: PathBuf,
    catalog_path: PathBuf,
}

impl Controller {
    /// Controller backed by an in-memory database and files under `data_dir`
    pub async fn new_for_test(provider: Arc<dyn ProviderClient>, data_dir: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.translation.provider = provider.kind();
        Self::assemble(
            config,
            Repository::new_in_memory()?,
            provider,
            data_dir.join(DICTIONARY_FILENAME),
            data_dir.join(CATALOG_FILENAME),
        )
        .await
    }

    // @method: Create a new controller with the given configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        let repository = match &config.storage.database_path {
            Some(path) => Repository::open(path)?,
            None => Repository::new_default()?,
        };

        let data_dir = default_data_dir()?;
        let dictionary_path = config
            .storage
            .dictionary_path
            .clone()
            .unwrap_or_else(|| data_dir.join(DICTIONARY_FILENAME));
        let provider = create_client(&config.translation);

        Self::assemble(config, repository, provider, dictionary_path, data_dir.join(CATALOG_FILENAME)).await
    }

    async fn assemble(
        config: Config,
        repository: Repository,
        provider: Arc<dyn ProviderClient>,
        dictionary_path: PathBuf,
        catalog_path: PathBuf,
    ) -> Result<Self> {
        let options = PipelineOptions::from_config(&config);

        let memory = MemoryStore::new();
        let durable = SqliteStore::new(repository.clone());
        let cache: Arc<dyn CacheStore> = Arc::new(TieredCache::new(
            Arc::new(memory.clone()),
            Arc::new(durable.clone()),
            options.cache_ttl,
        ));

        let dictionary = CustomDictionary::load(&dictionary_path)?;
        let resolver = Arc::new(DictionaryResolver::new(dictionary, Arc::new(PatternCache::new())));

        let mut stages = StageRegistry::new();
        if config.translation.apply_dictionary_in_text {
            stages.register_before(Arc::new(DictionaryRulesStage::new(Arc::clone(&resolver))));
        }

        let stats = Arc::new(StatsRecorder::with_repository(repository.clone()).await?);
        let catalog = ModelCatalog::load_or_builtin(&catalog_path).unwrap_or_else(|e| {
            warn!("Ignoring unreadable model catalog: {:#}", e);
            ModelCatalog::new()
        });
        let fast_model = catalog.fastest_free_model().map(|m| m.id.clone());
        debug!("Fast model for high-priority requests: {:?}", fast_model);

        let pipeline = TranslationPipeline::new(provider, Arc::clone(&cache), resolver)
            .with_options(options)
            .with_stages(stages)
            .with_stats(stats)
            .with_fast_model(fast_model);

        Ok(Self {
            config,
            repository,
            memory,
            durable,
            cache,
            pipeline: Arc::new(pipeline),
            catalog: RwLock::new(catalog),
            dictionary_path,
            catalog_path,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<TranslationPipeline> {
        &self.pipeline
    }

    /// Translate a single text, calling the provider on a miss
    pub async fn translate(
        &self,
        content: &str,
        source_lang: &str,
        target_lang: &str,
        priority: Priority,
    ) -> Result<Resolution> {
        let request = self
            .pipeline
            .request(content, source_lang, target_lang)
            .with_priority(priority);
        let resolution = self.pipeline.translate(&request).await?;
        self.persist_stats().await;
        Ok(resolution)
    }

    /// Live request contract: errors come back inside the response
    pub async fn translate_live(
        &self,
        content: &str,
        source_lang: &str,
        target_lang: &str,
        priority: Priority,
    ) -> LiveResponse {
        let request = self
            .pipeline
            .request(content, source_lang, target_lang)
            .with_priority(priority);
        let response = self.pipeline.translate_live(&request).await;
        self.persist_stats().await;
        response
    }

    pub async fn translate_batch(&self, contents: &[String], source_lang: &str, target_lang: &str) -> BatchResponse {
        let response = self.pipeline.translate_batch(contents, source_lang, target_lang).await;
        self.persist_stats().await;
        response
    }

    /// Warm common phrases for one language, or every enabled target language
    pub async fn preload(&self, target_lang: Option<&str>) -> BTreeMap<String, usize> {
        let targets = match target_lang {
            Some(lang) => vec![lang.to_string()],
            None => self.config.target_languages(),
        };

        let mut warmed = BTreeMap::new();
        for lang in targets {
            let count = self.pipeline.preload_common_phrases(&lang).await;
            info!("Preloaded {} phrases for {}", count, lang);
            warmed.insert(lang, count);
        }

        self.persist_stats().await;
        warmed
    }

    /// Storefront translator sharing this controller's pipeline and cache
    pub fn storefront(&self) -> StorefrontTranslator {
        StorefrontTranslator::new(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.cache),
            self.config.storefront.clone(),
            self.config.enabled_languages.clone(),
        )
    }

    pub fn list_models(&self, filter: &ModelFilter) -> Vec<ModelDescriptor> {
        self.catalog.read().filter(filter).into_iter().cloned().collect()
    }

    pub fn recommended_models(&self, use_case: UseCase) -> Vec<ModelDescriptor> {
        self.catalog.read().recommended(use_case).into_iter().cloned().collect()
    }

    /// Merge the live OpenRouter listing into the catalog and save it
    pub async fn refresh_models(&self) -> Result<usize> {
        let client = self.openrouter_client();
        let api_models = client
            .list_models()
            .await
            .context("Failed to fetch the OpenRouter model listing")?;

        let (snapshot, added) = {
            let mut catalog = self.catalog.write();
            let added = catalog.merge_api_models(&api_models);
            info!("Model listing returned {} models, {} new", api_models.len(), added);
            (catalog.clone(), added)
        };

        snapshot.save(&self.catalog_path)?;
        Ok(added)
    }

    /// Check the active provider's credentials and reachability
    pub async fn check_connection(&self) -> ConnectionReport {
        let provider = self.pipeline.provider();
        let start = Instant::now();
        let result = provider.test_connection().await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(()) => {
                info!("Connected to {}", provider.kind());
                ConnectionReport {
                    provider: provider.kind(),
                    connected: true,
                    elapsed_ms,
                    error: None,
                    code: None,
                    config_error: false,
                }
            }
            Err(e) => {
                warn!("Connection check for {} failed: {}", provider.kind(), e);
                ConnectionReport {
                    provider: provider.kind(),
                    connected: false,
                    elapsed_ms,
                    error: Some(e.to_string()),
                    code: Some(e.code()),
                    config_error: e.is_config_error(),
                }
            }
        }
    }

    /// Translate a short text with `model` and record the call
    pub async fn test_model(&self, model: &str) -> Result<ModelTestReport> {
        let provider = self.pipeline.provider();
        if provider.kind() != TranslationProvider::OpenRouter {
            return Err(anyhow!("Model tests need the OpenRouter provider"));
        }

        let options = CallOptions::default()
            .with_model(model)
            .with_timeout(self.pipeline.options().live_timeout);
        let start = Instant::now();
        let result = provider.translate_one(MODEL_TEST_TEXT, "en", "it", &options).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.pipeline
            .stats()
            .record_model_call(model, elapsed_ms, result.is_ok());
        self.persist_stats().await;

        let report = match result {
            Ok(translation) => ModelTestReport {
                model: model.to_string(),
                success: true,
                translation: Some(translation),
                elapsed_ms,
                error: None,
            },
            Err(e) => ModelTestReport {
                model: model.to_string(),
                success: false,
                translation: None,
                elapsed_ms,
                error: Some(e.to_string()),
            },
        };
        Ok(report)
    }

    pub fn stats(&self) -> Result<StatsReport> {
        let (_, _, hit_rate) = self.memory.stats();
        Ok(StatsReport {
            performance: self.pipeline.stats().performance(),
            models: self.pipeline.stats().model_stats(),
            database: self.repository.connection().stats()?,
            memory_cache_entries: self.memory.len(),
            memory_hit_rate: hit_rate,
        })
    }

    pub fn dictionary(&self) -> CustomDictionary {
        self.pipeline.resolver().snapshot()
    }

    pub fn add_dictionary_entry(&self, lang: &str, kind: EntryKind, key: &str, value: Option<&str>) -> Result<()> {
        self.pipeline
            .resolver()
            .update(|dictionary| dictionary.add_entry(lang, kind, key, value))?;
        self.save_dictionary()
    }

    /// Remove a rule, returning whether it existed
    pub fn remove_dictionary_entry(&self, lang: &str, kind: EntryKind, key: &str) -> Result<bool> {
        let removed = self
            .pipeline
            .resolver()
            .update(|dictionary| dictionary.remove_entry(lang, kind, key));
        if removed {
            self.save_dictionary()?;
        }
        Ok(removed)
    }

    /// Import a dictionary file, merging into or replacing the current one
    pub fn import_dictionary(&self, path: &Path, merge: bool) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary import: {:?}", path))?;
        let imported = CustomDictionary::from_json(&content)
            .with_context(|| format!("Failed to parse dictionary import: {:?}", path))?;

        self.pipeline
            .resolver()
            .update(|dictionary| dictionary.import(imported, merge));
        self.save_dictionary()
    }

    pub fn export_dictionary(&self, lang: Option<&str>) -> Result<String> {
        self.pipeline.resolver().snapshot().export(lang)
    }

    /// Drop expired entries from both cache tiers
    pub async fn purge_expired(&self) -> Result<PurgeReport> {
        let memory = self.memory.purge_expired();
        let database = self.durable.purge_expired().await?;
        info!("Purged {} memory and {} database cache entries", memory, database);
        Ok(PurgeReport { memory, database })
    }

    /// Drop every cached translation
    pub async fn clear_cache(&self) -> Result<i64> {
        self.memory.clear();
        self.repository.clear_cache().await
    }

    fn save_dictionary(&self) -> Result<()> {
        self.pipeline.resolver().snapshot().save(&self.dictionary_path)
    }

    async fn persist_stats(&self) {
        if let Err(e) = self.pipeline.stats().persist().await {
            warn!("Failed to persist statistics: {:#}", e);
        }
    }

    fn openrouter_client(&self) -> OpenRouter {
        let mut translation = self.config.translation.clone();
        translation.provider = TranslationProvider::OpenRouter;
        OpenRouter::new(
            translation.get_api_key(),
            translation.get_endpoint(),
            translation.get_model(),
            Duration::from_secs(translation.get_timeout_secs()),
        )
        .with_site(&translation.site_url, &translation.site_name)
    }
}

/// Directory holding the dictionary and the refreshed model catalog
pub fn default_data_dir() -> Result<PathBuf> {
    let db_path = DatabaseConnection::default_database_path()?;
    db_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}
