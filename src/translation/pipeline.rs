/*!
 * Translation resolution pipeline.
 *
 * A request ends in exactly one outcome:
 * - `Identity`: empty content or same source and target language
 * - `Cached`: a live cache entry exists for the request fingerprint
 * - `Excluded`: the content matches an exclusion rule, returned unchanged
 * - `Dictionary`: an exact dictionary override exists
 * - `Translated`: the provider was called
 *
 * Provider failures surface as `TranslationError`; nothing is retried.
 */

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::{CacheStore, fingerprint, truncate_text};
use super::dictionary::DictionaryResolver;
use super::protector::{ProtectionMap, TextProtector, contains_placeholder};
use super::stages::{StageContext, StageRegistry};
use super::stats::StatsRecorder;
use crate::app_config::{Config, TranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::is_same_language;
use crate::providers::{CallOptions, ProviderClient};

/// Request urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Served with the fastest free model when the backend has models
    High,
    #[default]
    Normal,
    Low,
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            _ => Err(anyhow::anyhow!("Invalid priority: {}", s)),
        }
    }
}

/// One translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub content: String,
    pub source_lang: String,
    pub target_lang: String,
    pub provider: TranslationProvider,
    #[serde(default)]
    pub priority: Priority,
}

impl TranslationRequest {
    pub fn new(content: &str, source_lang: &str, target_lang: &str, provider: TranslationProvider) -> Self {
        Self {
            content: content.to_string(),
            source_lang: source_lang.trim().to_string(),
            target_lang: target_lang.trim().to_string(),
            provider,
            priority: Priority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Cache fingerprint of this request
    pub fn fingerprint(&self) -> String {
        fingerprint(
            &self.content,
            &self.source_lang,
            &self.target_lang,
            &self.provider.to_lowercase_string(),
        )
    }

    /// Whether the request can be answered with its own content
    pub fn is_identity(&self) -> bool {
        self.content.trim().is_empty() || is_same_language(&self.source_lang, &self.target_lang)
    }
}

/// How a request was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Identity,
    Cached,
    Excluded,
    Dictionary,
    Translated,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Cached => "cached",
            Self::Excluded => "excluded",
            Self::Dictionary => "dictionary",
            Self::Translated => "translated",
        };
        write!(f, "{}", name)
    }
}

/// Final text and the outcome that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub text: String,
    pub outcome: Outcome,
}

impl Resolution {
    fn new(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }
}

/// Error block of a live response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveError {
    pub message: String,
    pub code: String,
}

/// Response of the live request handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveResponse {
    pub translation: String,
    pub cached: bool,
    pub dictionary: bool,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LiveError>,
}

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Site default language, source of preloaded phrases
    pub default_language: String,
    /// Lifetime of cached translations
    pub cache_ttl: Duration,
    /// Lifetime of stored protection maps
    pub protection_ttl: Duration,
    /// Deadline of provider calls made by live requests
    pub live_timeout: Duration,
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub cache_preload: bool,
    /// When false, live requests never reach the provider
    pub live_translation: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            protection_ttl: Duration::from_secs(60 * 60),
            live_timeout: Duration::from_secs(15),
            batch_size: 20,
            max_concurrent: 3,
            cache_preload: true,
            live_translation: true,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_language: config.default_language.clone(),
            cache_ttl: Duration::from_secs(config.performance.cache_ttl_secs),
            live_timeout: Duration::from_secs(config.performance.live_timeout_secs),
            batch_size: config.performance.batch_size.max(1),
            max_concurrent: config.performance.max_concurrent.max(1),
            cache_preload: config.performance.cache_preload,
            live_translation: config.performance.live_translation,
            ..Self::default()
        }
    }
}

/// Protected text ready for the provider
#[derive(Debug)]
pub(super) struct Prepared {
    pub text: String,
    pub map: ProtectionMap,
}

/// Resolves translation requests against cache, dictionary and provider
pub struct TranslationPipeline {
    pub(super) provider: Arc<dyn ProviderClient>,
    pub(super) cache: Arc<dyn CacheStore>,
    pub(super) resolver: Arc<DictionaryResolver>,
    pub(super) protector: TextProtector,
    pub(super) stages: StageRegistry,
    pub(super) stats: Arc<StatsRecorder>,
    /// Model swapped in for high-priority requests
    pub(super) fast_model: Option<String>,
    pub(super) options: PipelineOptions,
}

impl fmt::Debug for TranslationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationPipeline")
            .field("provider", &self.provider)
            .field("stages", &self.stages)
            .field("fast_model", &self.fast_model)
            .field("options", &self.options)
            .finish()
    }
}

impl TranslationPipeline {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        cache: Arc<dyn CacheStore>,
        resolver: Arc<DictionaryResolver>,
    ) -> Self {
        let protector = TextProtector::new(resolver.patterns());
        Self {
            provider,
            cache,
            resolver,
            protector,
            stages: StageRegistry::new(),
            stats: Arc::new(StatsRecorder::new()),
            fast_model: None,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_stages(mut self, stages: StageRegistry) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsRecorder>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_fast_model(mut self, model: Option<String>) -> Self {
        self.fast_model = model;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn stats(&self) -> &Arc<StatsRecorder> {
        &self.stats
    }

    pub fn resolver(&self) -> &Arc<DictionaryResolver> {
        &self.resolver
    }

    pub fn provider(&self) -> &Arc<dyn ProviderClient> {
        &self.provider
    }

    pub fn provider_kind(&self) -> TranslationProvider {
        self.provider.kind()
    }

    /// Request for the active provider
    pub fn request(&self, content: &str, source_lang: &str, target_lang: &str) -> TranslationRequest {
        TranslationRequest::new(content, source_lang, target_lang, self.provider.kind())
    }

    /// Resolve `request`, calling the provider on a miss
    pub async fn translate(&self, request: &TranslationRequest) -> Result<Resolution, TranslationError> {
        self.resolve(request, true, None).await
    }

    /// Resolve without ever calling the provider
    pub async fn lookup(&self, request: &TranslationRequest) -> Result<Option<Resolution>, TranslationError> {
        match self.resolve(request, false, None).await {
            Ok(resolution) => Ok(Some(resolution)),
            Err(TranslationError::LiveDisabled(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Request handler contract: never fails, errors are reported in the body
    pub async fn translate_live(&self, request: &TranslationRequest) -> LiveResponse {
        let start = Instant::now();

        if request.is_identity() {
            return LiveResponse {
                translation: request.content.clone(),
                cached: false,
                dictionary: false,
                elapsed_ms: 0.0,
                error: None,
            };
        }

        let result = self
            .resolve(request, self.options.live_translation, Some(self.options.live_timeout))
            .await;
        let elapsed_ms = round_ms(start.elapsed());

        match result {
            Ok(resolution) => LiveResponse {
                translation: resolution.text,
                cached: resolution.outcome == Outcome::Cached,
                dictionary: resolution.outcome == Outcome::Dictionary,
                elapsed_ms,
                error: None,
            },
            Err(e) => LiveResponse {
                translation: request.content.clone(),
                cached: false,
                dictionary: false,
                elapsed_ms,
                error: Some(LiveError {
                    message: e.to_string(),
                    code: e.code().to_string(),
                }),
            },
        }
    }

    async fn resolve(
        &self,
        request: &TranslationRequest,
        allow_provider: bool,
        timeout: Option<Duration>,
    ) -> Result<Resolution, TranslationError> {
        if request.is_identity() {
            return Ok(Resolution::new(request.content.clone(), Outcome::Identity));
        }

        if request.provider != self.provider.kind() {
            return Err(ProviderError::UnsupportedProvider(request.provider.to_string()).into());
        }

        let key = request.fingerprint();
        if let Some(cached) = self.cache_get(&key).await {
            return Ok(Resolution::new(cached, Outcome::Cached));
        }

        let target = request.target_lang.as_str();
        if self.resolver.should_exclude(&request.content, target) {
            debug!("Excluded from translation: {}", truncate_text(&request.content, 40));
            return Ok(Resolution::new(request.content.clone(), Outcome::Excluded));
        }

        if let Some(exact) = self.resolver.resolve_exact(&request.content, target) {
            return Ok(Resolution::new(exact, Outcome::Dictionary));
        }

        if !allow_provider {
            return Err(TranslationError::LiveDisabled(
                "no cached or dictionary translation available".to_string(),
            ));
        }

        let start = Instant::now();
        let context = self.stage_context(request);
        let prepared = self.prepare(&request.content, &context).await;
        let options = self.call_options(request.priority, timeout);

        let translated = self
            .provider
            .translate_one(&prepared.text, &request.source_lang, target, &options)
            .await;
        self.record_model_call(&options, start, translated.is_ok());

        let translated = translated.map_err(|e| {
            error!(
                "Translation {} -> {} failed: {}",
                request.source_lang, request.target_lang, e
            );
            TranslationError::from(e)
        })?;

        let text = self.finish(&key, &translated, &prepared.map, &context).await?;
        self.stats.record_translation(start.elapsed().as_secs_f64() * 1000.0);

        Ok(Resolution::new(text, Outcome::Translated))
    }

    pub(super) fn stage_context<'a>(&self, request: &'a TranslationRequest) -> StageContext<'a> {
        StageContext {
            source_lang: &request.source_lang,
            target_lang: &request.target_lang,
            provider: request.provider,
        }
    }

    pub(super) fn call_options(&self, priority: Priority, timeout: Option<Duration>) -> CallOptions {
        let mut options = CallOptions {
            model: None,
            timeout,
        };
        if priority == Priority::High && self.provider.kind() == TranslationProvider::OpenRouter {
            options.model = self.fast_model.clone();
        }
        options
    }

    pub(super) fn record_model_call(&self, options: &CallOptions, start: Instant, success: bool) {
        let model = options.model.as_deref().or_else(|| self.provider.model());
        if let Some(model) = model {
            self.stats
                .record_model_call(model, start.elapsed().as_secs_f64() * 1000.0, success);
        }
    }

    /// Protect excluded spans and run the `before_translate` stages
    pub(super) async fn prepare(&self, content: &str, context: &StageContext<'_>) -> Prepared {
        let rules = self.resolver.exclusions(context.target_lang);
        let (protected, map) = self.protector.protect(content, &rules);

        if !map.is_empty() {
            self.store_protection_map(context.target_lang, &map).await;
        }

        Prepared {
            text: self.stages.run_before(&protected, context),
            map,
        }
    }

    /// Restore, correct, run `after_translate` stages and cache the result.
    ///
    /// Output that still holds a placeholder after restoration is rejected
    /// and never cached.
    pub(super) async fn finish(
        &self,
        key: &str,
        translated: &str,
        map: &ProtectionMap,
        context: &StageContext<'_>,
    ) -> Result<String, TranslationError> {
        let restored = self.protector.restore(translated, map);
        if !map.is_intact(translated) || contains_placeholder(&restored) {
            warn!(
                "Translation to {} lost protected spans, discarding it",
                context.target_lang
            );
            return Err(ProviderError::InvalidResponse(
                "translation altered protection placeholders".to_string(),
            )
            .into());
        }

        let corrected = self.resolver.apply_corrections(&restored, context.target_lang);
        let text = self.stages.run_after(&corrected, context);

        if !text.trim().is_empty() {
            self.cache_set(key, &text).await;
        }

        Ok(text)
    }

    pub(super) async fn cache_get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    pub(super) async fn cache_set(&self, key: &str, value: &str) {
        if let Err(e) = self.cache.set(key, value, self.options.cache_ttl).await {
            warn!("Failed to cache translation: {}", e);
        }
    }

    async fn store_protection_map(&self, target_lang: &str, map: &ProtectionMap) {
        let key = format!("protection_map_{}", target_lang);
        match serde_json::to_string(map) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&key, &json, self.options.protection_ttl).await {
                    warn!("Failed to store protection map: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize protection map: {}", e),
        }
    }
}

/// Milliseconds rounded to two decimals
pub(super) fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
