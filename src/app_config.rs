use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::storefront::FieldSettings;

/// Application configuration module
/// This module handles the translator configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language the site content is written in (ISO)
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Languages visitors can switch to
    #[serde(default = "default_enabled_languages")]
    pub enabled_languages: Vec<String>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batching, caching and live request settings
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Where durable state lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Which storefront fields get translated
    #[serde(default)]
    pub storefront: FieldSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Translate v2 REST API
    #[default]
    Google,
    // @provider: OpenRouter chat-completion models
    OpenRouter,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::OpenRouter => "OpenRouter",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::OpenRouter => "openrouter".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openrouter" => Ok(Self::OpenRouter),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name (OpenRouter only)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Google => Self {
                provider_type: "google".to_string(),
                model: String::new(),
                api_key: String::new(),
                endpoint: default_google_endpoint(),
                timeout_secs: default_google_timeout_secs(),
            },
            TranslationProvider::OpenRouter => Self {
                provider_type: "openrouter".to_string(),
                model: default_openrouter_model(),
                api_key: String::new(),
                endpoint: default_openrouter_endpoint(),
                timeout_secs: default_openrouter_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Site URL sent as `HTTP-Referer` to OpenRouter
    #[serde(default = "String::new")]
    pub site_url: String,

    /// Site name sent as `X-Title` to OpenRouter
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Apply dictionary exact/partial rules inside text before the provider call
    #[serde(default = "default_true")]
    pub apply_dictionary_in_text: bool,
}

/// Performance settings for batching, caching and live requests
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Maximum number of items handled per batch window
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum concurrent per-item provider calls in a batch
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Warm the cache with common UI phrases
    #[serde(default = "default_true")]
    pub cache_preload: bool,

    /// Allow provider calls from live requests
    #[serde(default = "default_true")]
    pub live_translation: bool,

    /// Lifetime of cached translations in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Deadline for single-item live provider calls in seconds
    #[serde(default = "default_live_timeout_secs")]
    pub live_timeout_secs: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            cache_preload: true,
            live_translation: true,
            cache_ttl_secs: default_cache_ttl_secs(),
            live_timeout_secs: default_live_timeout_secs(),
        }
    }
}

/// Storage locations
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// SQLite database for the durable cache and statistics
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// JSON file holding the custom dictionary
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_enabled_languages() -> Vec<String> {
    ["en", "it", "es", "fr", "de"]
        .iter()
        .map(|code| code.to_string())
        .collect()
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(TranslationProvider::Google),
        ProviderConfig::new(TranslationProvider::OpenRouter),
    ]
}

fn default_site_name() -> String {
    "Page Translator".to_string()
}

fn default_batch_size() -> usize {
    20
}

fn default_max_concurrent() -> usize {
    3
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_live_timeout_secs() -> u64 {
    15
}

fn default_openrouter_timeout_secs() -> u64 {
    30
}

fn default_google_timeout_secs() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

fn default_openrouter_endpoint() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_google_endpoint() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_openrouter_model() -> String {
    "meta-llama/llama-3.1-8b-instruct:free".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.default_language)
            .context("Invalid default language")?;

        for code in &self.enabled_languages {
            crate::language_utils::validate_language_code(code)
                .with_context(|| format!("Invalid enabled language: {}", code))?;
        }

        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint).with_context(|| format!("Invalid provider endpoint: {}", endpoint))?;

        if self.performance.batch_size == 0 || self.performance.max_concurrent == 0 {
            return Err(anyhow!("Batch size and concurrency must be greater than zero"));
        }

        Ok(())
    }

    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Target languages other than the default one
    pub fn target_languages(&self) -> Vec<String> {
        self.enabled_languages
            .iter()
            .filter(|code| !crate::language_utils::is_same_language(code, &self.default_language))
            .cloned()
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_language: default_language(),
            enabled_languages: default_enabled_languages(),
            translation: TranslationConfig::default(),
            performance: PerformanceConfig::default(),
            storage: StorageConfig::default(),
            storefront: FieldSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access used for CLI overrides
    pub fn get_provider_config_mut(&mut self, provider_type: &TranslationProvider) -> &mut ProviderConfig {
        let provider_str = provider_type.to_lowercase_string();
        let position = self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str);

        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(*provider_type));
                self.available_providers.len() - 1
            }
        };

        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::Google => String::new(),
            TranslationProvider::OpenRouter => default_openrouter_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::Google => default_google_endpoint(),
            TranslationProvider::OpenRouter => default_openrouter_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        match self.provider {
            TranslationProvider::Google => default_google_timeout_secs(),
            TranslationProvider::OpenRouter => default_openrouter_timeout_secs(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: default_available_providers(),
            site_url: String::new(),
            site_name: default_site_name(),
            apply_dictionary_in_text: true,
        }
    }
}
