/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - OpenRouter: chat-completion models behind one API
 * - Google: Google Translate v2 REST API
 *
 * Two traits live here. `Provider` is the wire level: one request type, one
 * response type, one HTTP round trip. `ProviderClient` is what the pipeline
 * talks to: single and batch translation of plain strings.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all wire-level provider clients
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing the translation clients to share request plumbing.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract the translated text from the provider response
    fn extract_text(response: &Self::Response) -> Vec<String>;
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Model to use instead of the configured one (OpenRouter only)
    pub model: Option<String>,
    /// Deadline for this call instead of the client default
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Translation backend used by the pipeline
#[async_trait]
pub trait ProviderClient: Send + Sync + Debug {
    /// Backend identifier, part of every cache fingerprint
    fn kind(&self) -> TranslationProvider;

    /// Configured model, if the backend has one
    fn model(&self) -> Option<&str>;

    /// Translate a single text
    async fn translate_one(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<String, ProviderError>;

    /// Translate several texts in one call.
    ///
    /// The result always has exactly `texts.len()` entries in input order.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError>;

    /// Check credentials and reachability with one cheap request
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the client for the active provider of `config`
pub fn create_client(config: &TranslationConfig) -> Arc<dyn ProviderClient> {
    let api_key = config.get_api_key();
    let endpoint = config.get_endpoint();
    let timeout = Duration::from_secs(config.get_timeout_secs());

    match config.provider {
        TranslationProvider::OpenRouter => Arc::new(
            openrouter::OpenRouter::new(api_key, endpoint, config.get_model(), timeout)
                .with_site(&config.site_url, &config.site_name),
        ),
        TranslationProvider::Google => Arc::new(google::GoogleTranslate::new(api_key, endpoint, timeout)),
    }
}

pub mod catalog;
pub mod google;
pub mod mock;
pub mod openrouter;
