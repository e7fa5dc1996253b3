/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock `ProviderClient` that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with a tagged translation
 * - `MockProvider::fixed(..)` - Always answers with the same text
 * - `MockProvider::intermittent(n)` - Fails every nth call
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::short_batches(n)` - Batch replies are missing their last n items
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CallOptions, ProviderClient};
use crate::app_config::TranslationProvider;
use crate::errors::ProviderError;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[<target>] <text>`
    Working,
    /// Always answers with the given text
    Fixed(String),
    /// Fails intermittently (every Nth call)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty translation
    Empty,
    /// Batch replies are missing their last `missing` entries, padded with empty strings
    ShortBatch { missing: usize },
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Backend reported through `kind()`
    kind: TranslationProvider,
    /// Configured model
    model: Option<String>,
    /// Provider calls (single or batch) made so far
    request_count: Arc<AtomicUsize>,
    /// Texts sent, in order
    seen: Arc<parking_lot::Mutex<Vec<String>>>,
    /// Model used by the last call
    last_model: Arc<parking_lot::Mutex<Option<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            kind: TranslationProvider::OpenRouter,
            model: Some("mock/model".to_string()),
            request_count: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(parking_lot::Mutex::new(Vec::new())),
            last_model: Arc::new(parking_lot::Mutex::new(None)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn fixed(response: &str) -> Self {
        Self::new(MockBehavior::Fixed(response.to_string()))
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn short_batches(missing: usize) -> Self {
        Self::new(MockBehavior::ShortBatch { missing })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Report a different backend kind
    pub fn with_kind(mut self, kind: TranslationProvider) -> Self {
        self.kind = kind;
        self
    }

    /// Set a custom response generator, called with `(text, target_lang)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of provider calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every text sent to the provider, in order
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    /// Model requested by the most recent call
    pub fn last_model(&self) -> Option<String> {
        self.last_model.lock().clone()
    }

    fn translate_text(&self, text: &str, target_lang: &str) -> String {
        if let Some(generator) = self.custom_response {
            return generator(text, target_lang);
        }

        match &self.behavior {
            MockBehavior::Fixed(response) => response.clone(),
            MockBehavior::Empty => String::new(),
            _ => format!("[{}] {}", target_lang, text),
        }
    }

    async fn begin_call(&self, texts: &[String], options: &CallOptions) -> Result<(), ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().extend(texts.iter().cloned());
        *self.last_model.lock() = options.model.clone().or_else(|| self.model.clone());

        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                })
            }
            MockBehavior::Slow { delay_ms } => {
                let delay = tokio::time::Duration::from_millis(delay_ms);
                match options.timeout {
                    Some(timeout) if timeout < delay => {
                        tokio::time::sleep(timeout).await;
                        Err(ProviderError::Timeout(format!("{:?}", timeout)))
                    }
                    _ => {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    }
                }
            }
            _ => Ok(()),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            kind: self.kind,
            model: self.model.clone(),
            request_count: Arc::clone(&self.request_count),
            seen: Arc::clone(&self.seen),
            last_model: Arc::clone(&self.last_model),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn kind(&self) -> TranslationProvider {
        self.kind
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    async fn translate_one(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<String, ProviderError> {
        self.begin_call(&[text.to_string()], options).await?;
        Ok(self.translate_text(text, target_lang))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError> {
        self.begin_call(texts, options).await?;

        let mut translations: Vec<String> = texts
            .iter()
            .map(|text| self.translate_text(text, target_lang))
            .collect();

        if let MockBehavior::ShortBatch { missing } = self.behavior {
            let keep = translations.len().saturating_sub(missing);
            translations.truncate(keep);
            translations.resize(texts.len(), String::new());
        }

        Ok(translations)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.begin_call(&[], &CallOptions::default()).await
    }
}
