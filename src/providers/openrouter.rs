/*!
 * OpenRouter chat-completion client.
 *
 * Translation is done by prompting a chat model with a fixed translator
 * system instruction at temperature 0. Batches are sent as one prompt with
 * the inputs joined by a `---` separator line; the reply is split on the same
 * separator and padded or truncated to the input count.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CallOptions, Provider, ProviderClient};
use crate::app_config::TranslationProvider;
use crate::errors::ProviderError;
use crate::language_utils::display_name;

const SYSTEM_PROMPT: &str = "You are a professional translator. Respond only with translations.";

/// Separator placed between batch inputs
pub const BATCH_SEPARATOR: &str = "\n---\n";

const MIN_MAX_TOKENS: u32 = 256;
const MAX_MAX_TOKENS: u32 = 8192;

/// OpenRouter client
pub struct OpenRouter {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// API base URL, e.g. `https://openrouter.ai/api/v1`
    endpoint: String,
    /// Default model for translation calls
    model: String,
    /// Sent as `HTTP-Referer`
    site_url: String,
    /// Sent as `X-Title`
    site_name: String,
}

impl std::fmt::Debug for OpenRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouter")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat-completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,
    /// The conversation
    messages: Vec<Message>,
    /// Sampling temperature
    temperature: f32,
    /// Upper bound on generated tokens
    max_tokens: u32,
}

impl ChatRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: 0.0,
            max_tokens: MIN_MAX_TOKENS,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

/// Chat-completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// Pricing block of the model listing, values are USD per token as strings
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiPricing {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub completion: Option<String>,
}

/// One entry of `GET /models`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub context_length: Option<u32>,
    #[serde(default)]
    pub pricing: Option<ApiPricing>,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    #[serde(default)]
    data: Vec<ApiModel>,
}

/// Prompt for a single text
pub fn single_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "Translate the following text from {} to {}. Only respond with the translation:\n\n{}",
        display_name(source_lang),
        display_name(target_lang),
        text
    )
}

/// Prompt for a batch, inputs joined by [`BATCH_SEPARATOR`]
pub fn batch_prompt(texts: &[String], source_lang: &str, target_lang: &str) -> String {
    format!(
        "Translate the following texts from {} to {}. Maintain the exact order and separate translations with '---'. Only respond with translations:\n\n{}",
        display_name(source_lang),
        display_name(target_lang),
        texts.join(BATCH_SEPARATOR)
    )
}

/// Token budget for a payload of `payload_bytes`
pub fn max_tokens_for(payload_bytes: usize) -> u32 {
    let doubled = payload_bytes.saturating_mul(2).min(u32::MAX as usize) as u32;
    doubled.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS)
}

/// Split a batch reply into exactly `expected` segments
pub fn split_batch_response(response: &str, expected: usize) -> Vec<String> {
    let mut segments: Vec<String> = response
        .trim()
        .split("---")
        .map(|segment| segment.trim().to_string())
        .collect();

    if segments.len() != expected {
        warn!(
            "Batch reply has {} segments for {} inputs, padding/truncating",
            segments.len(),
            expected
        );
    }

    segments.resize(expected, String::new());
    segments
}

impl OpenRouter {
    /// Create a new OpenRouter client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            site_url: String::new(),
            site_name: String::new(),
        }
    }

    /// Set the attribution headers
    pub fn with_site(mut self, site_url: &str, site_name: &str) -> Self {
        self.site_url = site_url.to_string();
        self.site_name = site_name.to_string();
        self
    }

    fn base_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://openrouter.ai/api/v1".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }

    fn ensure_api_key(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey("openrouter".to_string()));
        }
        Ok(())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.bearer_auth(&self.api_key);
        if !self.site_url.is_empty() {
            builder = builder.header("HTTP-Referer", &self.site_url);
        }
        if !self.site_name.is_empty() {
            builder = builder.header("X-Title", &self.site_name);
        }
        builder
    }

    async fn send_chat(
        &self,
        request: ChatRequest,
        timeout: Option<Duration>,
    ) -> Result<ChatResponse, ProviderError> {
        self.ensure_api_key()?;

        let url = format!("{}/chat/completions", self.base_url());
        let mut builder = self.authorized(self.client.post(&url)).json(&request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenRouter API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    }

    fn chat_request(&self, prompt: String, payload_bytes: usize, options: &CallOptions) -> ChatRequest {
        let model = options.model.clone().unwrap_or_else(|| self.model.clone());
        ChatRequest::new(model)
            .add_message("system", SYSTEM_PROMPT)
            .add_message("user", prompt)
            .max_tokens(max_tokens_for(payload_bytes))
    }

    fn first_choice(response: &ChatResponse) -> Result<String, ProviderError> {
        Self::extract_text(response)
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))
    }

    /// Fetch the live model listing
    pub async fn list_models(&self) -> Result<Vec<ApiModel>, ProviderError> {
        self.ensure_api_key()?;

        let url = format!("{}/models", self.base_url());
        let response = self.authorized(self.client.get(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let listing = response.json::<ModelListResponse>().await?;
        debug!("OpenRouter listed {} models", listing.data.len());
        Ok(listing.data)
    }
}

#[async_trait]
impl Provider for OpenRouter {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.send_chat(request, None).await
    }

    fn extract_text(response: &Self::Response) -> Vec<String> {
        response
            .choices
            .iter()
            .map(|choice| choice.message.content.trim().to_string())
            .collect()
    }
}

#[async_trait]
impl ProviderClient for OpenRouter {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::OpenRouter
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn translate_one(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<String, ProviderError> {
        let prompt = single_prompt(text, source_lang, target_lang);
        let request = self.chat_request(prompt, text.len(), options);
        let response = self.send_chat(request, options.timeout).await?;
        Self::first_choice(&response)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = batch_prompt(texts, source_lang, target_lang);
        let payload_bytes = texts.iter().map(String::len).sum::<usize>()
            + BATCH_SEPARATOR.len() * (texts.len() - 1);
        let request = self.chat_request(prompt, payload_bytes, options);
        let response = self.send_chat(request, options.timeout).await?;
        let reply = Self::first_choice(&response)?;

        Ok(split_batch_response(&reply, texts.len()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.list_models().await.map(|_| ())
    }
}
