/*!
 * Google Translate v2 client.
 *
 * All texts of a batch travel in one form-encoded POST as repeated `q`
 * fields; the response lists translations in request order.
 */

use async_trait::async_trait;
use log::{error, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{CallOptions, Provider, ProviderClient};
use crate::app_config::TranslationProvider;
use crate::errors::ProviderError;
use crate::language_utils::AUTO_DETECT;

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap()
});

/// Decode the HTML entities Google leaves in `translatedText`
pub fn decode_html_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Form-encoded translation request
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleRequest {
    pub texts: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout: Option<Duration>,
}

impl GoogleRequest {
    pub fn new(texts: Vec<String>, source_lang: &str, target_lang: &str) -> Self {
        Self {
            texts,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            timeout: None,
        }
    }

    /// Form fields: repeated `q`, then `target`, `format` and `source` unless auto-detecting
    pub fn form_fields(&self) -> Vec<(&str, &str)> {
        let mut fields: Vec<(&str, &str)> = self.texts.iter().map(|text| ("q", text.as_str())).collect();
        fields.push(("target", self.target_lang.as_str()));
        fields.push(("format", "text"));
        if !self.source_lang.eq_ignore_ascii_case(AUTO_DETECT) {
            fields.push(("source", self.source_lang.as_str()));
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
pub struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleData {
    #[serde(default)]
    pub translations: Vec<GoogleTranslation>,
}

/// Response body of the v2 endpoint
#[derive(Debug, Deserialize)]
pub struct GoogleResponse {
    pub data: GoogleData,
}

/// Google Translate client
#[derive(Clone)]
pub struct GoogleTranslate {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for GoogleTranslate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslate")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

impl GoogleTranslate {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn url(&self) -> &str {
        if self.endpoint.is_empty() {
            "https://translation.googleapis.com/language/translate/v2"
        } else {
            &self.endpoint
        }
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    type Request = GoogleRequest;
    type Response = GoogleResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey("google".to_string()));
        }

        let mut builder = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .form(&request.form_fields());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google Translate API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json::<GoogleResponse>().await?)
    }

    fn extract_text(response: &Self::Response) -> Vec<String> {
        response
            .data
            .translations
            .iter()
            .map(|t| decode_html_entities(&t.translated_text))
            .collect()
    }
}

#[async_trait]
impl ProviderClient for GoogleTranslate {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Google
    }

    fn model(&self) -> Option<&str> {
        None
    }

    async fn translate_one(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &CallOptions,
    ) -> Result<String, ProviderError> {
        let texts = [text.to_string()];
        let mut translations = self.translate_batch(&texts, source_lang, target_lang, options).await?;
        match translations.pop() {
            Some(translation) if !translation.is_empty() => Ok(translation),
            _ => Err(ProviderError::InvalidResponse("no translation returned".to_string())),
        }
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

        let mut request = GoogleRequest::new(texts.to_vec(), source_lang, target_lang);
        request.timeout = options.timeout;

        let response = self.complete(request).await?;
        let mut translations = Self::extract_text(&response);
        if translations.len() != texts.len() {
            warn!(
                "Google returned {} translations for {} inputs",
                translations.len(),
                texts.len()
            );
        }
        translations.resize(texts.len(), String::new());
        Ok(translations)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.complete(GoogleRequest::new(vec!["Hello".to_string()], "en", "it"))
            .await
            .map(|_| ())
    }
}
