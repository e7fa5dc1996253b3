/*!
 * Error types for the page-translator crate.
 *
 * This module contains custom error types for the different layers of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider has no API key configured
    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    /// The HTTP request could not be sent or the connection dropped
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The configured provider name is not known
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
}

impl ProviderError {
    /// Stable machine-readable code surfaced to callers alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey(_) => "missing_api_key",
            Self::RequestFailed(_) => "transport_error",
            Self::Timeout(_) => "timeout",
            Self::ApiError { .. } => "api_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::UnsupportedProvider(_) => "unsupported_provider",
        }
    }

    /// Whether this error comes from configuration rather than the remote side
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingApiKey(_) | Self::UnsupportedProvider(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else if let Some(status) = error.status() {
            Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while resolving a translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error reading or writing the cache store
    #[error("Cache error: {0}")]
    Cache(String),

    /// Provider calls are switched off for live requests
    #[error("Live translation disabled: {0}")]
    LiveDisabled(String),
}

impl TranslationError {
    /// Code reported in live responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.code(),
            Self::Cache(_) => "cache_error",
            Self::LiveDisabled(_) => "live_translation_disabled",
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("{0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Provider(e) if e.is_config_error() => 2,
            Self::Provider(_) | Self::Translation(_) => 3,
            Self::File(_) | Self::Unknown(_) => 1,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<TranslationError>() {
            Ok(e) => return Self::Translation(e),
            Err(error) => error,
        };
        let error = match error.downcast::<ProviderError>() {
            Ok(e) => return Self::Provider(e),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(e) => Self::File(e.to_string()),
            Err(error) => Self::Unknown(format!("{:#}", error)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
