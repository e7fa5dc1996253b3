/*!
 * # Page Translator
 *
 * Translation resolution for web page content: a request for a text in a
 * target language is answered from the cache, the custom dictionary or a
 * machine-translation provider, in that order.
 *
 * ## Features
 *
 * - Google Translate and OpenRouter providers
 * - Two-tier cache (memory in front of SQLite) keyed by content fingerprint
 * - Custom dictionary with exact overrides, partial replacements,
 *   exclusions and post-translation corrections
 * - Placeholder protection of excluded spans across the provider call
 * - Ordered batch translation with size grouping
 * - OpenRouter model catalog and per-model statistics
 * - Storefront field translation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Wiring of storage, providers and the pipeline
 * - `translation`: The resolution pipeline:
 *   - `translation::pipeline`: Single request resolution
 *   - `translation::batch`: Batch processing of translations
 *   - `translation::cache`: Caching mechanisms for translations
 *   - `translation::dictionary`: Custom dictionary rules
 *   - `translation::protector`: Placeholder protection
 * - `providers`: Provider clients and the model catalog:
 *   - `providers::google`: Google Translate v2 client
 *   - `providers::openrouter`: OpenRouter chat-completion client
 *   - `providers::catalog`: OpenRouter model catalog
 * - `storefront`: Shop content translation
 * - `database`: SQLite persistence
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod storefront;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, is_same_language, normalize_to_part2t};
pub use storefront::{ContentField, FieldSettings, StorefrontTranslator};
pub use translation::{Outcome, Priority, TranslationPipeline, TranslationRequest};
