/*!
 * Batch translation processing.
 *
 * Items already answered by the cache, the exclusion rules or an exact
 * dictionary entry never reach the provider. The rest is split into chunks
 * of `batch_size`, each chunk grouped by content length into small
 * (< 50 bytes), medium (< 200 bytes) and large items:
 * - a group of at most five items goes out as one batch call
 * - a larger group is translated item by item, at most `max_concurrent`
 *   calls in flight
 *
 * A failed or empty provider answer degrades to the original text for that
 * item only. Results always come back in input order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;

use super::pipeline::{Outcome, Priority, TranslationPipeline, TranslationRequest, round_ms};
use crate::language_utils::is_same_language;

/// Groups of at most this many items use a single batch call
const SINGLE_CALL_GROUP_LIMIT: usize = 5;

/// UI phrases warmed into the cache for every non-default language
pub const COMMON_PHRASES: &[&str] = &[
    "Read more", "Continue reading", "Previous", "Next", "Search", "Submit",
    "Contact", "About", "Home", "Menu", "Close", "Open", "Back", "Loading",
    "Add to cart", "Buy now", "Price", "Sale", "New", "Featured",
    "Categories", "Tags", "Archive", "Page", "Post", "Comments",
];

/// Length bucket of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn of(content: &str) -> Self {
        match content.len() {
            len if len < 50 => Self::Small,
            len if len < 200 => Self::Medium,
            _ => Self::Large,
        }
    }
}

/// Indices of `items` bucketed by size, small first; empty buckets are dropped
pub fn group_by_size(items: &[(usize, &str)]) -> Vec<(SizeClass, Vec<usize>)> {
    [SizeClass::Small, SizeClass::Medium, SizeClass::Large]
        .into_iter()
        .map(|class| {
            let members = items
                .iter()
                .filter(|(_, content)| SizeClass::of(content) == class)
                .map(|(index, _)| *index)
                .collect::<Vec<_>>();
            (class, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

/// Result for one batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub translation: String,
    pub cached: bool,
    pub outcome: Outcome,
    /// Set when the provider failed and the original text was returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of a batch request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
    pub total_ms: f64,
    pub cached_count: usize,
    pub translated_count: usize,
}

impl BatchResponse {
    /// Translations in input order
    pub fn translations(&self) -> Vec<String> {
        self.results.iter().map(|item| item.translation.clone()).collect()
    }
}

impl TranslationPipeline {
    /// Translate `contents` from `source_lang` to `target_lang`, keeping input order
    pub async fn translate_batch(&self, contents: &[String], source_lang: &str, target_lang: &str) -> BatchResponse {
        let start = Instant::now();
        let requests: Vec<TranslationRequest> = contents
            .iter()
            .map(|content| self.request(content, source_lang, target_lang))
            .collect();

        let mut results: Vec<Option<BatchItem>> = vec![None; requests.len()];
        let mut pending = Vec::new();
        let mut cached_count = 0;

        for (index, request) in requests.iter().enumerate() {
            match self.resolve_without_provider(request).await {
                Some((text, outcome)) => {
                    if outcome == Outcome::Cached {
                        cached_count += 1;
                    }
                    results[index] = Some(item(index, text, outcome, None));
                }
                None => pending.push(index),
            }
        }

        let translated_count = pending.len();
        debug!(
            "Batch of {}: {} cached, {} to translate",
            requests.len(),
            cached_count,
            translated_count
        );

        for chunk in pending.chunks(self.options.batch_size.max(1)) {
            let sized: Vec<(usize, &str)> = chunk
                .iter()
                .map(|&index| (index, requests[index].content.as_str()))
                .collect();

            for (_, group) in group_by_size(&sized) {
                let translated = if group.len() <= SINGLE_CALL_GROUP_LIMIT {
                    self.translate_group_in_one_call(&requests, &group).await
                } else {
                    self.translate_group_per_item(&requests, &group).await
                };

                for translated_item in translated {
                    let index = translated_item.index;
                    results[index] = Some(translated_item);
                }
            }
        }

        let results = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.unwrap_or_else(|| {
                    item(index, requests[index].content.clone(), Outcome::Identity, None)
                })
            })
            .collect();

        BatchResponse {
            results,
            total_ms: round_ms(start.elapsed()),
            cached_count,
            translated_count,
        }
    }

    /// Warm the cache with [`COMMON_PHRASES`] in `target_lang`
    pub async fn preload_common_phrases(&self, target_lang: &str) -> usize {
        if !self.options.cache_preload || is_same_language(&self.options.default_language, target_lang) {
            return 0;
        }

        let phrases: Vec<String> = COMMON_PHRASES.iter().map(|p| p.to_string()).collect();
        let response = self
            .translate_batch(&phrases, &self.options.default_language, target_lang)
            .await;

        let warmed = response
            .results
            .iter()
            .filter(|item| item.outcome == Outcome::Translated && item.error.is_none())
            .count();
        debug!("Preloaded {} common phrases for {}", warmed, target_lang);
        warmed
    }

    async fn resolve_without_provider(&self, request: &TranslationRequest) -> Option<(String, Outcome)> {
        if request.is_identity() {
            return Some((request.content.clone(), Outcome::Identity));
        }
        if let Some(cached) = self.cache_get(&request.fingerprint()).await {
            return Some((cached, Outcome::Cached));
        }
        let target = request.target_lang.as_str();
        if self.resolver.should_exclude(&request.content, target) {
            return Some((request.content.clone(), Outcome::Excluded));
        }
        self.resolver
            .resolve_exact(&request.content, target)
            .map(|exact| (exact, Outcome::Dictionary))
    }

    async fn translate_group_in_one_call(&self, requests: &[TranslationRequest], group: &[usize]) -> Vec<BatchItem> {
        let Some(&first) = group.first() else {
            return Vec::new();
        };
        let head = &requests[first];

        let mut prepared = Vec::with_capacity(group.len());
        for &index in group {
            let request = &requests[index];
            prepared.push(self.prepare(&request.content, &self.stage_context(request)).await);
        }
        let texts: Vec<String> = prepared.iter().map(|p| p.text.clone()).collect();

        let start = Instant::now();
        let options = self.call_options(Priority::Normal, None);
        let result = self
            .provider
            .translate_batch(&texts, &head.source_lang, &head.target_lang, &options)
            .await;
        self.record_model_call(&options, start, result.is_ok());

        let translations = match result {
            Ok(translations) => translations,
            Err(e) => {
                warn!("Batch call for {} items failed, keeping originals: {}", group.len(), e);
                return group
                    .iter()
                    .map(|&index| item(index, requests[index].content.clone(), Outcome::Translated, Some(e.to_string())))
                    .collect();
            }
        };

        let mut items = Vec::with_capacity(group.len());
        for ((&index, prepared), translated) in group.iter().zip(prepared).zip(translations) {
            let request = &requests[index];
            if translated.trim().is_empty() {
                warn!("Empty batch translation for item {}, keeping original", index);
                items.push(item(
                    index,
                    request.content.clone(),
                    Outcome::Translated,
                    Some("empty translation".to_string()),
                ));
                continue;
            }

            let context = self.stage_context(request);
            match self
                .finish(&request.fingerprint(), &translated, &prepared.map, &context)
                .await
            {
                Ok(text) => items.push(item(index, text, Outcome::Translated, None)),
                Err(e) => items.push(item(index, request.content.clone(), Outcome::Translated, Some(e.to_string()))),
            }
        }

        self.stats
            .record_translation(start.elapsed().as_secs_f64() * 1000.0);
        items
    }

    async fn translate_group_per_item(&self, requests: &[TranslationRequest], group: &[usize]) -> Vec<BatchItem> {
        stream::iter(group.iter().copied())
            .map(|index| async move {
                let request = &requests[index];
                match self.translate(request).await {
                    Ok(resolution) => item(index, resolution.text, resolution.outcome, None),
                    Err(e) => {
                        warn!("Item {} failed, keeping original: {}", index, e);
                        item(index, request.content.clone(), Outcome::Translated, Some(e.to_string()))
                    }
                }
            })
            .buffered(self.options.max_concurrent.max(1))
            .collect()
            .await
    }
}

fn item(index: usize, translation: String, outcome: Outcome, error: Option<String>) -> BatchItem {
    BatchItem {
        index,
        translation,
        cached: outcome == Outcome::Cached,
        outcome,
        error,
    }
}
