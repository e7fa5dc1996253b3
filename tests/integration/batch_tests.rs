/*!
 * Integration tests for batch translation
 */

use page_translator::providers::mock::MockProvider;
use page_translator::translation::{COMMON_PHRASES, CustomDictionary, Outcome, PipelineOptions};

use crate::common::{italian_dictionary, pipeline_with, short_texts};

#[tokio::test]
async fn test_translateBatch_withSmallGroup_shouldUseOneCall() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());

    let response = pipeline.translate_batch(&short_texts(3), "en", "it").await;

    assert_eq!(response.translations(), vec!["[it] Item 0", "[it] Item 1", "[it] Item 2"]);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(response.translated_count, 3);
    assert_eq!(response.cached_count, 0);
}

#[tokio::test]
async fn test_translateBatch_withShortProviderReply_shouldKeepOriginalForMissingItem() {
    let pipeline = pipeline_with(MockProvider::short_batches(1), CustomDictionary::new());

    let response = pipeline.translate_batch(&short_texts(3), "en", "it").await;

    assert_eq!(response.translations(), vec!["[it] Item 0", "[it] Item 1", "Item 2"]);
    assert!(response.results[2].error.is_some());
    assert!(response.results[..2].iter().all(|item| item.error.is_none()));
}

#[tokio::test]
async fn test_translateBatch_withLargeGroup_shouldTranslatePerItemInOrder() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    let texts = short_texts(8);

    let response = pipeline.translate_batch(&texts, "en", "fr").await;

    let expected: Vec<String> = texts.iter().map(|t| format!("[fr] {}", t)).collect();
    assert_eq!(response.translations(), expected);
    assert_eq!(provider.request_count(), 8);
    assert!(response.results.iter().enumerate().all(|(i, item)| item.index == i));
}

#[tokio::test]
async fn test_translateBatch_withMixedSizes_shouldKeepInputOrder() {
    let pipeline = pipeline_with(MockProvider::working(), CustomDictionary::new());
    let long = "A long paragraph of page content. ".repeat(8);
    let medium = "A medium sized sentence that needs more than fifty bytes.".to_string();
    let texts = vec![long.clone(), "Short".to_string(), medium.clone(), "Tiny".to_string()];

    let response = pipeline.translate_batch(&texts, "en", "de").await;

    assert_eq!(
        response.translations(),
        vec![
            format!("[de] {}", long),
            "[de] Short".to_string(),
            format!("[de] {}", medium),
            "[de] Tiny".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_translateBatch_withCachedAndDictionaryItems_shouldSkipProviderForThem() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), italian_dictionary());
    pipeline
        .translate(&pipeline.request("Cached text", "en", "it"))
        .await
        .unwrap();

    let texts = vec![
        "Submit".to_string(),
        "Cached text".to_string(),
        "Acme".to_string(),
        String::new(),
        "Fresh text".to_string(),
    ];
    let response = pipeline.translate_batch(&texts, "en", "it").await;

    let outcomes: Vec<Outcome> = response.results.iter().map(|item| item.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Dictionary,
            Outcome::Cached,
            Outcome::Excluded,
            Outcome::Identity,
            Outcome::Translated,
        ]
    );
    assert_eq!(response.translations()[0], "Invia");
    assert_eq!(response.translations()[4], "[it] Fresh text");
    assert_eq!(response.cached_count, 1);
    assert_eq!(response.translated_count, 1);
    assert!(response.results[1].cached);
    assert_eq!(provider.seen_texts(), vec!["Cached text", "Fresh text"]);
}

#[tokio::test]
async fn test_translateBatch_withFailingProvider_shouldDegradeToOriginals() {
    let pipeline = pipeline_with(MockProvider::failing(), CustomDictionary::new());
    let texts = short_texts(7);

    let response = pipeline.translate_batch(&texts, "en", "it").await;

    assert_eq!(response.translations(), texts);
    assert!(response.results.iter().all(|item| item.error.is_some()));
}

#[tokio::test]
async fn test_translateBatch_twice_shouldServeSecondFromCache() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    let texts = short_texts(4);

    let first = pipeline.translate_batch(&texts, "en", "it").await;
    let second = pipeline.translate_batch(&texts, "en", "it").await;

    assert_eq!(first.translations(), second.translations());
    assert_eq!(second.cached_count, 4);
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translateBatch_withSmallBatchSize_shouldChunk() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new()).with_options(PipelineOptions {
        batch_size: 2,
        ..Default::default()
    });

    let response = pipeline.translate_batch(&short_texts(5), "en", "it").await;

    assert_eq!(response.results.len(), 5);
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_preloadCommonPhrases_shouldWarmCacheOnce() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());

    let warmed = pipeline.preload_common_phrases("it").await;
    let again = pipeline.preload_common_phrases("it").await;

    assert_eq!(warmed, COMMON_PHRASES.len());
    assert_eq!(again, 0);
    let cached = pipeline
        .translate(&pipeline.request("Read more", "en", "it"))
        .await
        .unwrap();
    assert_eq!(cached.outcome, Outcome::Cached);
}

#[tokio::test]
async fn test_preloadCommonPhrases_withDefaultLanguageOrDisabled_shouldSkip() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    assert_eq!(pipeline.preload_common_phrases("en").await, 0);

    let disabled = pipeline_with(provider.clone(), CustomDictionary::new()).with_options(PipelineOptions {
        cache_preload: false,
        ..Default::default()
    });
    assert_eq!(disabled.preload_common_phrases("it").await, 0);
    assert_eq!(provider.request_count(), 0);
}
