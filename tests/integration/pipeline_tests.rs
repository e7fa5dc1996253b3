/*!
 * Integration tests for single request resolution
 */

use std::sync::Arc;
use std::time::Duration;

use page_translator::app_config::TranslationProvider;
use page_translator::providers::mock::MockProvider;
use page_translator::translation::{
    CacheStore, CustomDictionary, EntryKind, FnStage, MemoryStore, Outcome, PipelineOptions, StageContext,
    StageRegistry, TranslationRequest,
};

use crate::common::{italian_dictionary, pipeline_with, pipeline_with_cache, pipeline_with_dictionary_stage};

#[tokio::test]
async fn test_translate_calledTwice_shouldBeIdempotentAndCached() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    let request = pipeline.request("Welcome to our shop", "en", "it");

    let first = pipeline.translate(&request).await.unwrap();
    let second = pipeline.translate(&request).await.unwrap();

    assert_eq!(first.text, "[it] Welcome to our shop");
    assert_eq!(second.text, first.text);
    assert_eq!(second.outcome, Outcome::Cached);
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translate_withSameLanguage_shouldReturnInputWithoutProvider() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), italian_dictionary());

    let resolution = pipeline.translate(&pipeline.request("Submit", "en", "en")).await.unwrap();

    assert_eq!(resolution.text, "Submit");
    assert_eq!(resolution.outcome, Outcome::Identity);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withWhitespaceContent_shouldBeIdentity() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());

    let resolution = pipeline.translate(&pipeline.request("   ", "en", "it")).await.unwrap();

    assert_eq!(resolution.outcome, Outcome::Identity);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withExcludedWord_shouldIgnoreProvider() {
    let provider = MockProvider::fixed("Something else");
    let pipeline = pipeline_with(provider.clone(), italian_dictionary());

    let resolution = pipeline.translate(&pipeline.request("Acme", "en", "it")).await.unwrap();

    assert_eq!(resolution.text, "Acme");
    assert_eq!(resolution.outcome, Outcome::Excluded);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withExclusionAndExactEntry_shouldPreferExclusion() {
    let mut dictionary = italian_dictionary();
    dictionary.add_entry("it", EntryKind::ExcludeWord, "Submit", None).unwrap();
    let pipeline = pipeline_with(MockProvider::working(), dictionary);

    let resolution = pipeline.translate(&pipeline.request("Submit", "en", "it")).await.unwrap();

    assert_eq!(resolution.text, "Submit");
    assert_eq!(resolution.outcome, Outcome::Excluded);
}

#[tokio::test]
async fn test_translate_withExactEntry_shouldUseDictionary() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), italian_dictionary());

    let resolution = pipeline.translate(&pipeline.request("Submit", "en", "it")).await.unwrap();

    assert_eq!(resolution.text, "Invia");
    assert_eq!(resolution.outcome, Outcome::Dictionary);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withExactEntryCaseVariants_shouldPreserveCase() {
    let pipeline = pipeline_with(MockProvider::failing(), italian_dictionary());

    for (input, expected) in [("HELLO", "CIAO"), ("Hello", "Ciao"), ("hello", "ciao")] {
        let resolution = pipeline.translate(&pipeline.request(input, "en", "it")).await.unwrap();
        assert_eq!(resolution.text, expected);
    }
}

#[tokio::test]
async fn test_translate_withPhoneNumber_shouldKeepItVerbatim() {
    let pipeline = pipeline_with(MockProvider::working(), italian_dictionary());

    for target in ["it", "de", "fr"] {
        let resolution = pipeline
            .translate(&pipeline.request("Call 555-1234 now", "en", target))
            .await
            .unwrap();
        assert!(resolution.text.contains("555-1234"), "{} lost the number", target);
        assert!(!resolution.text.contains("PROTECT"));
    }
}

#[tokio::test]
async fn test_translate_withProtectedWordInsideText_shouldHideItFromProvider() {
    let provider = MockProvider::working();
    let cache = MemoryStore::new();
    let pipeline = pipeline_with_cache(provider.clone(), italian_dictionary(), Arc::new(cache.clone()));

    let request = pipeline.request("Acme sells shoes", "en", "it");
    let first = pipeline.translate(&request).await.unwrap();
    let second = pipeline.translate(&request).await.unwrap();

    let sent = provider.seen_texts();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].contains("Acme"));
    assert!(sent[0].contains("[[PROTECT_"));
    assert_eq!(first.text, "[it] Acme sells shoes");
    assert_eq!(second.outcome, Outcome::Cached);
    assert_eq!(second.text, first.text);
    assert!(cache.get("protection_map_it").await.unwrap().is_some());
}

#[tokio::test]
async fn test_translate_withProviderFailure_shouldNotCache() {
    let provider = MockProvider::intermittent(1);
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    let request = pipeline.request("Hello", "en", "de");

    assert!(pipeline.translate(&request).await.is_err());
    assert!(pipeline.translate(&request).await.is_err());
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_translate_withEmptyProviderAnswer_shouldNotCache() {
    let provider = MockProvider::empty();
    let pipeline = pipeline_with(provider.clone(), CustomDictionary::new());
    let request = pipeline.request("Hello", "en", "de");

    pipeline.translate(&request).await.unwrap();
    let second = pipeline.translate(&request).await.unwrap();

    assert_eq!(second.outcome, Outcome::Translated);
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_translate_withAfterStage_shouldTransformProviderOutput() {
    let mut stages = StageRegistry::new();
    stages.register_after(Arc::new(FnStage::new(
        "shout",
        |content: &str, context: &StageContext<'_>| format!("{}!{}", content, context.target_lang),
    )));
    let pipeline = pipeline_with(MockProvider::working(), CustomDictionary::new()).with_stages(stages);

    let resolution = pipeline.translate(&pipeline.request("Hi", "en", "es")).await.unwrap();

    assert_eq!(resolution.text, "[es] Hi!es");
}

#[tokio::test]
async fn test_lookup_withMiss_shouldNotCallProvider() {
    let provider = MockProvider::working();
    let pipeline = pipeline_with(provider.clone(), italian_dictionary());

    let miss = pipeline.lookup(&pipeline.request("Unknown text", "en", "it")).await.unwrap();
    let hit = pipeline.lookup(&pipeline.request("Submit", "en", "it")).await.unwrap();

    assert!(miss.is_none());
    assert_eq!(hit.unwrap().text, "Invia");
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translateLive_withSlowProvider_shouldReportTimeout() {
    let pipeline = pipeline_with(MockProvider::slow(500), CustomDictionary::new()).with_options(PipelineOptions {
        live_timeout: Duration::from_millis(20),
        ..Default::default()
    });

    let response = pipeline.translate_live(&pipeline.request("Hello", "en", "it")).await;

    assert_eq!(response.translation, "Hello");
    assert_eq!(response.error.unwrap().code, "timeout");
}

#[tokio::test]
async fn test_translateLive_withCachedValue_shouldFlagCached() {
    let pipeline = pipeline_with(MockProvider::working(), CustomDictionary::new());
    let request = pipeline.request("Hello", "en", "it");

    let first = pipeline.translate_live(&request).await;
    let second = pipeline.translate_live(&request).await;

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.translation, "[it] Hello");
    assert!(second.error.is_none());
}

#[tokio::test]
async fn test_translateLive_withGoogleRequestOnOpenRouterPipeline_shouldReportUnsupported() {
    let pipeline = pipeline_with(MockProvider::working(), CustomDictionary::new());
    let request = TranslationRequest::new("Hello", "en", "it", TranslationProvider::Google);

    let response = pipeline.translate_live(&request).await;

    assert_eq!(response.error.unwrap().code, "unsupported_provider");
}

#[tokio::test]
async fn test_translate_shouldRecordStatistics() {
    let pipeline = pipeline_with(MockProvider::working(), CustomDictionary::new());

    pipeline.translate(&pipeline.request("One", "en", "it")).await.unwrap();
    pipeline.translate(&pipeline.request("Two", "en", "it")).await.unwrap();

    assert_eq!(pipeline.stats().performance().total_translations, 2);
    let models = pipeline.stats().model_stats();
    assert_eq!(models[0].model_id, "mock/model");
    assert_eq!(models[0].success_rate, 100.0);
}

fn protecting_dictionary() -> CustomDictionary {
    let mut dictionary = CustomDictionary::new();
    dictionary.add_entry("it", EntryKind::ExcludeWord, "Acme", None).unwrap();
    dictionary
        .add_entry("it", EntryKind::Partial, "protect", Some("proteggi"))
        .unwrap();
    dictionary
}

#[tokio::test]
async fn test_translate_withDictionaryStageAndExclusions_shouldKeepPlaceholdersIntact() {
    let provider = MockProvider::working();
    let cache = MemoryStore::new();
    let pipeline =
        pipeline_with_dictionary_stage(provider.clone(), protecting_dictionary(), Arc::new(cache.clone()));

    let request = pipeline.request("Acme protects shoes", "en", "it");
    let first = pipeline.translate(&request).await.unwrap();

    let sent = provider.seen_texts();
    assert!(sent[0].contains("[[PROTECT_"));
    assert!(sent[0].ends_with(" proteggis shoes"));
    assert_eq!(first.text, "[it] Acme proteggis shoes");

    let cached = cache.get(&request.fingerprint()).await.unwrap().unwrap();
    assert_eq!(cached, first.text);
    assert!(!cached.contains("[[PROTECT_"));
}

#[tokio::test]
async fn test_translateBatch_withDictionaryStageAndExclusions_shouldNeverReturnPlaceholders() {
    let pipeline = pipeline_with_dictionary_stage(
        MockProvider::working(),
        protecting_dictionary(),
        Arc::new(MemoryStore::new()),
    );
    let texts = vec!["Acme sells shoes".to_string(), "Protect your Acme order".to_string()];

    let response = pipeline.translate_batch(&texts, "en", "it").await;

    for item in &response.results {
        assert!(item.error.is_none());
        assert!(item.translation.contains("Acme"));
        assert!(!item.translation.contains("[[PROTECT_"));
        assert!(!item.translation.to_lowercase().contains("proteggi_"));
    }
}
