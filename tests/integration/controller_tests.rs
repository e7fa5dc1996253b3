/*!
 * Integration tests for the application controller
 */

use anyhow::Result;
use std::sync::Arc;

use page_translator::app_config::TranslationProvider;
use page_translator::app_controller::Controller;
use page_translator::providers::catalog::{ModelFilter, UseCase};
use page_translator::providers::mock::MockProvider;
use page_translator::translation::{CustomDictionary, EntryKind, Outcome, Priority};

use crate::common;

#[tokio::test]
async fn test_newForTest_shouldUseFastestFreeModelForHighPriority() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;

    controller.translate("Hello", "en", "it", Priority::High).await?;

    assert_eq!(
        provider.last_model().as_deref(),
        Some("meta-llama/llama-3.1-8b-instruct:free")
    );
    Ok(())
}

#[tokio::test]
async fn test_addDictionaryEntry_shouldApplyAndPersist() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;

    controller.add_dictionary_entry("it", EntryKind::Exact, "Submit", Some("Invia"))?;
    let resolution = controller.translate("Submit", "en", "it", Priority::Normal).await?;

    assert_eq!(resolution.text, "Invia");
    assert_eq!(resolution.outcome, Outcome::Dictionary);
    assert_eq!(provider.request_count(), 0);

    let saved = CustomDictionary::load(dir.path().join("dictionary.json"))?;
    assert_eq!(saved, controller.dictionary());
    Ok(())
}

#[tokio::test]
async fn test_removeDictionaryEntry_shouldReportWhetherRemoved() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;
    controller.add_dictionary_entry("it", EntryKind::ExcludeWord, "Acme", None)?;

    assert!(controller.remove_dictionary_entry("it", EntryKind::ExcludeWord, "Acme")?);
    assert!(!controller.remove_dictionary_entry("it", EntryKind::ExcludeWord, "Acme")?);
    assert!(controller.dictionary().language("it").is_none());
    Ok(())
}

#[tokio::test]
async fn test_importDictionary_withReplace_shouldDropExistingRules() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;
    controller.add_dictionary_entry("de", EntryKind::Exact, "Cart", Some("Warenkorb"))?;

    let import = common::create_test_file(dir.path(), "import.json", &common::italian_dictionary().to_json()?)?;
    controller.import_dictionary(&import, false)?;

    assert!(controller.dictionary().language("de").is_none());
    let exported = controller.export_dictionary(Some("it"))?;
    assert!(exported.contains("Continua a leggere"));
    Ok(())
}

#[tokio::test]
async fn test_translate_withPartialRule_shouldRewriteTextBeforeProvider() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;
    controller.add_dictionary_entry("it", EntryKind::Partial, "WooCommerce", Some("Negozio"))?;

    let resolution = controller
        .translate("Visit our WooCommerce shop", "en", "it", Priority::Normal)
        .await?;

    assert_eq!(provider.seen_texts(), vec!["Visit our Negozio shop"]);
    assert_eq!(resolution.text, "[it] Visit our Negozio shop");
    Ok(())
}

#[tokio::test]
async fn test_stats_afterTranslations_shouldReportAllSections() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;

    controller.translate("One", "en", "it", Priority::Normal).await?;
    controller.translate("One", "en", "it", Priority::Normal).await?;

    let stats = controller.stats()?;
    assert_eq!(stats.performance.total_translations, 1);
    assert_eq!(stats.models.len(), 1);
    assert_eq!(stats.database.cache_entries, 1);
    assert_eq!(stats.database.tracked_models, 1);
    assert_eq!(stats.memory_cache_entries, 1);
    assert!(stats.memory_hit_rate > 0.0);
    Ok(())
}

#[tokio::test]
async fn test_testModel_shouldRecordModelCall() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;

    let report = controller.test_model("openai/gpt-4o-mini").await?;

    assert!(report.success);
    assert_eq!(report.translation.as_deref(), Some("[it] Hello world"));
    assert_eq!(provider.last_model().as_deref(), Some("openai/gpt-4o-mini"));
    let stats = controller.stats()?;
    assert!(stats.models.iter().any(|m| m.model_id == "openai/gpt-4o-mini"));
    Ok(())
}

#[tokio::test]
async fn test_testModel_withFailingProvider_shouldReportFailure() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::failing()), dir.path()).await?;

    let report = controller.test_model("openai/gpt-4o").await?;

    assert!(!report.success);
    assert!(report.error.is_some());
    assert_eq!(controller.stats()?.models[0].success_rate, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_testModel_withGoogleProvider_shouldFail() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working().with_kind(TranslationProvider::Google);
    let controller = Controller::new_for_test(Arc::new(provider), dir.path()).await?;

    assert!(controller.test_model("openai/gpt-4o").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_preload_withoutTarget_shouldWarmEveryTargetLanguage() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;

    let warmed = controller.preload(None).await;

    let languages: Vec<&str> = warmed.keys().map(String::as_str).collect();
    assert_eq!(languages, vec!["de", "es", "fr", "it"]);
    assert!(warmed.values().all(|count| *count > 0));
    Ok(())
}

#[tokio::test]
async fn test_purgeExpired_withFreshEntries_shouldRemoveNothing() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;
    controller.translate("Hello", "en", "it", Priority::Normal).await?;

    let report = controller.purge_expired().await?;

    assert_eq!((report.memory, report.database), (0, 0));
    assert_eq!(controller.clear_cache().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_listModels_withFreeFilter_shouldOnlyReturnFreeModels() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;

    let free = controller.list_models(&ModelFilter {
        free_only: true,
        ..Default::default()
    });

    assert!(!free.is_empty());
    assert!(free.iter().all(|m| m.is_free()));
    assert!(!controller.recommended_models(UseCase::Speed).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_checkConnection_withWorkingProvider_shouldConnect() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;

    let report = controller.check_connection().await;

    assert!(report.connected);
    assert_eq!(report.provider, TranslationProvider::OpenRouter);
    assert!(report.error.is_none());
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_checkConnection_withFailingProvider_shouldReportRemoteError() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::failing()), dir.path()).await?;

    let report = controller.check_connection().await;

    assert!(!report.connected);
    assert_eq!(report.code, Some("api_error"));
    assert!(!report.config_error);
    assert!(report.error.unwrap_or_default().contains("Simulated provider failure"));
    Ok(())
}
