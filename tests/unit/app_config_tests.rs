/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;

use page_translator::app_config::{Config, LogLevel, TranslationProvider};
use page_translator::storefront::ContentField;

use crate::common;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.default_language, "en");
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.enabled_languages, config.enabled_languages);
    Ok(())
}

#[test]
fn test_loadOrCreate_withExistingFile_shouldParseSections() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "default_language": "it",
            "enabled_languages": ["it", "en"],
            "translation": {
                "provider": "openrouter",
                "available_providers": [
                    { "type": "openrouter", "api_key": "sk-test", "model": "openai/gpt-4o-mini" }
                ]
            },
            "performance": { "batch_size": 5, "live_translation": false },
            "storefront": { "enabled_fields": ["product_title", "coupon_messages"] },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.provider, TranslationProvider::OpenRouter);
    assert_eq!(config.translation.get_model(), "openai/gpt-4o-mini");
    assert_eq!(config.translation.get_endpoint(), "https://openrouter.ai/api/v1");
    assert_eq!(config.performance.batch_size, 5);
    assert_eq!(config.performance.max_concurrent, 3);
    assert!(!config.performance.live_translation);
    assert!(config.storefront.is_enabled(ContentField::CouponMessages));
    assert!(!config.storefront.is_enabled(ContentField::ProductDescription));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.target_languages(), vec!["en".to_string()]);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config
        .translation
        .get_provider_config_mut(&TranslationProvider::Google)
        .api_key = "key".to_string();
    assert!(config.validate().is_ok());

    config.enabled_languages.push("klingon".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_loadOrCreate_withMalformedJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}
