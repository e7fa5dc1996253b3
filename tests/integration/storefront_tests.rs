/*!
 * Integration tests for storefront content translation
 */

use anyhow::Result;
use std::sync::Arc;

use page_translator::app_controller::Controller;
use page_translator::providers::mock::MockProvider;
use page_translator::storefront::{ContentField, ProductContent};

use crate::common;

#[tokio::test]
async fn test_translateField_calledTwice_shouldServeFromStorefrontCache() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;
    let storefront = controller.storefront();

    let first = storefront.translate_field("Free shipping", ContentField::ShopNotices, "fr").await;
    let second = storefront.translate_field("Free shipping", ContentField::ShopNotices, "fr").await;

    assert_eq!(first, "[fr] Free shipping");
    assert_eq!(second, first);
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translateField_withUnchangedTranslation_shouldReturnOriginal() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working().with_custom_response(|text, _| text.to_string());
    let controller = Controller::new_for_test(Arc::new(provider.clone()), dir.path()).await?;

    let result = controller
        .storefront()
        .translate_field("iPhone", ContentField::ProductTitle, "it")
        .await;

    assert_eq!(result, "iPhone");
    Ok(())
}

#[tokio::test]
async fn test_translateProduct_shouldCoverEnabledLanguages() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(Arc::new(MockProvider::working()), dir.path()).await?;
    let product = ProductContent {
        title: "Blue Shirt".to_string(),
        short_description: "Cotton".to_string(),
        description: String::new(),
    };

    let translations = controller.storefront().translate_product(&product).await;

    assert_eq!(translations.len(), 4);
    assert!(!translations.contains_key("en"));
    assert_eq!(translations["es"].title.as_deref(), Some("[es] Blue Shirt"));
    assert_eq!(translations["es"].description.as_deref(), Some(""));
    Ok(())
}
