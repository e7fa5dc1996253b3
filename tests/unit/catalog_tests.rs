/*!
 * Tests for the OpenRouter model catalog
 */

use page_translator::providers::catalog::{ModelCatalog, ModelCategory, ModelFilter, UseCase};

#[test]
fn test_builtinCatalog_shouldContainFreeAndPremiumModels() {
    let catalog = ModelCatalog::new();
    assert!(!catalog.is_empty());
    assert!(!catalog.free_models().is_empty());
    assert!(catalog.list_models().iter().any(|m| m.category == ModelCategory::Premium));
}

#[test]
fn test_filter_withVendorAndMaxCost_shouldNarrowResults() {
    let catalog = ModelCatalog::new();
    let filter = ModelFilter {
        provider: Some("anthropic".to_string()),
        max_cost: Some(1.0),
        ..Default::default()
    };

    let models = catalog.filter(&filter);

    assert!(!models.is_empty());
    assert!(models.iter().all(|m| m.provider == "Anthropic" && m.cost_per_million_tokens <= 1.0));
}

#[test]
fn test_filter_withSearch_shouldMatchIdCaseInsensitively() {
    let catalog = ModelCatalog::new();
    let filter = ModelFilter {
        search: Some("LLAMA".to_string()),
        ..Default::default()
    };

    assert!(catalog.filter(&filter).iter().all(|m| {
        let haystack = format!("{} {} {}", m.id, m.name, m.description).to_lowercase();
        haystack.contains("llama")
    }));
}

#[test]
fn test_recommended_forQuality_shouldReturnKnownModels() {
    let catalog = ModelCatalog::new();
    let models = catalog.recommended("quality".parse::<UseCase>().unwrap());
    assert!(!models.is_empty());
    assert!(models.iter().all(|m| !m.is_free()));
}

#[test]
fn test_modelCategory_fromCost_boundaries() {
    assert_eq!(ModelCategory::from_cost(0.0), ModelCategory::Free);
    assert_eq!(ModelCategory::from_cost(1.99), ModelCategory::LowCost);
    assert_eq!(ModelCategory::from_cost(2.0), ModelCategory::Premium);
    assert_eq!("low-cost".parse::<ModelCategory>().unwrap(), ModelCategory::LowCost);
}
