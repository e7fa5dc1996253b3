/*!
 * Tests for dictionary resolution
 */

use std::sync::Arc;

use page_translator::translation::dictionary::preserve_case;
use page_translator::translation::patterns::PatternCache;
use page_translator::translation::{CustomDictionary, DictionaryResolver, EntryKind};

use crate::common::{PHONE_PATTERN, italian_dictionary};

fn resolver() -> DictionaryResolver {
    DictionaryResolver::new(italian_dictionary(), Arc::new(PatternCache::new()))
}

#[test]
fn test_resolveExact_withKnownPhrase_shouldReturnOverride() {
    assert_eq!(resolver().resolve_exact("Submit", "it").as_deref(), Some("Invia"));
}

#[test]
fn test_resolveExact_withCaseVariants_shouldPreserveCase() {
    let resolver = resolver();
    assert_eq!(resolver.resolve_exact("HELLO", "it").as_deref(), Some("CIAO"));
    assert_eq!(resolver.resolve_exact("Hello", "it").as_deref(), Some("Ciao"));
    assert_eq!(resolver.resolve_exact("hello", "it").as_deref(), Some("ciao"));
}

#[test]
fn test_resolveExact_withSurroundingWhitespace_shouldKeepIt() {
    assert_eq!(resolver().resolve_exact("  Submit\n", "it").as_deref(), Some("  Invia\n"));
}

#[test]
fn test_resolveExact_withOtherLanguage_shouldReturnNone() {
    assert_eq!(resolver().resolve_exact("Submit", "de"), None);
}

#[test]
fn test_applyExactInText_withOverlappingKeys_shouldPreferLongest() {
    let result = resolver().apply_exact_in_text("Read more about us", "it");
    assert_eq!(result, "Continua a leggere about us");
}

#[test]
fn test_applyExactInText_shouldRespectWordBoundaries() {
    let result = resolver().apply_exact_in_text("Reader mode", "it");
    assert_eq!(result, "Reader mode");
}

#[test]
fn test_shouldExclude_withWordPhraseAndPattern() {
    let mut dictionary = italian_dictionary();
    dictionary
        .add_entry("it", EntryKind::ExcludePhrase, "Powered by", None)
        .unwrap();
    let resolver = DictionaryResolver::new(dictionary, Arc::new(PatternCache::new()));

    assert!(resolver.should_exclude("ACME", "it"));
    assert!(!resolver.should_exclude("Acme products", "it"));
    assert!(resolver.should_exclude("Site powered by WordPress", "it"));
    assert!(resolver.should_exclude("Call 555-1234 now", "it"));
    assert!(!resolver.should_exclude("Call us now", "it"));
}

#[test]
fn test_shouldExclude_withMalformedPattern_shouldSkipIt() {
    let mut dictionary = CustomDictionary::new();
    dictionary.add_entry("it", EntryKind::ExcludePattern, "([", None).unwrap();
    dictionary
        .add_entry("it", EntryKind::ExcludePattern, PHONE_PATTERN, None)
        .unwrap();
    let resolver = DictionaryResolver::new(dictionary, Arc::new(PatternCache::new()));

    assert!(resolver.should_exclude("555-1234", "it"));
    assert!(!resolver.should_exclude("no numbers", "it"));
}

#[test]
fn test_applyPartial_shouldReplaceCaseInsensitively() {
    let mut dictionary = CustomDictionary::new();
    dictionary
        .add_entry("it", EntryKind::Partial, "WooCommerce", Some("Negozio"))
        .unwrap();
    let resolver = DictionaryResolver::new(dictionary, Arc::new(PatternCache::new()));

    assert_eq!(resolver.apply_partial("Our woocommerce shop", "it"), "Our Negozio shop");
}

#[test]
fn test_applyCorrections_shouldRunLiteralThenRegex() {
    let mut dictionary = CustomDictionary::new();
    dictionary
        .add_entry("it", EntryKind::Correction, "carrello della spesa", Some("carrello"))
        .unwrap();
    dictionary
        .add_entry("it", EntryKind::RegexCorrection, r"(\d+) euro", Some("€$1"))
        .unwrap();
    let resolver = DictionaryResolver::new(dictionary, Arc::new(PatternCache::new()));

    let corrected = resolver.apply_corrections("Il carrello della spesa costa 20 euro", "it");

    assert_eq!(corrected, "Il carrello costa €20");
}

#[test]
fn test_preserveCase_withNonLetterOriginal_shouldLowercase() {
    assert_eq!(preserve_case("123", "Ciao"), "ciao");
}

#[test]
fn test_import_withMerge_shouldKeepExistingRules() {
    let mut dictionary = italian_dictionary();
    let mut other = CustomDictionary::new();
    other.add_entry("it", EntryKind::Exact, "submit", Some("Conferma")).unwrap();
    other.add_entry("fr", EntryKind::Exact, "Submit", Some("Envoyer")).unwrap();

    dictionary.import(other, true);

    let italian = dictionary.language("it").unwrap();
    assert_eq!(italian.exact.iter().find(|r| r.from == "Submit").unwrap().to, "Conferma");
    assert!(italian.exact.iter().any(|r| r.from == "Hello"));
    assert!(dictionary.language("fr").is_some());
}

#[test]
fn test_export_withSingleLanguage_shouldRoundTrip() {
    let dictionary = italian_dictionary();
    let json = dictionary.export(Some("IT")).unwrap();
    let parsed = CustomDictionary::from_json(&json).unwrap();
    assert_eq!(parsed, dictionary);
}
