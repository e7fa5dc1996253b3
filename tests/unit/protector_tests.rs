/*!
 * Tests for placeholder protection
 */

use std::sync::Arc;

use page_translator::translation::dictionary::ExcludeRules;
use page_translator::translation::patterns::PatternCache;
use page_translator::translation::protector::placeholder_for;
use page_translator::translation::TextProtector;

use crate::common::PHONE_PATTERN;

fn protector() -> TextProtector {
    TextProtector::new(Arc::new(PatternCache::new()))
}

fn rules(words: &[&str], phrases: &[&str], patterns: &[&str]) -> ExcludeRules {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    ExcludeRules {
        words: owned(words),
        phrases: owned(phrases),
        patterns: owned(patterns),
    }
}

#[test]
fn test_protect_withPhonePattern_shouldHideNumber() {
    let (protected, map) = protector().protect("Call 555-1234 now", &rules(&[], &[], &[PHONE_PATTERN]));

    assert!(!protected.contains("555-1234"));
    assert_eq!(protected, format!("Call {} now", placeholder_for("555-1234")));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_restore_afterTranslation_shouldBringBackOriginals() {
    let protector = protector();
    let (protected, map) = protector.protect("Acme sells at 555-1234", &rules(&["Acme"], &[], &[PHONE_PATTERN]));

    let translated = protected.replace("sells at", "vende al");
    let restored = protector.restore(&translated, &map);

    assert_eq!(restored, "Acme vende al 555-1234");
}

#[test]
fn test_protect_withOverlappingRules_shouldNotRewritePlaceholders() {
    // The phrase contains the word; the word's placeholder must survive the phrase pass
    let (protected, map) = protector().protect(
        "Visit Acme Store today",
        &rules(&["Acme"], &["Acme Store"], &["[0-9a-f]{4}"]),
    );

    let restored = map.restore(&protected);
    assert_eq!(restored, "Visit Acme Store today");
}

#[test]
fn test_protect_withNoRules_shouldReturnInput() {
    let (protected, map) = protector().protect("Nothing to hide", &ExcludeRules::default());
    assert_eq!(protected, "Nothing to hide");
    assert!(map.is_empty());
}

#[test]
fn test_placeholderFor_shouldBeStable() {
    assert_eq!(placeholder_for("555-1234"), placeholder_for("555-1234"));
    assert_ne!(placeholder_for("555-1234"), placeholder_for("555-1235"));
}
