/*!
 * Tests for ISO language code utilities
 */

use page_translator::language_utils::{
    display_name, is_same_language, known_language_codes, native_name, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_isSameLanguage_withCaseAndWhitespace_shouldMatch() {
    assert!(is_same_language("EN", " en "));
    assert!(is_same_language("en", "eng"));
    assert!(is_same_language("fre", "fr"));
}

#[test]
fn test_isSameLanguage_withRegionalVariants_shouldNotMatch() {
    assert!(!is_same_language("pt-BR", "pt-PT"));
    assert!(!is_same_language("en", "it"));
}

#[test]
fn test_normalizeToPart2t_withPart1Code_shouldReturnThreeLetters() {
    assert_eq!(normalize_to_part2t("it").unwrap(), "ita");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert!(normalize_to_part2t("xx").is_err());
}

#[test]
fn test_validateLanguageCode_withAuto_shouldSucceed() {
    assert!(validate_language_code("auto").is_ok());
    assert!(validate_language_code("zz").is_err());
}

#[test]
fn test_displayName_shouldUseEnglishNames() {
    assert_eq!(display_name("it"), "Italian");
    assert_eq!(display_name("auto"), "auto-detect");
    assert_eq!(display_name("qq"), "qq");
}

#[test]
fn test_nativeName_withKnownCode_shouldReturnEndonym() {
    assert_eq!(native_name("de"), "Deutsch");
    assert!(known_language_codes().contains(&"ja"));
}
