/*!
 * Language registry and ISO code utilities.
 *
 * Maps the language codes used by the translator to display names (for
 * prompts and the CLI) and provides validation and matching of ISO 639-1
 * (2-letter) and ISO 639-2 (3-letter) codes. Region subtags such as `pt-BR`
 * are accepted and matched on their primary subtag.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
    /// The `auto` pseudo-language (source detection)
    Auto,
}

/// Pseudo-code asking the provider to detect the source language
pub const AUTO_DETECT: &str = "auto";

/// Languages the translator ships names for: (code, English name, native name)
const KNOWN_LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "English", "English"),
    ("it", "Italian", "Italiano"),
    ("es", "Spanish", "Español"),
    ("fr", "French", "Français"),
    ("de", "German", "Deutsch"),
    ("pt", "Portuguese", "Português"),
    ("ru", "Russian", "Русский"),
    ("zh", "Chinese", "中文"),
    ("ja", "Japanese", "日本語"),
    ("ar", "Arabic", "العربية"),
];

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Lowercased primary subtag of a code (`pt-BR` -> `pt`)
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = primary_subtag(code);

    if normalized_code == AUTO_DETECT {
        return Ok(LanguageCodeType::Auto);
    }

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if bibliographic_to_terminology(&normalized_code).is_some() => {
            Ok(LanguageCodeType::Part2B)
        }
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = primary_subtag(code);

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(terminology) = bibliographic_to_terminology(&normalized_code) {
            return Ok(terminology.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether a translation from `source` to `target` would be an identity.
///
/// Exact codes match case-insensitively; otherwise ISO normalisation decides,
/// so `en` and `eng` are the same language but `pt-BR` and `pt-PT` are not.
pub fn is_same_language(source: &str, target: &str) -> bool {
    let source = source.trim();
    let target = target.trim();

    if source.eq_ignore_ascii_case(target) {
        return true;
    }

    let has_region = |code: &str| code.contains(['-', '_']);
    if has_region(source) || has_region(target) {
        return false;
    }

    language_codes_match(source, target)
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// English display name used in provider prompts.
///
/// Known codes come from the built-in table, `auto` maps to "auto-detect",
/// other valid ISO codes fall back to their ISO name and unknown codes are
/// returned unchanged.
pub fn display_name(code: &str) -> String {
    let primary = primary_subtag(code);

    if primary == AUTO_DETECT {
        return "auto-detect".to_string();
    }

    if let Some((_, english, _)) = KNOWN_LANGUAGES.iter().find(|(c, _, _)| *c == primary) {
        return (*english).to_string();
    }

    get_language_name(code).unwrap_or_else(|_| code.to_string())
}

/// Native (endonym) name shown to site visitors
pub fn native_name(code: &str) -> String {
    let primary = primary_subtag(code);

    if let Some((_, _, native)) = KNOWN_LANGUAGES.iter().find(|(c, _, _)| *c == primary) {
        return (*native).to_string();
    }

    normalize_to_part2t(code)
        .ok()
        .and_then(|part2t| Language::from_639_3(&part2t))
        .and_then(|lang| lang.to_autonym())
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// Codes of the built-in language table
pub fn known_language_codes() -> Vec<&'static str> {
    KNOWN_LANGUAGES.iter().map(|(code, _, _)| *code).collect()
}
