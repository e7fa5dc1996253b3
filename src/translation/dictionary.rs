/*!
 * Custom dictionary: per-language overrides, exclusions and corrections.
 *
 * A `CustomDictionary` holds one `LanguageDictionary` per target language and
 * is persisted as JSON. The `DictionaryResolver` answers the questions the
 * pipeline asks before and after a provider call:
 *
 * - is there an exact override for this content?
 * - must this content be left untranslated?
 * - which in-text replacements apply before translation?
 * - which corrections apply to the provider output?
 *
 * Every list keeps insertion order, and rules are applied in that order.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use parking_lot::RwLock;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::patterns::PatternCache;

/// An ordered `from` -> `to` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Content that must never be sent for translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Whole words, compared case-insensitively
    #[serde(default)]
    pub words: Vec<String>,
    /// Literal substrings
    #[serde(default)]
    pub phrases: Vec<String>,
    /// Regular expressions, bare or `/delimited/flags`
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ExcludeRules {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.phrases.is_empty() && self.patterns.is_empty()
    }
}

/// Fixes applied to provider output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corrections {
    /// Literal, case-sensitive replacements
    #[serde(default)]
    pub literal: Vec<Replacement>,
    /// Pattern replacements; `to` may reference groups as `$1`
    #[serde(default)]
    pub regex: Vec<Replacement>,
}

/// Rules for a single target language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDictionary {
    #[serde(default)]
    pub exact: Vec<Replacement>,
    #[serde(default)]
    pub partial: Vec<Replacement>,
    #[serde(default)]
    pub exclude: ExcludeRules,
    #[serde(default)]
    pub corrections: Corrections,
}

impl LanguageDictionary {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
            && self.partial.is_empty()
            && self.exclude.is_empty()
            && self.corrections.literal.is_empty()
            && self.corrections.regex.is_empty()
    }

    /// Fold `other` into this dictionary; its rules win on key collisions
    pub fn merge(&mut self, other: LanguageDictionary) {
        for rule in other.exact {
            upsert(&mut self.exact, rule, true);
        }
        for rule in other.partial {
            upsert(&mut self.partial, rule, true);
        }
        for rule in other.corrections.literal {
            upsert(&mut self.corrections.literal, rule, false);
        }
        for rule in other.corrections.regex {
            upsert(&mut self.corrections.regex, rule, false);
        }
        push_unique(&mut self.exclude.words, other.exclude.words);
        push_unique(&mut self.exclude.phrases, other.exclude.phrases);
        push_unique(&mut self.exclude.patterns, other.exclude.patterns);
    }
}

fn upsert(rules: &mut Vec<Replacement>, rule: Replacement, ignore_case: bool) {
    let same_key = |existing: &Replacement| {
        if ignore_case {
            existing.from.to_lowercase() == rule.from.to_lowercase()
        } else {
            existing.from == rule.from
        }
    };

    match rules.iter_mut().find(|existing| same_key(existing)) {
        Some(existing) => existing.to = rule.to,
        None => rules.push(rule),
    }
}

fn push_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

/// Kind of dictionary entry, used when adding or removing single rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Exact,
    Partial,
    ExcludeWord,
    ExcludePhrase,
    ExcludePattern,
    Correction,
    RegexCorrection,
}

impl EntryKind {
    /// Whether the entry carries a replacement value
    pub fn needs_value(&self) -> bool {
        matches!(
            self,
            Self::Exact | Self::Partial | Self::Correction | Self::RegexCorrection
        )
    }
}

/// All language dictionaries, persisted as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomDictionary {
    languages: BTreeMap<String, LanguageDictionary>,
}

fn language_key(lang: &str) -> String {
    lang.trim().to_lowercase()
}

impl CustomDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file yields an empty dictionary
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("No dictionary at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary file: {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse dictionary file: {:?}", path))
    }

    /// Write the dictionary as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dictionary directory: {:?}", parent))?;
        }

        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write dictionary file: {:?}", path))?;
        info!("Saved dictionary to {:?}", path);
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut parsed: Self = serde_json::from_str(json)?;
        parsed.languages = std::mem::take(&mut parsed.languages)
            .into_iter()
            .map(|(lang, dictionary)| (language_key(&lang), dictionary))
            .collect();
        Ok(parsed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Merge another dictionary into this one, or replace it entirely
    pub fn import(&mut self, other: CustomDictionary, merge: bool) {
        if !merge {
            *self = other;
            return;
        }

        for (lang, dictionary) in other.languages {
            self.languages.entry(lang).or_default().merge(dictionary);
        }
    }

    /// Export a single language, or everything when `lang` is `None`
    pub fn export(&self, lang: Option<&str>) -> Result<String> {
        match lang {
            Some(lang) => {
                let mut single = Self::default();
                if let Some(dictionary) = self.language(lang) {
                    single.languages.insert(language_key(lang), dictionary.clone());
                }
                single.to_json()
            }
            None => self.to_json(),
        }
    }

    pub fn language(&self, lang: &str) -> Option<&LanguageDictionary> {
        self.languages.get(&language_key(lang))
    }

    pub fn language_mut(&mut self, lang: &str) -> &mut LanguageDictionary {
        self.languages.entry(language_key(lang)).or_default()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Add or update a single rule
    pub fn add_entry(&mut self, lang: &str, kind: EntryKind, key: &str, value: Option<&str>) -> Result<()> {
        if key.trim().is_empty() {
            return Err(anyhow!("Dictionary entries need a non-empty key"));
        }

        let value = match (kind.needs_value(), value) {
            (true, Some(value)) => value,
            (true, None) => return Err(anyhow!("A replacement value is required for {:?} entries", kind)),
            (false, _) => "",
        };

        let dictionary = self.language_mut(lang);
        match kind {
            EntryKind::Exact => upsert(&mut dictionary.exact, Replacement::new(key, value), true),
            EntryKind::Partial => upsert(&mut dictionary.partial, Replacement::new(key, value), true),
            EntryKind::Correction => {
                upsert(&mut dictionary.corrections.literal, Replacement::new(key, value), false)
            }
            EntryKind::RegexCorrection => {
                upsert(&mut dictionary.corrections.regex, Replacement::new(key, value), false)
            }
            EntryKind::ExcludeWord => push_unique(&mut dictionary.exclude.words, vec![key.to_string()]),
            EntryKind::ExcludePhrase => push_unique(&mut dictionary.exclude.phrases, vec![key.to_string()]),
            EntryKind::ExcludePattern => push_unique(&mut dictionary.exclude.patterns, vec![key.to_string()]),
        }

        Ok(())
    }

    /// Remove a single rule, returning whether anything was removed
    pub fn remove_entry(&mut self, lang: &str, kind: EntryKind, key: &str) -> bool {
        let Some(dictionary) = self.languages.get_mut(&language_key(lang)) else {
            return false;
        };

        let lowered = key.to_lowercase();
        let removed = match kind {
            EntryKind::Exact => retain_counting(&mut dictionary.exact, |r| r.from.to_lowercase() != lowered),
            EntryKind::Partial => retain_counting(&mut dictionary.partial, |r| r.from.to_lowercase() != lowered),
            EntryKind::Correction => retain_counting(&mut dictionary.corrections.literal, |r| r.from != key),
            EntryKind::RegexCorrection => retain_counting(&mut dictionary.corrections.regex, |r| r.from != key),
            EntryKind::ExcludeWord => retain_counting(&mut dictionary.exclude.words, |w| w != key),
            EntryKind::ExcludePhrase => retain_counting(&mut dictionary.exclude.phrases, |p| p != key),
            EntryKind::ExcludePattern => retain_counting(&mut dictionary.exclude.patterns, |p| p != key),
        };

        if dictionary.is_empty() {
            self.languages.remove(&language_key(lang));
        }

        removed
    }
}

fn retain_counting<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(keep);
    items.len() != before
}

/// Transfer the case pattern of `original` onto `translation`.
///
/// All-caps stays all-caps, a capitalized first letter gives a capitalized
/// result, anything else is lowercased.
pub fn preserve_case(original: &str, translation: &str) -> String {
    let has_letters = original.chars().any(char::is_alphabetic);
    if has_letters && !original.chars().any(char::is_lowercase) {
        return translation.to_uppercase();
    }

    let lowered = translation.to_lowercase();
    match original.chars().next() {
        Some(first) if first.is_uppercase() => capitalize_first(&lowered),
        _ => lowered,
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compiled in-text matcher over one language's exact rules
#[derive(Debug)]
struct ExactMatcher {
    regex: Regex,
    /// Lowercased key -> translation
    lookup: HashMap<String, String>,
}

impl ExactMatcher {
    /// Alternation of every key, longest first; `None` when there are no keys
    fn build(rules: &[Replacement]) -> Option<Self> {
        let mut rules: Vec<&Replacement> = rules.iter().filter(|rule| !rule.from.trim().is_empty()).collect();
        if rules.is_empty() {
            return None;
        }
        rules.sort_by(|a, b| b.from.chars().count().cmp(&a.from.chars().count()));

        let alternation = rules
            .iter()
            .map(|rule| regex::escape(rule.from.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let regex = match Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)) {
            Ok(regex) => regex,
            Err(e) => {
                warn!("Skipping in-text exact rules: {}", e);
                return None;
            }
        };

        // the first inserted rule wins for duplicate keys
        let mut lookup = HashMap::new();
        for rule in rules {
            lookup
                .entry(rule.from.trim().to_lowercase())
                .or_insert_with(|| rule.to.clone());
        }

        Some(Self { regex, lookup })
    }
}

/// Read-side view over a `CustomDictionary`
#[derive(Debug)]
pub struct DictionaryResolver {
    dictionary: RwLock<CustomDictionary>,
    patterns: Arc<PatternCache>,
    /// Per-language exact matchers, dropped on every dictionary change
    exact_matchers: RwLock<HashMap<String, Option<Arc<ExactMatcher>>>>,
}

impl DictionaryResolver {
    pub fn new(dictionary: CustomDictionary, patterns: Arc<PatternCache>) -> Self {
        Self {
            dictionary: RwLock::new(dictionary),
            patterns,
            exact_matchers: RwLock::new(HashMap::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(CustomDictionary::default(), Arc::new(PatternCache::new()))
    }

    /// Pattern cache shared with the protector
    pub fn patterns(&self) -> Arc<PatternCache> {
        Arc::clone(&self.patterns)
    }

    /// Copy of the current dictionary
    pub fn snapshot(&self) -> CustomDictionary {
        self.dictionary.read().clone()
    }

    /// Mutate the dictionary in place
    pub fn update<T>(&self, f: impl FnOnce(&mut CustomDictionary) -> T) -> T {
        let mut dictionary = self.dictionary.write();
        let result = f(&mut dictionary);
        self.exact_matchers.write().clear();
        result
    }

    fn exact_matcher(&self, lang: &str) -> Option<Arc<ExactMatcher>> {
        let key = language_key(lang);
        if let Some(cached) = self.exact_matchers.read().get(&key) {
            return cached.clone();
        }

        let dictionary = self.dictionary.read();
        let matcher = dictionary
            .language(lang)
            .and_then(|d| ExactMatcher::build(&d.exact))
            .map(Arc::new);
        self.exact_matchers.write().insert(key, matcher.clone());
        matcher
    }

    #[cfg(test)]
    fn cached_matcher_count(&self) -> usize {
        self.exact_matchers.read().len()
    }

    /// Exclusion rules for `lang`, empty when the language has none
    pub fn exclusions(&self, lang: &str) -> ExcludeRules {
        self.dictionary
            .read()
            .language(lang)
            .map(|d| d.exclude.clone())
            .unwrap_or_default()
    }

    fn with_language<T>(&self, lang: &str, f: impl FnOnce(&LanguageDictionary) -> T) -> Option<T> {
        self.dictionary.read().language(lang).map(f)
    }

    /// Exact override for the whole content, with its case pattern applied
    pub fn resolve_exact(&self, content: &str, lang: &str) -> Option<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_lowercase();

        let translation = self
            .with_language(lang, |dictionary| {
                dictionary
                    .exact
                    .iter()
                    .find(|rule| rule.from.trim().to_lowercase() == lowered)
                    .map(|rule| rule.to.clone())
            })
            .flatten()?;

        let start = content.len() - content.trim_start().len();
        let end = start + trimmed.len();
        Some(format!(
            "{}{}{}",
            &content[..start],
            preserve_case(trimmed, &translation),
            &content[end..]
        ))
    }

    /// Whether the content matches an exclude word, phrase or pattern
    pub fn should_exclude(&self, content: &str, lang: &str) -> bool {
        let rules = self.exclusions(lang);
        if rules.is_empty() {
            return false;
        }

        let trimmed = content.trim().to_lowercase();
        if rules.words.iter().any(|word| word.trim().to_lowercase() == trimmed) {
            return true;
        }

        let lowered = content.to_lowercase();
        if rules
            .phrases
            .iter()
            .filter(|phrase| !phrase.is_empty())
            .any(|phrase| lowered.contains(&phrase.to_lowercase()))
        {
            return true;
        }

        rules
            .patterns
            .iter()
            .filter_map(|pattern| self.patterns.get(pattern))
            .any(|regex| regex.is_match(content))
    }

    /// Replace every exact key found inside the text, longest keys first
    pub fn apply_exact_in_text(&self, content: &str, lang: &str) -> String {
        let Some(matcher) = self.exact_matcher(lang) else {
            return content.to_string();
        };

        matcher
            .regex
            .replace_all(content, |caps: &regex::Captures| {
                let matched = &caps[0];
                match matcher.lookup.get(&matched.to_lowercase()) {
                    Some(translation) => preserve_case(matched, translation),
                    None => matched.to_string(),
                }
            })
            .into_owned()
    }

    /// Case-insensitive substring replacements, in insertion order
    pub fn apply_partial(&self, content: &str, lang: &str) -> String {
        let Some(rules) = self.with_language(lang, |d| d.partial.clone()) else {
            return content.to_string();
        };

        rules
            .iter()
            .filter(|rule| !rule.from.is_empty())
            .fold(content.to_string(), |text, rule| {
                match self.patterns.literal_ignore_case(&rule.from) {
                    Some(regex) => regex.replace_all(&text, NoExpand(&rule.to)).into_owned(),
                    None => text,
                }
            })
    }

    /// Literal corrections, then pattern corrections
    pub fn apply_corrections(&self, content: &str, lang: &str) -> String {
        let Some(corrections) = self.with_language(lang, |d| d.corrections.clone()) else {
            return content.to_string();
        };

        let corrected = corrections
            .literal
            .iter()
            .filter(|rule| !rule.from.is_empty())
            .fold(content.to_string(), |text, rule| text.replace(&rule.from, &rule.to));

        corrections
            .regex
            .iter()
            .fold(corrected, |text, rule| match self.patterns.get(&rule.from) {
                Some(regex) => regex.replace_all(&text, rule.to.as_str()).into_owned(),
                None => text,
            })
    }

    /// In-text exact replacements followed by partial replacements
    pub fn process_rules(&self, content: &str, lang: &str) -> String {
        let replaced = self.apply_exact_in_text(content, lang);
        self.apply_partial(&replaced, lang)
    }
}
