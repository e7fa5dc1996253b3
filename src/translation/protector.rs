/*!
 * Protection of excluded spans across a provider round trip.
 *
 * Before text is sent to a provider, every excluded word, phrase and pattern
 * match is swapped for an opaque placeholder `[[PROTECT_<hash>]]`. The
 * returned `ProtectionMap` restores the originals afterwards. Placeholders
 * already inserted are never rewritten by later rules.
 */

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::dictionary::ExcludeRules;
use super::patterns::PatternCache;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[PROTECT_[0-9a-f]{16}\]\]").unwrap()
});

/// Placeholder for a protected span
pub fn placeholder_for(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("[[PROTECT_{}]]", &digest[..16])
}

/// Placeholder -> original text, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionMap {
    entries: Vec<(String, String)>,
}

impl ProtectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a span and return its placeholder
    pub fn protect(&mut self, original: &str) -> String {
        let placeholder = placeholder_for(original);
        if !self.entries.iter().any(|(existing, _)| *existing == placeholder) {
            self.entries.push((placeholder.clone(), original.to_string()));
        }
        placeholder
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == placeholder)
            .map(|(_, original)| original.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, o)| (p.as_str(), o.as_str()))
    }

    /// Whether every recorded placeholder is still present in `content`
    pub fn is_intact(&self, content: &str) -> bool {
        self.entries
            .iter()
            .all(|(placeholder, _)| content.contains(placeholder.as_str()))
    }

    /// Replace every placeholder with its original text
    pub fn restore(&self, content: &str) -> String {
        self.entries
            .iter()
            .fold(content.to_string(), |text, (placeholder, original)| {
                text.replace(placeholder.as_str(), original)
            })
    }
}

/// Whether `text` still holds a protection placeholder
pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}

/// Apply `rewrite` only to the parts of `text` that are not placeholders
pub fn rewrite_unprotected(text: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for placeholder in PLACEHOLDER_RE.find_iter(text) {
        output.push_str(&rewrite(&text[cursor..placeholder.start()]));
        output.push_str(placeholder.as_str());
        cursor = placeholder.end();
    }
    output.push_str(&rewrite(&text[cursor..]));

    output
}

/// Swaps excluded spans for placeholders and back
#[derive(Debug, Clone)]
pub struct TextProtector {
    patterns: Arc<PatternCache>,
}

impl TextProtector {
    pub fn new(patterns: Arc<PatternCache>) -> Self {
        Self { patterns }
    }

    /// Protect `content` according to `rules`
    pub fn protect(&self, content: &str, rules: &ExcludeRules) -> (String, ProtectionMap) {
        let mut map = ProtectionMap::new();
        let mut text = content.to_string();

        for word in rules.words.iter().filter(|w| !w.trim().is_empty()) {
            let Some(regex) = self.patterns.word(word.trim()) else {
                continue;
            };
            if !regex.is_match(&text) {
                continue;
            }
            let placeholder = map.protect(word);
            text = rewrite_unprotected(&text, |segment| {
                regex.replace_all(segment, NoExpand(&placeholder)).into_owned()
            });
        }

        for phrase in rules.phrases.iter().filter(|p| !p.is_empty()) {
            if !text.contains(phrase.as_str()) {
                continue;
            }
            let placeholder = map.protect(phrase);
            text = rewrite_unprotected(&text, |segment| segment.replace(phrase.as_str(), &placeholder));
        }

        for pattern in &rules.patterns {
            let Some(regex) = self.patterns.get(pattern) else {
                continue;
            };
            text = rewrite_unprotected(&text, |segment| {
                regex
                    .replace_all(segment, |caps: &regex::Captures| map.protect(&caps[0]))
                    .into_owned()
            });
        }

        (text, map)
    }

    /// Restore every placeholder recorded in `map`
    pub fn restore(&self, content: &str, map: &ProtectionMap) -> String {
        map.restore(content)
    }
}
