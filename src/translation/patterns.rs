/*!
 * Compilation of user-supplied regular expressions.
 *
 * Dictionary patterns may be written bare (`\d{3}-\d{4}`) or delimited with
 * trailing flags (`/\d{3}-\d{4}/i`). Compiled patterns are memoised; a pattern
 * that fails to compile is reported once and then skipped.
 */

use log::warn;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;

/// Compile a bare or delimited pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&to_rust_syntax(pattern))
}

/// Rewrite `/body/flags` into `(?flags)body`; bare patterns pass through
fn to_rust_syntax(pattern: &str) -> String {
    let trimmed = pattern.trim();

    if trimmed.len() >= 2 && trimmed.starts_with('/') {
        if let Some(end) = trimmed.rfind('/').filter(|end| *end > 0) {
            let body = &trimmed[1..end];
            let flags: String = trimmed[end + 1..]
                .chars()
                .filter(|flag| matches!(flag, 'i' | 'm' | 's' | 'x'))
                .collect();

            return if flags.is_empty() {
                body.to_string()
            } else {
                format!("(?{}){}", flags, body)
            };
        }
    }

    trimmed.to_string()
}

/// Memoised pattern compiler shared by the protector and the dictionary
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: RwLock<HashMap<String, Option<Regex>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled form of `pattern`, `None` if it is malformed
    pub fn get(&self, pattern: &str) -> Option<Regex> {
        if let Some(compiled) = self.compiled.read().get(pattern) {
            return compiled.clone();
        }

        let compiled = match compile_pattern(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Skipping malformed pattern '{}': {}", pattern, e);
                None
            }
        };

        self.compiled
            .write()
            .insert(pattern.to_string(), compiled.clone());
        compiled
    }

    /// Whole-word, case-insensitive matcher for a literal term
    pub fn word(&self, term: &str) -> Option<Regex> {
        self.get(&format!(r"(?i)\b{}\b", regex::escape(term)))
    }

    /// Case-insensitive matcher for a literal substring
    pub fn literal_ignore_case(&self, term: &str) -> Option<Regex> {
        self.get(&format!("(?i){}", regex::escape(term)))
    }
}
