//! Dictionary of comic sound-effect terms
//!
//! Short onomatopoeia ("POW", "BOOM") translate badly through general
//! engines, so they are answered from a fixed dictionary before any
//! translation service is called. Keys are `lowercase(trim(text)):language`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Texts longer than this (in characters) never hit the dictionary.
pub const SPECIAL_TERM_MAX_CHARS: usize = 10;

const DEFAULT_TERMS: &[(&str, &str, &str)] = &[
    ("POW", "БАХ", "ru"),
    ("BOOM", "БУМ", "ru"),
    ("CRASH", "ТРЕСК", "ru"),
    ("BANG", "БАБАХ", "ru"),
    ("WHAM", "БДЫЩ", "ru"),
    ("SLAM", "ХЛОП", "ru"),
    ("WHOOSH", "ВЖУХ", "ru"),
    ("ZAP", "ВЖИК", "ru"),
];

/// A single dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicTerm {
    pub source: String,
    pub target: String,
    pub language: String,
}

#[derive(Debug, Clone, Default)]
pub struct ComicTermsDictionary {
    terms: HashMap<String, String>,
}

impl ComicTermsDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary preloaded with the built-in sound effects.
    pub fn with_defaults() -> Self {
        let mut dict = Self::new();
        for (source, target, language) in DEFAULT_TERMS {
            dict.insert(source, target, language);
        }
        dict
    }

    fn key(text: &str, language: &str) -> String {
        format!("{}:{}", text.trim().to_lowercase(), language)
    }

    pub fn insert(&mut self, source: &str, target: &str, language: &str) {
        self.terms
            .insert(Self::key(source, language), target.to_string());
    }

    pub fn extend(&mut self, terms: impl IntoIterator<Item = ComicTerm>) {
        for term in terms {
            self.insert(&term.source, &term.target, &term.language);
        }
    }

    /// Translation of `text` into `language`, if `text` is short enough and known.
    pub fn lookup(&self, text: &str, language: &str) -> Option<&str> {
        if text.chars().count() > SPECIAL_TERM_MAX_CHARS {
            return None;
        }
        self.terms.get(&Self::key(text, language)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_terms() {
        let dict = ComicTermsDictionary::with_defaults();
        assert_eq!(dict.len(), 8);
        assert_eq!(dict.lookup("POW", "ru"), Some("БАХ"));
        assert_eq!(dict.lookup("  whoosh ", "ru"), Some("ВЖУХ"));
        assert_eq!(dict.lookup("POW", "de"), None);
    }

    #[test]
    fn test_long_text_skips_dictionary() {
        let mut dict = ComicTermsDictionary::new();
        dict.insert("KABOOMKABOOM", "БАБУМ", "ru");
        assert_eq!(dict.lookup("KABOOMKABOOM", "ru"), None);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut dict = ComicTermsDictionary::new();
        dict.insert("БАБАХБАБАХ", "KABOOM", "en");
        assert_eq!(dict.lookup("БАБАХБАБАХ", "en"), Some("KABOOM"));
    }

    #[test]
    fn test_extend() {
        let mut dict = ComicTermsDictionary::new();
        dict.extend([ComicTerm {
            source: "Thwip".into(),
            target: "Фьють".into(),
            language: "ru".into(),
        }]);
        assert_eq!(dict.lookup("THWIP", "ru"), Some("Фьють"));
    }
}
