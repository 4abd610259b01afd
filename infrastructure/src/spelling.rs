//! Word-list spell checker
//!
//! A small [`SpellChecker`] for lettering proofreads: every word not in the
//! dictionary is reported with up to five suggestions within edit
//! distance two. Comparison is case-insensitive.

use inkframe_application::ports::spell_checker::{SpellChecker, SpellingIssue};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

const MAX_SUGGESTIONS: usize = 5;
const MAX_DISTANCE: usize = 2;

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{L}+(?:'\p{L}+)?").expect("static regex is valid"))
}

#[derive(Debug, Clone, Default)]
pub struct DictionarySpellChecker {
    words: BTreeSet<String>,
}

impl DictionarySpellChecker {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Load a newline-separated word list. Lines starting with `#` are skipped.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let checker = Self::new(content.lines().filter(|l| !l.trim_start().starts_with('#')));
        tracing::debug!(path = %path.display(), words = checker.len(), "Loaded spelling dictionary");
        Ok(checker)
    }

    pub fn add_word(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn suggestions(&self, word: &str) -> Vec<String> {
        let mut scored: Vec<(usize, &String)> = self
            .words
            .iter()
            .filter(|w| w.chars().count().abs_diff(word.chars().count()) <= MAX_DISTANCE)
            .map(|w| (edit_distance(word, w), w))
            .filter(|(d, _)| *d <= MAX_DISTANCE)
            .collect();
        scored.sort();
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, w)| w.clone())
            .collect()
    }
}

impl SpellChecker for DictionarySpellChecker {
    fn check(&self, text: &str) -> Vec<SpellingIssue> {
        word_pattern()
            .find_iter(text)
            .filter(|m| !self.words.contains(&m.as_str().to_lowercase()))
            .map(|m| {
                let start = text[..m.start()].chars().count();
                let word = m.as_str();
                SpellingIssue {
                    word: word.to_string(),
                    start,
                    end: start + word.chars().count(),
                    suggestions: self.suggestions(&word.to_lowercase()),
                }
            })
            .collect()
    }
}

/// Levenshtein distance over characters.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        prev = row;
    }
    prev[b.len()]
}
