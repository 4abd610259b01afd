//! Spell checking port used by the text editor

use serde::{Deserialize, Serialize};

/// One misspelled word found in a text.
///
/// `start` and `end` are character offsets, matching the text editor's
/// cursor model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingIssue {
    pub word: String,
    pub start: usize,
    pub end: usize,
    pub suggestions: Vec<String>,
}

pub trait SpellChecker: Send + Sync {
    fn check(&self, text: &str) -> Vec<SpellingIssue>;
}
