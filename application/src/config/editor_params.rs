//! Editor parameters: session defaults for tools and integrations.
//!
//! [`EditorParams`] is what the infrastructure config loader resolves to
//! after merging files and environment. Tools read their initial state from
//! it, the translation integration reads its languages and extra terms.

use inkframe_domain::DEFAULT_MAX_HISTORY;
use inkframe_domain::translation::ComicTerm;
use serde::{Deserialize, Serialize};

/// Session defaults.
///
/// | Consumer | Fields |
/// |----------|--------|
/// | every tool | `max_history_length` |
/// | layout editor | `grid_size`, `snap_to_grid` |
/// | text editor | `default_font_family`, `default_font_size`, `default_color` |
/// | OCR | `ocr_language` |
/// | translation | `source_language`, `target_language`, `comic_terms` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorParams {
    pub max_history_length: usize,
    pub grid_size: f64,
    pub snap_to_grid: bool,
    pub default_font_family: String,
    pub default_font_size: f64,
    pub default_color: String,
    pub ocr_language: String,
    pub source_language: String,
    pub target_language: String,
    /// Added on top of the built-in sound effects
    pub comic_terms: Vec<ComicTerm>,
}

impl Default for EditorParams {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY,
            grid_size: 10.0,
            snap_to_grid: true,
            default_font_family: "Comic Sans MS".to_string(),
            default_font_size: 16.0,
            default_color: "#000000".to_string(),
            ocr_language: "auto".to_string(),
            source_language: "en".to_string(),
            target_language: "ru".to_string(),
            comic_terms: Vec::new(),
        }
    }
}

impl EditorParams {
    // ==================== Builder Methods ====================

    pub fn with_max_history_length(mut self, max: usize) -> Self {
        self.max_history_length = max.max(1);
        self
    }

    pub fn with_grid(mut self, size: f64, snap: bool) -> Self {
        self.grid_size = size.max(1.0);
        self.snap_to_grid = snap;
        self
    }

    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_language = source.into();
        self.target_language = target.into();
        self
    }

    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = language.into();
        self
    }

    pub fn with_comic_term(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        self.comic_terms.push(ComicTerm {
            source: source.into(),
            target: target.into(),
            language: language.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = EditorParams::default();
        assert_eq!(params.max_history_length, 50);
        assert_eq!(params.grid_size, 10.0);
        assert!(params.snap_to_grid);
        assert_eq!(params.ocr_language, "auto");
    }

    #[test]
    fn test_builders_floor_values() {
        let params = EditorParams::default()
            .with_max_history_length(0)
            .with_grid(0.2, false)
            .with_languages("ja", "en")
            .with_comic_term("DOKI", "THUMP", "en");
        assert_eq!(params.max_history_length, 1);
        assert_eq!(params.grid_size, 1.0);
        assert!(!params.snap_to_grid);
        assert_eq!(params.target_language, "en");
        assert_eq!(params.comic_terms.len(), 1);
    }
}
