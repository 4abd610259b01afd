//! Observable state of the unified editor

use serde::Serialize;
use std::fmt;

/// Which workflow the editor is focused on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Ocr,
    Translation,
    Editing,
}

impl EditorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Ocr => "ocr",
            EditorMode::Translation => "translation",
            EditorMode::Editing => "editing",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ocr" => Some(EditorMode::Ocr),
            "translation" => Some(EditorMode::Translation),
            "editing" | "edit" => Some(EditorMode::Editing),
            _ => None,
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Status {
    pub text: String,
    pub level: StatusLevel,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Warning,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Languages {
    pub source: String,
    pub target: String,
}

/// Snapshot handed to an [`EditorView`](super::view::EditorView) on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub mode: EditorMode,
    pub is_processing: bool,
    /// Percentage in `[0, 100]`
    pub progress: f64,
    /// A batch translation is in flight, so single-block results do not end processing
    pub batch_translation: bool,
    pub show_original: bool,
    pub show_translated: bool,
    pub current_image_id: Option<String>,
    /// `"<width>x<height>"` of the loaded image
    pub image_info: Option<String>,
    pub ocr_blocks: Option<usize>,
    pub translated_blocks: Option<usize>,
    pub languages: Languages,
    pub status: Status,
}

impl UiState {
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            mode: EditorMode::default(),
            is_processing: false,
            progress: 0.0,
            batch_translation: false,
            show_original: true,
            show_translated: true,
            current_image_id: None,
            image_info: None,
            ocr_blocks: None,
            translated_blocks: None,
            languages: Languages {
                source: source_language.into(),
                target: target_language.into(),
            },
            status: Status::default(),
        }
    }

    pub(crate) fn finish_processing(&mut self, status: Status) {
        self.is_processing = false;
        self.progress = 100.0;
        self.status = status;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new("auto", "en")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_is_case_insensitive() {
        assert_eq!(EditorMode::parse("Translation"), Some(EditorMode::Translation));
        assert_eq!(EditorMode::parse("edit"), Some(EditorMode::Editing));
        assert_eq!(EditorMode::parse("preview"), None);
    }

    #[test]
    fn test_default_state_shows_both_texts() {
        let state = UiState::default();
        assert_eq!(state.mode, EditorMode::Ocr);
        assert!(state.show_original && state.show_translated);
        assert!(!state.is_processing);
        assert_eq!(state.languages.source, "auto");
    }
}
