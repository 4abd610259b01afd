//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to [`EditorParams`] once
//! all sources are merged.

mod ocr;
mod output;
mod tools;
mod translation;

pub use ocr::FileOcrConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use tools::{FileTextStyleConfig, FileToolsConfig};
pub use translation::{FileTermConfig, FileTranslationConfig};

use inkframe_application::EditorParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems found in a merged configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("tools.max_history_length cannot be 0")]
    ZeroHistory,

    #[error("tools.grid_size must be at least 1 (got {0})")]
    GridTooSmall(f64),

    #[error("{field}: language cannot be empty")]
    EmptyLanguage { field: &'static str },

    #[error("translation.terms[{index}]: source and target must be non-empty")]
    EmptyTerm { index: usize },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Tool defaults (history, layout grid, text style)
    pub tools: FileToolsConfig,
    /// Translation languages and extra comic terms
    pub translation: FileTranslationConfig,
    /// OCR settings
    pub ocr: FileOcrConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.tools.max_history_length == 0 {
            issues.push(ConfigValidationError::ZeroHistory);
        }
        if self.tools.grid_size < 1.0 {
            issues.push(ConfigValidationError::GridTooSmall(self.tools.grid_size));
        }

        for (field, value) in [
            ("translation.source_language", &self.translation.source_language),
            ("translation.target_language", &self.translation.target_language),
            ("ocr.language", &self.ocr.language),
        ] {
            if value.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyLanguage { field });
            }
        }

        for (index, term) in self.translation.terms.iter().enumerate() {
            if term.source.trim().is_empty() || term.target.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyTerm { index });
            }
        }

        issues
    }

    /// Resolve into the parameters the application layer consumes.
    pub fn to_editor_params(&self) -> EditorParams {
        let mut params = EditorParams::default()
            .with_max_history_length(self.tools.max_history_length)
            .with_grid(self.tools.grid_size, self.tools.snap_to_grid)
            .with_languages(
                &self.translation.source_language,
                &self.translation.target_language,
            )
            .with_ocr_language(&self.ocr.language);
        params.default_font_family = self.tools.text.font_family.clone();
        params.default_font_size = self.tools.text.font_size;
        params.default_color = self.tools.text.color.clone();
        params.comic_terms = self
            .translation
            .terms
            .iter()
            .map(|term| term.to_comic_term(&self.translation.target_language))
            .collect();
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[tools]
max_history_length = 20
grid_size = 5.0

[tools.text]
font_family = "Anime Ace"
font_size = 14.0

[translation]
source_language = "ja"
target_language = "en"

[[translation.terms]]
source = "DOKI"
target = "THUMP"

[ocr]
language = "ja"
fixture_dir = "fixtures/ocr"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tools.max_history_length, 20);
        assert_eq!(config.tools.text.font_family, "Anime Ace");
        assert_eq!(config.tools.text.color, "#000000");
        assert_eq!(config.translation.terms[0].language, None);
        assert_eq!(config.ocr.fixture_dir.as_deref(), Some(std::path::Path::new("fixtures/ocr")));
        assert_eq!(config.output.format, FileOutputFormat::Json);
        assert!(!config.output.color);
        assert!(config.validate().is_empty());

        let params = config.to_editor_params();
        assert_eq!(params.max_history_length, 20);
        assert_eq!(params.grid_size, 5.0);
        assert_eq!(params.default_font_size, 14.0);
        assert_eq!(params.comic_terms[0].language, "en");
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[translation]\ntarget_language = \"de\"\n").unwrap();
        assert_eq!(config.translation.target_language, "de");
        assert_eq!(config.translation.source_language, "en");
        assert!(config.tools.snap_to_grid);
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.tools.max_history_length = 0;
        config.tools.grid_size = 0.5;
        config.ocr.language = " ".into();
        config.translation.terms.push(FileTermConfig {
            source: "".into(),
            target: "X".into(),
            language: None,
        });

        let issues = config.validate();
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ConfigValidationError::EmptyLanguage {
            field: "ocr.language"
        }));
        assert!(issues.contains(&ConfigValidationError::EmptyTerm { index: 0 }));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FileConfig::default().validate().is_empty());
        assert_eq!(FileConfig::default().to_editor_params(), EditorParams::default());
    }
}
