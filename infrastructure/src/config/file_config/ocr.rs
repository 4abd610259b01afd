//! OCR configuration from TOML (`[ocr]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOcrConfig {
    /// Recognition language, `auto` to let the engine decide
    pub language: String,
    /// Directory of `<image_id>.json` recognition fixtures
    pub fixture_dir: Option<PathBuf>,
}

impl Default for FileOcrConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            fixture_dir: None,
        }
    }
}
