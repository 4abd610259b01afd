//! Translation configuration from TOML (`[translation]` section)
//!
//! ```toml
//! [translation]
//! source_language = "en"
//! target_language = "ru"
//!
//! [[translation.terms]]
//! source = "THWIP"
//! target = "ФЬЮТЬ"
//! ```

use inkframe_domain::translation::ComicTerm;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTranslationConfig {
    pub source_language: String,
    pub target_language: String,
    /// Comic terms added to the built-in dictionary
    pub terms: Vec<FileTermConfig>,
}

impl Default for FileTranslationConfig {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "ru".to_string(),
            terms: Vec::new(),
        }
    }
}

/// One extra dictionary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTermConfig {
    pub source: String,
    pub target: String,
    /// Defaults to `translation.target_language`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl FileTermConfig {
    pub fn to_comic_term(&self, default_language: &str) -> ComicTerm {
        ComicTerm {
            source: self.source.clone(),
            target: self.target.clone(),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| default_language.to_string()),
        }
    }
}
