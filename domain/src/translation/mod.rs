//! Translation value objects and the comic sound-effect dictionary

pub mod terms;

pub use terms::{ComicTerm, ComicTermsDictionary, SPECIAL_TERM_MAX_CHARS};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to translate one text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub force_update: bool,
    /// Suppress per-item progress events (batch sub-jobs)
    #[serde(default)]
    pub silent: bool,
    #[serde(default = "default_true")]
    pub preserve_formatting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

fn default_true() -> bool {
    true
}

impl TranslationRequest {
    pub fn new(
        text_block_id: impl Into<String>,
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text_block_id: text_block_id.into(),
            image_id: None,
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            force_update: false,
            silent: false,
            preserve_formatting: true,
            job_id: None,
            context: None,
        }
    }

    pub fn with_image(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_update = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Completed translation of one text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub source_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub is_special_term: bool,
}

impl TranslationResult {
    /// Result for `request` with the given translated text.
    pub fn for_request(request: &TranslationRequest, translated_text: impl Into<String>) -> Self {
        Self {
            job_id: request.job_id.clone(),
            text_block_id: request.text_block_id.clone(),
            image_id: request.image_id.clone(),
            source_text: request.text.clone(),
            translated_text: translated_text.into(),
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
            from_cache: false,
            is_special_term: false,
        }
    }
}

/// One block of a batch translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBlock {
    pub text_block_id: String,
    pub text: String,
}

impl TranslationBlock {
    pub fn new(text_block_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text_block_id: text_block_id.into(),
            text: text.into(),
        }
    }
}

/// Request to translate every text block of an image at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub blocks: Vec<TranslationBlock>,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub force_update: bool,
}

/// Aggregate outcome of a batch translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslationResult {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub translations: Vec<TranslationResult>,
}
