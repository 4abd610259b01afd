//! Translator that returns the source text
//!
//! Useful when only the comic terms dictionary should apply, e.g. for
//! offline lettering runs. With [`PassthroughTranslator::tagged`] the output
//! is prefixed with the target language so untranslated blocks stand out.

use async_trait::async_trait;
use inkframe_application::{ProcessingError, TranslationProcessor};
use inkframe_domain::TranslationRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator {
    tag_language: bool,
}

impl PassthroughTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tagged() -> Self {
        Self { tag_language: true }
    }
}

#[async_trait]
impl TranslationProcessor for PassthroughTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProcessingError> {
        if request.target_language.trim().is_empty() {
            return Err(ProcessingError::InvalidInput(
                "Target language is empty".to_string(),
            ));
        }
        Ok(if self.tag_language {
            format!("[{}] {}", request.target_language, request.text)
        } else {
            request.text.clone()
        })
    }
}
