//! Translation processor port

use super::ocr_processor::ProcessingError;
use async_trait::async_trait;
use inkframe_domain::TranslationRequest;

/// Machine translation engine
#[async_trait]
pub trait TranslationProcessor: Send + Sync {
    /// Translate the request's text from its source to its target language.
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProcessingError>;
}
