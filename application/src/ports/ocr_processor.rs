//! OCR processor port
//!
//! Defines the interface to the text recognition engine. The engine itself
//! is opaque to this crate: it receives an [`OcrRequest`] and answers with
//! the recognized [`TextBlock`]s.

use async_trait::async_trait;
use inkframe_domain::{OcrRequest, TextBlock};
use thiserror::Error;

/// Errors reported by OCR and translation processors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Processor unavailable: {0}")]
    Unavailable(String),

    #[error("Processing failed: {0}")]
    Failed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Text recognition engine
///
/// Implementations live in the infrastructure layer (or in a host
/// application wrapping a real OCR engine).
#[async_trait]
pub trait OcrProcessor: Send + Sync {
    /// Recognize the text blocks of one image.
    ///
    /// The request carries the preprocessing parameters and bubble hints
    /// known for the image at the time of the call.
    async fn recognize(&self, request: &OcrRequest) -> Result<Vec<TextBlock>, ProcessingError>;
}
