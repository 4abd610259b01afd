//! Editor integrations
//!
//! Glue modules that keep the OCR and translation services in sync with
//! the editors. They only talk to the editors through the event bus:
//!
//! ```text
//! imageEditor.imageUpdated ──▶ OcrEditorIntegration ──▶ integration.ocrRequireUpdate
//! perform_ocr ───────────────▶ OcrProcessor ─────────▶ integration.ocrResultsAvailable
//!                                                          │
//!                                                          ▼
//!                               TranslationEditorIntegration drops the image's translations
//! textEditor.translationRequested ──▶ translate_block ──▶ integration.translationReady
//! ```
//!
//! Processing failures are published as `integration.processingFailed` and
//! returned to direct callers. Nothing is retried automatically.

pub mod ocr;
pub mod translation;

pub use ocr::OcrEditorIntegration;
pub use translation::TranslationEditorIntegration;

use crate::ports::ocr_processor::ProcessingError;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Job id of the form `<prefix>_<millis>_<seq>`, unique within the process.
pub(crate) fn next_job_id(prefix: &str) -> String {
    let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = next_job_id("ocr");
        let b = next_job_id("ocr");
        assert!(a.starts_with("ocr_"));
        assert_ne!(a, b);
    }
}
