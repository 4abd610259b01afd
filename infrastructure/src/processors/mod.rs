//! Offline adapters for the OCR and translation ports
//!
//! Real recognition and translation engines are provided by the host
//! application. These adapters let the CLI and tests run whole pipelines
//! without network access.

mod fixture_ocr;
mod passthrough_translator;

pub use fixture_ocr::FixtureOcrProcessor;
pub use passthrough_translator::PassthroughTranslator;
