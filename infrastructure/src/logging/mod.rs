//! Logging infrastructure: structured event logging.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements
//! the [`EditorEventLogger`](inkframe_application::EditorEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;
