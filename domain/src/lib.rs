//! Domain layer for inkframe
//!
//! This crate contains the pure data of the comic editor's tool system:
//! commands, results, tool metadata, typed editor events, history stacks,
//! and the value objects exchanged with OCR and translation services.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools and Commands
//!
//! A tool (image, text, or layout editor) accepts [`Command`]s identified by
//! a prefixed type (`image.crop`, `text.insert`, `layout.moveElement`) and
//! answers with a [`CommandResult`].
//!
//! ## Events
//!
//! Components talk through an event bus carrying [`EditorEvent`]s, each
//! tagged with an [`EventKind`] such as `toolManager.toolActivated` or
//! `integration.ocrResultsAvailable`.

pub mod core;
pub mod event;
pub mod layout;
pub mod ocr;
pub mod tool;
pub mod translation;

// Re-export commonly used types
pub use core::{error::ToolError, geometry::Rect, image::ImageFrame};
pub use event::{EditorEvent, EventKind, JobKind};
pub use layout::{Layer, LayoutDocument, LayoutElement};
pub use ocr::{Bubble, OcrRequest, PreprocessingParams, TextBlock};
pub use tool::{
    Command, CommandResult, DEFAULT_MAX_HISTORY, HistoryStack, IMAGE_EDITOR_ID, LAYOUT_EDITOR_ID,
    TEXT_EDITOR_ID, ToolLifecycle, ToolMetadata,
};
pub use translation::{
    BatchTranslationRequest, BatchTranslationResult, ComicTermsDictionary, TranslationBlock,
    TranslationRequest, TranslationResult,
};
