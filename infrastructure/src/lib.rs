//! Infrastructure layer for inkframe
//!
//! This crate contains the adapters behind the application ports and the
//! concrete editor tools:
//!
//! - [`tools`]: image, text and layout editor tools
//! - [`surface`]: `image`-backed drawing surface, codecs and filters
//! - [`processors`]: offline OCR and translation adapters
//! - [`spelling`]: word-list spell checker
//! - [`config`]: figment-based configuration loading
//! - [`logging`]: JSONL event log

pub mod config;
pub mod logging;
pub mod processors;
pub mod spelling;
pub mod surface;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOcrConfig, FileOutputConfig,
    FileOutputFormat, FileTranslationConfig,
};
pub use logging::JsonlEventLogger;
pub use processors::{FixtureOcrProcessor, PassthroughTranslator};
pub use spelling::DictionarySpellChecker;
pub use surface::{RasterSurface, RasterSurfaceFactory};
pub use tools::{ImageEditorTool, LayoutEditorTool, TextEditorTool, builtin_tools};
