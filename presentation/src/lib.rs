//! Presentation layer for inkframe
//!
//! This crate contains the unified editor facade with its UI state and
//! views, the JSON script runner, CLI definitions, output formatters and
//! progress rendering.

pub mod cli;
pub mod editor;
pub mod output;
pub mod progress;
pub mod script;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use editor::{
    EditorMode, EditorView, ImageSource, InterfaceError, NullView, PlainView, RecordingView,
    UiState, UnifiedEditorInterface,
};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use progress::reporter::ProgressView;
pub use script::{ScriptReport, ScriptRunner, StepOutcome, parse_script};
