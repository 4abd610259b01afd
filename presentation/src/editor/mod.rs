//! Unified editor facade, its UI state and rendering targets

pub mod interface;
pub mod ui_state;
pub mod view;

pub use interface::{BUBBLE_ELEMENT_TYPE, ImageSource, InterfaceError, UnifiedEditorInterface};
pub use ui_state::{EditorMode, Languages, Status, StatusLevel, UiState};
pub use view::{EditorView, NullView, PlainView, RecordingView};
