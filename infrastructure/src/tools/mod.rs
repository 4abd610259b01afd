//! Editor tool implementations
//!
//! The three built-in tools, each driven by `image.*`, `text.*` or
//! `layout.*` commands through the [`ToolManager`](inkframe_application::ToolManager):
//!
//! - [`ImageEditorTool`]: raster edits, filters and drawing
//! - [`TextEditorTool`]: bubble text editing, formats and spelling
//! - [`LayoutEditorTool`]: layers, bubbles and element arrangement

pub mod image_editor;
pub mod layout_editor;
pub mod text_editor;
pub mod text_format;

pub use image_editor::{IMAGE_EDITOR_ID, ImageEditorTool, PixelRect};
pub use layout_editor::{LAYOUT_EDITOR_ID, LayoutEditorTool};
pub use text_editor::{TEXT_EDITOR_ID, TextEditorTool, TextSelection};
pub use text_format::{StylePatch, TextFormat, TextStyle};

use inkframe_application::{EditorParams, SpellChecker, SurfaceFactory, Tool};
use std::sync::Arc;

/// Build the built-in tools configured from session parameters.
///
/// Tools are returned in registration order: image, text, layout.
pub fn builtin_tools(
    params: &EditorParams,
    surfaces: Arc<dyn SurfaceFactory>,
    spell_checker: Option<Arc<dyn SpellChecker>>,
) -> Vec<Box<dyn Tool>> {
    let image = ImageEditorTool::new(surfaces).with_max_history(params.max_history_length);

    let style = TextStyle {
        font_family: params.default_font_family.clone(),
        font_size: params.default_font_size,
        text_color: params.default_color.clone(),
        ..TextStyle::default()
    };
    let mut text = TextEditorTool::new()
        .with_style(style)
        .with_max_history(params.max_history_length);
    if let Some(checker) = spell_checker {
        text = text.with_spell_checker(checker);
    }

    let layout = LayoutEditorTool::new()
        .with_max_history(params.max_history_length)
        .with_grid(params.grid_size, params.snap_to_grid);

    vec![Box::new(image), Box::new(text), Box::new(layout)]
}
