//! Image editor tool
//!
//! Raster editing on a [`DrawableSurface`] created by an injected
//! [`SurfaceFactory`]. Every mutation pushes one snapshot onto the tool's
//! history and publishes `imageEditor.imageUpdated`, so each step can be
//! undone individually and the OCR integration can drop stale results.
//!
//! | Command | Parameters | History |
//! |---------|------------|---------|
//! | `image.load` | `path` \| `dataUrl` \| `width`+`height`+`rgba`, `imageId?` | reset |
//! | `image.save` | `format` (png), `quality?`, `path?` | |
//! | `image.resize` | `width`, `height`, `maintainAspectRatio` (true) | push |
//! | `image.crop` | `x`, `y`, `width`, `height` | push |
//! | `image.rotate` | `angle` | push |
//! | `image.flip` | `horizontal`, `vertical` | push |
//! | `image.applyFilter` | `filterId`, `options` | push |
//! | `image.draw` | `drawCommands` | push |
//! | `image.select` / `image.deselect` | `x`, `y`, `width`, `height` | |
//! | `image.copy` / `image.paste` | `x`, `y` | paste pushes |
//! | `image.undo` / `image.redo` | | cursor |
//! | `image.clear` | | push |

use crate::surface::codec::{self, ImageEncoding};
use crate::surface::{FilterOptions, FilterRegistry, ImageFilter};
use async_trait::async_trait;
use inkframe_application::ports::surface::{DrawOp, DrawableSurface, SurfaceFactory};
use inkframe_application::{CommandTable, Tool, ToolCore};
use inkframe_domain::event::{ImageChange, Preprocessing};
use inkframe_domain::{
    Command, CommandResult, DEFAULT_MAX_HISTORY, EditorEvent, HistoryStack, ImageFrame, ToolError,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, OnceLock};

pub use inkframe_domain::IMAGE_EDITOR_ID;

/// Largest canvas side `image.resize` accepts.
const MAX_DIMENSION: u32 = 16_384;

/// Selection or copy region in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub struct ImageEditorTool {
    core: ToolCore,
    surface_factory: Arc<dyn SurfaceFactory>,
    surface: Option<Box<dyn DrawableSurface>>,
    filters: FilterRegistry,
    history: HistoryStack<ImageFrame>,
    image_id: Option<String>,
    selection: Option<PixelRect>,
    clipboard: Option<ImageFrame>,
}

impl ImageEditorTool {
    pub fn new(surface_factory: Arc<dyn SurfaceFactory>) -> Self {
        Self {
            core: ToolCore::new(IMAGE_EDITOR_ID, "image-editor")
                .with_name("Image Editor")
                .with_description("Raster editing, filters and drawing on comic pages")
                .with_category("image")
                .with_capabilities(["image-editing", "filter-application"]),
            surface_factory,
            surface: None,
            filters: FilterRegistry::with_defaults(),
            history: HistoryStack::new(DEFAULT_MAX_HISTORY),
            image_id: None,
            selection: None,
            clipboard: None,
        }
    }

    pub fn with_max_history(mut self, max_len: usize) -> Self {
        self.history = HistoryStack::new(max_len);
        self
    }

    /// Add a filter next to the built-in ones. Returns `false` for a taken id.
    pub fn register_filter(&mut self, id: &str, filter: Arc<dyn ImageFilter>) -> bool {
        self.filters.register(id, filter)
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn current_frame(&self) -> Option<ImageFrame> {
        self.surface.as_ref().map(|s| s.snapshot())
    }

    pub fn selection(&self) -> Option<PixelRect> {
        self.selection
    }

    pub fn history(&self) -> &HistoryStack<ImageFrame> {
        &self.history
    }

    fn commands() -> &'static CommandTable<Self> {
        static TABLE: OnceLock<CommandTable<ImageEditorTool>> = OnceLock::new();
        TABLE.get_or_init(|| {
            CommandTable::new()
                .with("image.load", Self::load)
                .with("image.save", Self::save)
                .with("image.resize", Self::resize)
                .with("image.crop", Self::crop)
                .with("image.rotate", Self::rotate)
                .with("image.flip", Self::flip)
                .with("image.applyFilter", Self::apply_filter)
                .with("image.draw", Self::draw)
                .with("image.select", Self::select)
                .with("image.deselect", Self::deselect)
                .with("image.copy", Self::copy)
                .with("image.paste", Self::paste)
                .with("image.undo", Self::undo)
                .with("image.redo", Self::redo)
                .with("image.clear", Self::clear)
        })
    }

    // ==================== Helpers ====================

    fn surface(&mut self) -> Result<&mut (dyn DrawableSurface + 'static), ToolError> {
        self.surface
            .as_deref_mut()
            .ok_or_else(|| ToolError::invalid_state("No image loaded"))
    }

    fn dimensions(&self) -> (u32, u32) {
        self.surface
            .as_ref()
            .map(|s| (s.width(), s.height()))
            .unwrap_or((0, 0))
    }

    /// Round and clamp a region so it lies inside the canvas and is at least 1×1.
    fn clamp_region(&self, x: f64, y: f64, width: f64, height: f64) -> PixelRect {
        let (cw, ch) = self.dimensions();
        let x = (x.round().max(0.0) as u32).min(cw.saturating_sub(1));
        let y = (y.round().max(0.0) as u32).min(ch.saturating_sub(1));
        let width = width.round().min(cw.saturating_sub(x) as f64).max(1.0) as u32;
        let height = height.round().min(ch.saturating_sub(y) as f64).max(1.0) as u32;
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }

    fn image_change(&self, operation: &str) -> ImageChange {
        let (width, height) = self.dimensions();
        ImageChange {
            image_id: self.image_id.clone(),
            width,
            height,
            operation: operation.to_string(),
            source: None,
        }
    }

    /// Record the surface as a new history entry and announce the change.
    fn commit(&mut self, operation: &str) -> Result<(), ToolError> {
        let frame = self.surface()?.snapshot();
        self.history.push(frame);
        tracing::debug!(
            tool = %self.core.id(),
            operation,
            history = self.history.len(),
            "Image updated"
        );
        self.core
            .emit(EditorEvent::ImageUpdated(self.image_change(operation)));
        Ok(())
    }

    fn restore(&mut self, frame: ImageFrame, operation: &str) {
        let surface = self
            .surface
            .get_or_insert_with(|| self.surface_factory.create_surface(frame.width(), frame.height()));
        surface.load(&frame);
        self.selection = None;
        self.core
            .emit(EditorEvent::ImageUpdated(self.image_change(operation)));
    }

    fn history_result(&self) -> CommandResult {
        CommandResult::ok()
            .with_field("historyIndex", self.history.index().unwrap_or(0) as u64)
            .with_field("historyLength", self.history.len() as u64)
    }

    // ==================== Command handlers ====================

    fn load(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let (frame, source) = if let Some(path) = command.get_str("path") {
            (codec::decode_file(Path::new(path))?, "path")
        } else if let Some(url) = command.get_str("dataUrl") {
            (codec::decode_data_url(url)?, "dataUrl")
        } else if let Some(rgba) = command.get_str("rgba") {
            let width = command.require_f64("width")? as u32;
            let height = command.require_f64("height")? as u32;
            (codec::decode_raw_rgba(width, height, rgba)?, "rgba")
        } else {
            return Err(ToolError::invalid_argument(
                "image.load needs one of `path`, `dataUrl` or `rgba`",
            ));
        };

        let mut surface = self
            .surface_factory
            .create_surface(frame.width(), frame.height());
        surface.load(&frame);
        self.surface = Some(surface);
        self.history.reset(frame);
        self.selection = None;
        if let Some(image_id) = command.get_str("imageId") {
            self.image_id = Some(image_id.to_string());
        }

        let mut change = self.image_change("load");
        change.source = Some(source.to_string());
        tracing::info!(
            tool = %self.core.id(),
            width = change.width,
            height = change.height,
            source,
            "Image loaded"
        );
        self.core.emit(EditorEvent::ImageLoaded(change.clone()));

        let mut result = CommandResult::ok()
            .with_field("width", change.width)
            .with_field("height", change.height);
        if let Some(image_id) = &self.image_id {
            result = result.with_field("imageId", image_id.as_str());
        }
        Ok(result)
    }

    fn save(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let encoding =
            ImageEncoding::parse(command.get_str("format").unwrap_or("png"), command.get_f64("quality"))?;
        let frame = self.surface()?.snapshot();
        let bytes = codec::encode(&frame, encoding)?;

        let mut result = CommandResult::ok()
            .with_field("dataUrl", codec::to_data_url(&bytes, encoding))
            .with_field("format", encoding.name())
            .with_field("width", frame.width())
            .with_field("height", frame.height());
        if let Some(path) = command.get_str("path") {
            std::fs::write(path, &bytes)?;
            tracing::info!(path = %path, bytes = bytes.len(), "Image saved");
            result = result.with_field("path", path);
        }
        Ok(result)
    }

    fn resize(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let width = command.require_f64("width")?;
        let height = command.require_f64("height")?;
        if width <= 0.0 || height <= 0.0 {
            return Err(ToolError::invalid_argument("width and height must be positive"));
        }
        let (cw, ch) = self.dimensions();

        let (mut new_w, mut new_h) = (width.round(), height.round());
        if command.get_bool("maintainAspectRatio").unwrap_or(true) {
            let aspect = cw as f64 / ch as f64;
            if width / height > aspect {
                new_w = (height * aspect).round();
            } else {
                new_h = (width / aspect).round();
            }
        }
        if new_w > MAX_DIMENSION as f64 || new_h > MAX_DIMENSION as f64 {
            return Err(ToolError::invalid_argument(format!(
                "{}x{} exceeds the {}px size limit",
                new_w, new_h, MAX_DIMENSION
            )));
        }
        let (new_w, new_h) = (new_w.max(1.0) as u32, new_h.max(1.0) as u32);

        if (new_w, new_h) != (cw, ch) {
            self.surface()?.resize(new_w, new_h)?;
            self.commit("resize")?;
        }
        Ok(CommandResult::ok()
            .with_field("width", new_w)
            .with_field("height", new_h))
    }

    fn crop(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let region = self.clamp_region(
            command.require_f64("x")?,
            command.require_f64("y")?,
            command.require_f64("width")?,
            command.require_f64("height")?,
        );
        self.surface()?
            .crop(region.x, region.y, region.width, region.height)?;
        self.selection = None;
        self.commit("crop")?;
        Ok(CommandResult::ok()
            .with_field("x", region.x)
            .with_field("y", region.y)
            .with_field("width", region.width)
            .with_field("height", region.height))
    }

    fn rotate(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let angle = command.require_f64("angle")?;
        self.surface()?.rotate(angle)?;
        self.selection = None;
        self.commit("rotate")?;
        let (width, height) = self.dimensions();
        Ok(CommandResult::ok()
            .with_field("angle", angle)
            .with_field("width", width)
            .with_field("height", height))
    }

    fn flip(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let horizontal = command.get_bool("horizontal").unwrap_or(false);
        let vertical = command.get_bool("vertical").unwrap_or(false);
        self.surface()?.flip(horizontal, vertical);
        self.commit("flip")?;
        Ok(CommandResult::ok()
            .with_field("horizontal", horizontal)
            .with_field("vertical", vertical))
    }

    fn apply_filter(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let filter_id = command.require_str("filterId")?.to_string();
        let options: FilterOptions = command.get_as("options")?.unwrap_or_default();

        let input = self.surface()?.snapshot();
        let output = self.filters.apply(&filter_id, &input, &options)?;
        self.surface()?.load(&output);
        self.commit("applyFilter")?;

        if let Some(image_id) = &self.image_id {
            let mut params = serde_json::Map::new();
            params.insert("filterId".into(), Value::String(filter_id.clone()));
            params.insert("options".into(), Value::Object(options.clone()));
            self.core
                .emit(EditorEvent::PreprocessingApplied(Preprocessing {
                    image_id: image_id.clone(),
                    preprocessing_params: params,
                }));
        }

        Ok(CommandResult::ok()
            .with_field("filterId", filter_id)
            .with_field("options", Value::Object(options)))
    }

    fn draw(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let ops: Vec<Value> = command.require_as("drawCommands")?;
        let tool_id = self.core.id().to_string();
        let surface = self.surface()?;
        for raw in &ops {
            match serde_json::from_value::<DrawOp>(raw.clone()) {
                Ok(op) => surface.draw(&op),
                Err(e) => {
                    let op_name = raw.get("op").cloned().unwrap_or_default();
                    tracing::warn!(
                        tool = %tool_id,
                        op = %op_name,
                        error = %e,
                        "Unknown draw command skipped"
                    );
                }
            }
        }
        self.commit("draw")?;
        Ok(CommandResult::ok().with_field("commandCount", ops.len() as u64))
    }

    fn select(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let region = self.clamp_region(
            command.require_f64("x")?,
            command.require_f64("y")?,
            command.require_f64("width")?,
            command.require_f64("height")?,
        );
        self.selection = Some(region);
        Ok(CommandResult::ok().with_json("selection", &region))
    }

    fn deselect(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        self.selection = None;
        Ok(CommandResult::ok())
    }

    fn copy(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let region = self
            .selection
            .ok_or_else(|| ToolError::invalid_state("No active selection to copy"))?;
        let copied = self
            .surface()?
            .region(region.x, region.y, region.width, region.height)
            .ok_or_else(|| ToolError::invalid_state("Selection lies outside the image"))?;
        self.clipboard = Some(copied);
        Ok(CommandResult::ok()
            .with_field("width", region.width)
            .with_field("height", region.height))
    }

    fn paste(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let clipboard = self
            .clipboard
            .clone()
            .ok_or_else(|| ToolError::invalid_state("No data in clipboard to paste"))?;
        let (cw, ch) = self.dimensions();
        let x = (command.get_f64("x").unwrap_or(0.0).round().max(0.0) as u32).min(cw);
        let y = (command.get_f64("y").unwrap_or(0.0).round().max(0.0) as u32).min(ch);

        self.surface()?.blit(&clipboard, x, y);
        self.commit("paste")?;
        Ok(CommandResult::ok()
            .with_field("x", x)
            .with_field("y", y)
            .with_field("width", clipboard.width())
            .with_field("height", clipboard.height()))
    }

    fn undo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(frame) = self.history.undo().cloned() else {
            return Ok(CommandResult::failure("Nothing to undo"));
        };
        self.restore(frame, "undo");
        Ok(self.history_result())
    }

    fn redo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(frame) = self.history.redo().cloned() else {
            return Ok(CommandResult::failure("Nothing to redo"));
        };
        self.restore(frame, "redo");
        Ok(self.history_result())
    }

    fn clear(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        self.surface()?.clear();
        self.commit("clear")?;
        Ok(CommandResult::ok())
    }
}

#[async_trait]
impl Tool for ImageEditorTool {
    fn core(&self) -> &ToolCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ToolCore {
        &mut self.core
    }

    fn supports_command(&self, command_type: &str) -> bool {
        Self::commands().contains(command_type)
    }

    fn command_types(&self) -> Vec<&'static str> {
        Self::commands().command_types()
    }

    async fn handle_command(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let needs_image = !matches!(
            command.command_type.as_str(),
            "image.load" | "image.undo" | "image.redo"
        );
        if needs_image && self.surface.is_none() {
            return Err(ToolError::invalid_state(
                "No image loaded to perform the operation",
            ));
        }
        let id = self.core.id().to_string();
        Self::commands().dispatch(self, &id, command)
    }

    async fn on_dispose(&mut self) -> Result<(), ToolError> {
        self.surface = None;
        self.clipboard = None;
        self.selection = None;
        self.history.clear();
        Ok(())
    }
}

impl std::fmt::Debug for ImageEditorTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEditorTool")
            .field("id", &self.core.id())
            .field("dimensions", &self.dimensions())
            .field("image_id", &self.image_id)
            .field("history", &self.history.len())
            .field("filters", &self.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RasterSurfaceFactory;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use inkframe_application::{EventBus, Listener};
    use inkframe_domain::EventKind;
    use serde_json::json;
    use std::sync::Mutex;

    fn editor() -> ImageEditorTool {
        ImageEditorTool::new(Arc::new(RasterSurfaceFactory))
    }

    fn solid_rgba(width: u32, height: u32, rgba: [u8; 4]) -> String {
        let pixels: Vec<u8> = (0..width * height).flat_map(|_| rgba).collect();
        STANDARD.encode(pixels)
    }

    async fn loaded(width: u32, height: u32) -> ImageEditorTool {
        let mut tool = editor();
        tool.execute_command(
            &Command::new("image.load")
                .with_arg("width", width)
                .with_arg("height", height)
                .with_arg("rgba", solid_rgba(width, height, [255, 255, 255, 255]))
                .with_arg("imageId", "page-1"),
        )
        .await
        .unwrap();
        tool
    }

    fn record(bus: &EventBus, kinds: &[EventKind]) -> Arc<Mutex<Vec<EditorEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in kinds {
            let seen = seen.clone();
            bus.on(
                kind.clone(),
                Listener::sync(move |event| {
                    seen.lock().unwrap().push(event.clone());
                    Ok(())
                }),
            );
        }
        seen
    }

    #[tokio::test]
    async fn test_commands_need_an_image() {
        let mut tool = editor();
        let err = tool
            .execute_command(&Command::new("image.crop"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidState(_)));

        let undo = tool
            .execute_command(&Command::new("image.undo"))
            .await
            .unwrap();
        assert!(!undo.success);
        assert_eq!(undo.message.as_deref(), Some("Nothing to undo"));
    }

    #[tokio::test]
    async fn test_load_resets_history_and_emits() {
        let bus = EventBus::new();
        let seen = record(&bus, &[EventKind::ImageLoaded]);
        let mut tool = editor();
        tool.set_event_bus(bus);

        let result = tool
            .execute_command(
                &Command::new("image.load")
                    .with_arg("width", 4)
                    .with_arg("height", 2)
                    .with_arg("rgba", solid_rgba(4, 2, [0, 0, 0, 255]))
                    .with_arg("imageId", "page-7"),
            )
            .await
            .unwrap();

        assert_eq!(result.get_f64("width"), Some(4.0));
        assert_eq!(result.get_str("imageId"), Some("page-7"));
        assert_eq!(tool.history().len(), 1);
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload_json()["source"], "rgba");
    }

    #[tokio::test]
    async fn test_resize_keeps_aspect_ratio() {
        let mut tool = loaded(100, 50).await;
        let result = tool
            .execute_command(
                &Command::new("image.resize")
                    .with_arg("width", 40)
                    .with_arg("height", 40),
            )
            .await
            .unwrap();
        assert_eq!(result.get_f64("width"), Some(40.0));
        assert_eq!(result.get_f64("height"), Some(20.0));
        assert_eq!(tool.history().len(), 2);

        // Same size again is a no-op
        tool.execute_command(
            &Command::new("image.resize")
                .with_arg("width", 40)
                .with_arg("height", 20),
        )
        .await
        .unwrap();
        assert_eq!(tool.history().len(), 2);
    }

    #[tokio::test]
    async fn test_resize_rejects_oversized_canvas() {
        let mut tool = loaded(4, 4).await;
        let err = tool
            .execute_command(
                &Command::new("image.resize")
                    .with_arg("width", 1e12)
                    .with_arg("height", 1e12),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
        assert_eq!(tool.dimensions(), (4, 4));
        assert_eq!(tool.history().len(), 1);

        // The limit applies after the aspect fit
        let err = tool
            .execute_command(
                &Command::new("image.resize")
                    .with_arg("width", 40_000)
                    .with_arg("height", 100)
                    .with_arg("maintainAspectRatio", false),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_crop_clamps_region() {
        let mut tool = loaded(10, 10).await;
        let result = tool
            .execute_command(
                &Command::new("image.crop")
                    .with_arg("x", -3)
                    .with_arg("y", 4.4)
                    .with_arg("width", 50)
                    .with_arg("height", 3),
            )
            .await
            .unwrap();
        assert_eq!(result.get_f64("x"), Some(0.0));
        assert_eq!(result.get_f64("y"), Some(4.0));
        assert_eq!(result.get_f64("width"), Some(10.0));
        let frame = tool.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (10, 3));
    }

    #[tokio::test]
    async fn test_undo_redo_walks_snapshots() {
        let mut tool = loaded(2, 2).await;
        tool.execute_command(&Command::new("image.clear")).await.unwrap();
        assert_eq!(tool.current_frame().unwrap().pixel(0, 0), Some([0, 0, 0, 0]));

        let undo = tool
            .execute_command(&Command::new("image.undo"))
            .await
            .unwrap();
        assert!(undo.success);
        assert_eq!(undo.get_f64("historyIndex"), Some(0.0));
        assert_eq!(
            tool.current_frame().unwrap().pixel(0, 0),
            Some([255, 255, 255, 255])
        );

        let redo = tool
            .execute_command(&Command::new("image.redo"))
            .await
            .unwrap();
        assert_eq!(redo.get_f64("historyIndex"), Some(1.0));
        assert_eq!(tool.current_frame().unwrap().pixel(0, 0), Some([0, 0, 0, 0]));

        let again = tool
            .execute_command(&Command::new("image.redo"))
            .await
            .unwrap();
        assert_eq!(again.message.as_deref(), Some("Nothing to redo"));
    }

    #[tokio::test]
    async fn test_filter_emits_preprocessing_for_bound_image() {
        let bus = EventBus::new();
        let seen = record(
            &bus,
            &[EventKind::ImageUpdated, EventKind::PreprocessingApplied],
        );
        let mut tool = editor();
        tool.set_event_bus(bus);
        tool.execute_command(
            &Command::new("image.load")
                .with_arg("width", 1)
                .with_arg("height", 1)
                .with_arg("rgba", solid_rgba(1, 1, [10, 20, 30, 255]))
                .with_arg("imageId", "page-1"),
        )
        .await
        .unwrap();

        tool.execute_command(
            &Command::new("image.applyFilter")
                .with_arg("filterId", "invert")
                .with_arg("options", json!({})),
        )
        .await
        .unwrap();

        assert_eq!(
            tool.current_frame().unwrap().pixel(0, 0),
            Some([245, 235, 225, 255])
        );
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::ImageUpdated);
        assert_eq!(events[0].payload_json()["operation"], "applyFilter");
        assert_eq!(
            events[1].payload_json()["preprocessingParams"]["filterId"],
            "invert"
        );
    }

    #[tokio::test]
    async fn test_unknown_filter_is_not_found() {
        let mut tool = loaded(1, 1).await;
        let err = tool
            .execute_command(&Command::new("image.applyFilter").with_arg("filterId", "emboss"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(tool.history().len(), 1);
    }

    #[tokio::test]
    async fn test_draw_skips_unknown_ops() {
        let mut tool = loaded(4, 4).await;
        let result = tool
            .execute_command(&Command::new("image.draw").with_arg(
                "drawCommands",
                json!([
                    {"op": "setFillStyle", "color": "#ff0000"},
                    {"op": "bezierCurveTo", "cp1x": 0},
                    {"op": "fillRect", "x": 0, "y": 0, "width": 2, "height": 2}
                ]),
            ))
            .await
            .unwrap();
        assert_eq!(result.get_f64("commandCount"), Some(3.0));
        let frame = tool.current_frame().unwrap();
        assert_eq!(frame.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(3, 3), Some([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_copy_paste_requires_selection_and_clipboard() {
        let mut tool = loaded(4, 4).await;
        let err = tool
            .execute_command(&Command::new("image.copy"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidState(_)));
        let err = tool
            .execute_command(&Command::new("image.paste"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidState(_)));

        tool.execute_command(&Command::new("image.draw").with_arg(
            "drawCommands",
            json!([{"op": "fillRect", "x": 0, "y": 0, "width": 1, "height": 1}]),
        ))
        .await
        .unwrap();
        tool.execute_command(
            &Command::new("image.select")
                .with_arg("x", 0)
                .with_arg("y", 0)
                .with_arg("width", 1)
                .with_arg("height", 1),
        )
        .await
        .unwrap();
        tool.execute_command(&Command::new("image.copy")).await.unwrap();
        tool.execute_command(
            &Command::new("image.paste")
                .with_arg("x", 3)
                .with_arg("y", 3),
        )
        .await
        .unwrap();

        assert_eq!(tool.current_frame().unwrap().pixel(3, 3), Some([0, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_save_returns_png_data_url() {
        let mut tool = loaded(2, 2).await;
        let result = tool
            .execute_command(&Command::new("image.save"))
            .await
            .unwrap();
        assert_eq!(result.get_str("format"), Some("png"));
        assert!(
            result
                .get_str("dataUrl")
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
    }

    #[tokio::test]
    async fn test_dispose_releases_image() {
        let mut tool = loaded(2, 2).await;
        tool.dispose().await.unwrap();
        assert!(tool.current_frame().is_none());
        assert!(tool.history().is_empty());
    }
}
