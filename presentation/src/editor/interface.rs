//! Unified editor facade
//!
//! Front door for a comic-editing session: it owns the UI state, listens
//! to the integration and editor events, and turns user intents (load a
//! page, recognize it, translate it) into tool commands and integration
//! calls.
//!
//! ```text
//!   user intent ──▶ UnifiedEditorInterface ──▶ ToolManager      (image.load, layout.addElement)
//!                          │              └──▶ OcrEditorIntegration / TranslationEditorIntegration
//!                          ▼
//!                      UiState ──▶ EditorView::render
//!                          ▲
//!   integration.* / imageEditor.imageLoaded / textEditor.textUpdated / layoutEditor.layoutChanged
//! ```
//!
//! Long-running operations are refused while another one is in flight:
//! they return `Ok(None)` and leave the state untouched.

use super::ui_state::{EditorMode, Status, UiState};
use super::view::{EditorView, NullView};
use inkframe_application::{
    EventBus, IntegrationError, OcrEditorIntegration, SharedToolManager, Subscriptions,
    TranslationEditorIntegration,
};
use inkframe_domain::event::{DisplayChange, ModeChange};
use inkframe_domain::{
    BatchTranslationRequest, BatchTranslationResult, Command, CommandResult, EditorEvent,
    EventKind, IMAGE_EDITOR_ID, JobKind, LAYOUT_EDITOR_ID, OcrRequest, TextBlock, ToolError,
    TranslationBlock,
};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

const COMPONENT: &str = "UnifiedEditorInterface";

/// Element type of the layout bubbles created for recognized text.
pub const BUBBLE_ELEMENT_TYPE: &str = "bubble";

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("processing in progress")]
    Busy,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// Where `load_image` reads the page from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    DataUrl(String),
    /// Base64 of raw RGBA8 pixels
    Rgba {
        width: u32,
        height: u32,
        base64: String,
    },
}

impl ImageSource {
    fn to_command(&self, image_id: &str) -> Command {
        let command = Command::new("image.load")
            .for_tool(IMAGE_EDITOR_ID)
            .with_arg("imageId", image_id);
        match self {
            ImageSource::Path(path) => command.with_arg("path", path.to_string_lossy().as_ref()),
            ImageSource::DataUrl(url) => command.with_arg("dataUrl", url.as_str()),
            ImageSource::Rgba {
                width,
                height,
                base64,
            } => command
                .with_arg("rgba", base64.as_str())
                .with_arg("width", *width)
                .with_arg("height", *height),
        }
    }
}

pub struct UnifiedEditorInterface {
    event_bus: EventBus,
    tool_manager: SharedToolManager,
    ocr: Arc<OcrEditorIntegration>,
    translation: Arc<TranslationEditorIntegration>,
    view: Arc<dyn EditorView>,
    state: Mutex<UiState>,
    /// Text block ids already linked to a layout element on the current page
    linked_blocks: Mutex<HashSet<String>>,
    subscriptions: Subscriptions,
    initialized: AtomicBool,
}

impl UnifiedEditorInterface {
    pub fn new(
        event_bus: EventBus,
        tool_manager: SharedToolManager,
        ocr: Arc<OcrEditorIntegration>,
        translation: Arc<TranslationEditorIntegration>,
    ) -> Self {
        Self {
            subscriptions: Subscriptions::new(event_bus.clone()),
            event_bus,
            tool_manager,
            ocr,
            translation,
            view: Arc::new(NullView),
            state: Mutex::new(UiState::default()),
            linked_blocks: Mutex::new(HashSet::new()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn with_view(mut self, view: Arc<dyn EditorView>) -> Self {
        self.view = view;
        self
    }

    pub fn with_languages(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        {
            let mut state = self.lock_state();
            state.languages.source = source.into();
            state.languages.target = target.into();
        }
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Current UI state.
    pub fn state(&self) -> UiState {
        self.lock_state().clone()
    }

    pub fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("{}: already initialized", COMPONENT);
            return;
        }

        let subs = &self.subscriptions;
        subs.add_weak(EventKind::ProcessingStarted, self, Self::on_processing_started);
        subs.add_weak(EventKind::ProcessingProgress, self, Self::on_processing_progress);
        subs.add_weak(EventKind::ProcessingFailed, self, Self::on_processing_failed);
        subs.add_weak(EventKind::OcrResultsAvailable, self, Self::on_ocr_results);
        subs.add_weak(EventKind::TranslationReady, self, Self::on_translation_ready);
        subs.add_weak(EventKind::BatchTranslationReady, self, Self::on_batch_translation_ready);
        subs.add_weak(EventKind::ImageLoaded, self, Self::on_image_loaded);
        subs.add_weak(EventKind::TextUpdated, self, Self::on_text_updated);
        subs.add_weak(EventKind::LayoutChanged, self, Self::on_layout_changed);

        let state = self.state();
        self.view.render(&state);
        tracing::info!("{}: initialized", COMPONENT);
    }

    fn lock_state(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` and redraw. The state lock is released before rendering.
    fn update(&self, change: impl FnOnce(&mut UiState)) {
        let snapshot = {
            let mut state = self.lock_state();
            change(&mut state);
            state.clone()
        };
        self.view.render(&snapshot);
    }

    fn set_status(&self, status: Status) {
        self.update(|state| state.status = status);
    }

    // ==================== Event handlers ====================

    fn on_processing_started(&self, event: &EditorEvent) {
        let EditorEvent::ProcessingStarted(job) = event else {
            return;
        };
        tracing::debug!(job_id = %job.job_id, kind = %job.kind, "Processing started");
        let text = match job.kind {
            JobKind::Ocr => "Performing OCR...",
            JobKind::Translation | JobKind::BatchTranslation => "Translating...",
        };
        self.update(|state| {
            state.is_processing = true;
            state.progress = 0.0;
            state.status = Status::info(text);
        });
    }

    fn on_processing_progress(&self, event: &EditorEvent) {
        let EditorEvent::ProcessingProgress(job) = event else {
            return;
        };
        let progress = job.progress.clamp(0.0, 100.0);
        let text = match job.kind {
            JobKind::Ocr => format!("Performing OCR: {:.0}%", progress),
            JobKind::Translation | JobKind::BatchTranslation => {
                format!("Translating: {:.0}%", progress)
            }
        };
        self.update(|state| {
            state.progress = progress;
            state.status = Status::info(text);
        });
    }

    fn on_processing_failed(&self, event: &EditorEvent) {
        let EditorEvent::ProcessingFailed(job) = event else {
            return;
        };
        tracing::error!(job_id = %job.job_id, kind = %job.kind, error = %job.error, "Processing failed");
        let text = match job.kind {
            JobKind::Ocr => format!("OCR failed: {}", job.error),
            JobKind::Translation | JobKind::BatchTranslation => {
                format!("Translation failed: {}", job.error)
            }
        };
        self.update(|state| {
            state.is_processing = false;
            state.progress = 0.0;
            state.status = Status::error(text);
        });
    }

    fn on_ocr_results(&self, event: &EditorEvent) {
        let EditorEvent::OcrResultsAvailable(results) = event else {
            return;
        };
        let count = results.results.len();
        tracing::debug!(image_id = %results.image_id, results = count, "OCR results available");
        self.update(|state| {
            state.ocr_blocks = Some(count);
            state.finish_processing(Status::info(format!(
                "OCR completed: {} text blocks found",
                count
            )));
        });
    }

    fn on_translation_ready(&self, event: &EditorEvent) {
        let EditorEvent::TranslationReady(result) = event else {
            return;
        };
        tracing::debug!(text_block_id = %result.text_block_id, "Translation ready");
        self.update(|state| {
            if !state.batch_translation {
                state.finish_processing(Status::info("Translation completed"));
            }
        });
    }

    fn on_batch_translation_ready(&self, event: &EditorEvent) {
        let EditorEvent::BatchTranslationReady(batch) = event else {
            return;
        };
        let count = batch.translations.len();
        tracing::debug!(image_id = ?batch.image_id, translations = count, "Batch translation ready");
        self.update(|state| {
            state.batch_translation = false;
            state.translated_blocks = Some(count);
            state.finish_processing(Status::info(format!(
                "Translation completed: {} text blocks translated",
                count
            )));
        });
    }

    fn on_image_loaded(&self, event: &EditorEvent) {
        let EditorEvent::ImageLoaded(change) = event else {
            return;
        };
        tracing::debug!(
            image_id = ?change.image_id,
            width = change.width,
            height = change.height,
            "Image loaded"
        );
        self.linked_blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.update(|state| {
            if change.image_id.is_some() {
                state.current_image_id = change.image_id.clone();
            }
            state.image_info = Some(format!("{}x{}", change.width, change.height));
            state.ocr_blocks = None;
            state.translated_blocks = None;
            state.status = Status::info("Image loaded");
        });
    }

    fn on_text_updated(&self, event: &EditorEvent) {
        if let EditorEvent::TextUpdated(change) = event {
            tracing::debug!(text_block_id = %change.text_block_id, "Text updated");
            self.set_status(Status::info("Text updated"));
        }
    }

    fn on_layout_changed(&self, event: &EditorEvent) {
        let EditorEvent::LayoutChanged(change) = event else {
            return;
        };
        tracing::debug!(image_id = ?change.image_id, operation = %change.operation, "Layout changed");
        *self
            .linked_blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = change
            .layout
            .iter()
            .filter_map(|element| element.text_block_id().map(str::to_string))
            .collect();
        self.set_status(Status::info("Layout changed"));
    }

    // ==================== Operations ====================

    /// Switch the editor mode. Returns `false` when already in `mode`.
    pub fn switch_mode(&self, mode: EditorMode) -> bool {
        let previous = {
            let mut state = self.lock_state();
            if state.mode == mode {
                return false;
            }
            std::mem::replace(&mut state.mode, mode)
        };
        tracing::debug!(mode = %mode, previous = %previous, "Switched mode");
        self.event_bus.emit(&EditorEvent::UiModeChanged(ModeChange {
            mode: mode.as_str().to_string(),
            previous_mode: previous.as_str().to_string(),
        }));
        let state = self.state();
        self.view.render(&state);
        true
    }

    /// Load a page into the image editor and make it the current image.
    pub async fn load_image(
        &self,
        image_id: &str,
        source: &ImageSource,
    ) -> Result<CommandResult, InterfaceError> {
        if self.lock_state().is_processing {
            return Err(InterfaceError::Busy);
        }
        tracing::info!(image_id = %image_id, "Loading image");
        self.set_status(Status::info("Loading image..."));

        let command = source.to_command(image_id);
        let outcome = self.tool_manager.lock().await.execute_command(&command).await;
        match outcome {
            Ok(result) => {
                self.update(|state| {
                    state.current_image_id = Some(image_id.to_string());
                    state.status = Status::info("Image loaded");
                });
                Ok(result)
            }
            Err(e) => {
                tracing::error!(image_id = %image_id, error = %e, "Failed to load image");
                self.set_status(Status::error(format!("Failed to load image: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Claim the processing slot for the current image.
    fn begin(&self, batch_translation: bool) -> Option<(String, String, String)> {
        let mut state = self.lock_state();
        if state.is_processing {
            tracing::debug!("{}: operation ignored, processing in progress", COMPONENT);
            return None;
        }
        let Some(image_id) = state.current_image_id.clone() else {
            tracing::debug!("{}: operation ignored, no image loaded", COMPONENT);
            return None;
        };
        state.is_processing = true;
        state.progress = 0.0;
        state.batch_translation = batch_translation;
        Some((
            image_id,
            state.languages.source.clone(),
            state.languages.target.clone(),
        ))
    }

    fn fail(&self, prefix: &str, error: &InterfaceError) {
        tracing::error!(error = %error, "{}", prefix);
        let text = format!("{}: {}", prefix, error);
        self.update(|state| {
            state.is_processing = false;
            state.batch_translation = false;
            state.progress = 0.0;
            state.status = Status::error(text);
        });
    }

    /// Close an operation with its summary status.
    ///
    /// Cached OCR results publish nothing, and editor events raised while
    /// adding bubbles overwrite the status, so the summary is set here.
    fn finish(&self, status: Status) {
        self.update(|state| {
            state.batch_translation = false;
            state.finish_processing(status);
        });
    }

    /// Recognize the current page and add a layout bubble per new text block.
    pub async fn perform_ocr(&self) -> Result<Option<Vec<TextBlock>>, InterfaceError> {
        let Some((image_id, source, _)) = self.begin(false) else {
            return Ok(None);
        };
        match self.recognize(&image_id, &source).await {
            Ok(blocks) => {
                self.finish(Status::info(format!(
                    "OCR completed: {} text blocks found",
                    blocks.len()
                )));
                Ok(Some(blocks))
            }
            Err(e) => {
                self.fail("OCR failed", &e);
                Err(e)
            }
        }
    }

    async fn recognize(
        &self,
        image_id: &str,
        language: &str,
    ) -> Result<Vec<TextBlock>, InterfaceError> {
        tracing::info!(image_id = %image_id, language = %language, "Performing OCR");
        let request = OcrRequest::new(image_id).with_language(language);
        let blocks = self.ocr.perform_ocr(request).await?;
        self.add_bubbles(image_id, &blocks).await?;
        Ok(blocks)
    }

    async fn add_bubbles(&self, image_id: &str, blocks: &[TextBlock]) -> Result<usize, ToolError> {
        let fresh: Vec<&TextBlock> = {
            let linked = self
                .linked_blocks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            blocks
                .iter()
                .filter(|block| !linked.contains(&block.id))
                .collect()
        };
        if fresh.is_empty() {
            return Ok(0);
        }

        let mut manager = self.tool_manager.lock().await;
        for block in &fresh {
            let command = Command::new("layout.addElement")
                .for_tool(LAYOUT_EDITOR_ID)
                .with_arg("elementType", BUBBLE_ELEMENT_TYPE)
                .with_arg("imageId", image_id)
                .with_arg(
                    "properties",
                    json!({
                        "x": block.bounds.x,
                        "y": block.bounds.y,
                        "width": block.bounds.width,
                        "height": block.bounds.height,
                        "content": block.text,
                        "textBlockId": block.id,
                    }),
                );
            manager.execute_command(&command).await?;
        }
        tracing::debug!(image_id = %image_id, bubbles = fresh.len(), "Added layout bubbles");
        Ok(fresh.len())
    }

    /// Translate every recognized block of the current page as one batch.
    pub async fn perform_translation(
        &self,
    ) -> Result<Option<BatchTranslationResult>, InterfaceError> {
        let Some((image_id, source, target)) = self.begin(true) else {
            return Ok(None);
        };
        let blocks = self.ocr.cached_results(&image_id).unwrap_or_default();
        if blocks.is_empty() {
            self.update(|state| {
                state.is_processing = false;
                state.batch_translation = false;
                state.status = Status::warning("No text blocks to translate");
            });
            return Ok(None);
        }

        match self.translate(&image_id, &blocks, &source, &target).await {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                self.fail("Translation failed", &e);
                Err(e)
            }
        }
    }

    async fn translate(
        &self,
        image_id: &str,
        blocks: &[TextBlock],
        source: &str,
        target: &str,
    ) -> Result<BatchTranslationResult, InterfaceError> {
        tracing::info!(
            image_id = %image_id,
            source = %source,
            target = %target,
            blocks = blocks.len(),
            "Performing translation"
        );
        let request = BatchTranslationRequest {
            image_id: Some(image_id.to_string()),
            blocks: blocks
                .iter()
                .map(|block| TranslationBlock::new(&block.id, &block.text))
                .collect(),
            source_language: source.to_string(),
            target_language: target.to_string(),
            force_update: false,
        };
        let result = self.translation.translate_batch(request).await?;
        self.finish(Status::info(format!(
            "Translation completed: {} text blocks translated",
            result.translations.len()
        )));
        Ok(result)
    }

    /// Recognize the current page, then translate what was found.
    pub async fn perform_ocr_and_translation(
        &self,
    ) -> Result<Option<BatchTranslationResult>, InterfaceError> {
        let Some((image_id, source, target)) = self.begin(false) else {
            return Ok(None);
        };

        let outcome = async {
            let blocks = self.recognize(&image_id, &source).await?;
            self.update(|state| {
                state.is_processing = true;
                state.batch_translation = true;
            });
            self.translate(&image_id, &blocks, &source, &target).await
        }
        .await;

        match outcome {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                self.fail("OCR and translation failed", &e);
                Err(e)
            }
        }
    }

    fn publish_display(&self, change: impl FnOnce(&mut UiState)) -> DisplayChange {
        let display = {
            let mut state = self.lock_state();
            change(&mut state);
            DisplayChange {
                show_original: state.show_original,
                show_translated: state.show_translated,
            }
        };
        self.event_bus.emit(&EditorEvent::UiDisplayChanged(display));
        let state = self.state();
        self.view.render(&state);
        display
    }

    /// Show or hide the original text. Returns the new visibility.
    pub fn toggle_original(&self) -> bool {
        let visibility =
            self.publish_display(|state| state.show_original = !state.show_original);
        let shown = visibility.show_original;
        tracing::debug!(show_original = shown, "Toggled original text");
        shown
    }

    /// Show or hide the translated text. Returns the new visibility.
    pub fn toggle_translated(&self) -> bool {
        let visibility =
            self.publish_display(|state| state.show_translated = !state.show_translated);
        let shown = visibility.show_translated;
        tracing::debug!(show_translated = shown, "Toggled translated text");
        shown
    }

    pub fn dispose(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("{}: disposing", COMPONENT);
        self.subscriptions.clear();
        self.view.close();
    }
}

impl Drop for UnifiedEditorInterface {
    fn drop(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ui_state::StatusLevel;
    use crate::editor::view::RecordingView;
    use async_trait::async_trait;
    use inkframe_application::{
        EditorParams, Listener, OcrProcessor, ProcessingError, ToolManager,
        TranslationProcessor,
    };
    use inkframe_domain::{Rect, TranslationRequest};
    use inkframe_infrastructure::{PassthroughTranslator, RasterSurfaceFactory, builtin_tools};
    use std::sync::atomic::AtomicUsize;

    /// 2x2 transparent RGBA
    const BLANK_2X2: &str = "AAAAAAAAAAAAAAAAAAAAAA==";

    struct CountingOcr {
        blocks: Vec<TextBlock>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl OcrProcessor for CountingOcr {
        async fn recognize(&self, _request: &OcrRequest) -> Result<Vec<TextBlock>, ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProcessingError::Failed("engine offline".into()));
            }
            Ok(self.blocks.clone())
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl TranslationProcessor for FailingTranslator {
        async fn translate(&self, _request: &TranslationRequest) -> Result<String, ProcessingError> {
            Err(ProcessingError::Unavailable("no network".into()))
        }
    }

    struct Session {
        bus: EventBus,
        manager: SharedToolManager,
        ocr: Arc<OcrEditorIntegration>,
        ocr_engine: Arc<CountingOcr>,
        view: Arc<RecordingView>,
        editor: Arc<UnifiedEditorInterface>,
    }

    fn blocks() -> Vec<TextBlock> {
        vec![
            TextBlock::new("b1", "Hello", Rect::new(10.0, 10.0, 80.0, 30.0)),
            TextBlock::new("b2", "POW", Rect::new(120.0, 40.0, 60.0, 30.0)),
        ]
    }

    fn session_with(
        ocr_engine: CountingOcr,
        translator: Arc<dyn TranslationProcessor>,
    ) -> Session {
        let bus = EventBus::new();
        let mut manager = ToolManager::new(bus.clone());
        for tool in builtin_tools(&EditorParams::default(), Arc::new(RasterSurfaceFactory), None) {
            assert!(manager.register_tool(tool));
        }
        let manager = manager.into_shared();

        let ocr_engine = Arc::new(ocr_engine);
        let ocr = Arc::new(OcrEditorIntegration::new(ocr_engine.clone(), bus.clone()));
        ocr.initialize();
        let translation = Arc::new(TranslationEditorIntegration::new(translator, bus.clone()));
        translation.initialize();

        let view = Arc::new(RecordingView::new());
        let editor = Arc::new(
            UnifiedEditorInterface::new(bus.clone(), manager.clone(), ocr.clone(), translation)
                .with_view(view.clone())
                .with_languages("en", "ru"),
        );
        editor.initialize();

        Session {
            bus,
            manager,
            ocr,
            ocr_engine,
            view,
            editor,
        }
    }

    fn session() -> Session {
        session_with(
            CountingOcr {
                blocks: blocks(),
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Arc::new(PassthroughTranslator::tagged()),
        )
    }

    fn blank_page() -> ImageSource {
        ImageSource::Rgba {
            width: 2,
            height: 2,
            base64: BLANK_2X2.to_string(),
        }
    }

    fn record(bus: &EventBus, kind: EventKind) -> Arc<Mutex<Vec<EditorEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.on(
            kind,
            Listener::sync(move |event| {
                sink.lock().unwrap().push(event.clone());
                Ok(())
            }),
        );
        seen
    }

    #[tokio::test]
    async fn test_load_image_sets_current_image() {
        let s = session();
        let result = s.editor.load_image("page-1", &blank_page()).await.unwrap();
        assert!(result.success);

        let state = s.editor.state();
        assert_eq!(state.current_image_id.as_deref(), Some("page-1"));
        assert_eq!(state.image_info.as_deref(), Some("2x2"));
        assert_eq!(state.status.text, "Image loaded");
        assert!(s.view.statuses().contains(&"Loading image...".to_string()));
    }

    #[tokio::test]
    async fn test_load_image_failure_reports_error() {
        let s = session();
        let source = ImageSource::Path(PathBuf::from("/definitely/missing/page.png"));
        let err = s.editor.load_image("page-1", &source).await.unwrap_err();
        assert!(matches!(err, InterfaceError::Tool(_)));

        let state = s.editor.state();
        assert_eq!(state.status.level, StatusLevel::Error);
        assert!(state.status.text.starts_with("Failed to load image"));
        assert!(state.current_image_id.is_none());
    }

    #[tokio::test]
    async fn test_perform_ocr_without_image_is_ignored() {
        let s = session();
        assert!(s.editor.perform_ocr().await.unwrap().is_none());
        assert_eq!(s.ocr_engine.calls.load(Ordering::SeqCst), 0);
        assert!(!s.editor.state().is_processing);
    }

    #[tokio::test]
    async fn test_perform_ocr_creates_layout_bubbles_once() {
        let s = session();
        s.editor.load_image("page-1", &blank_page()).await.unwrap();

        let found = s.editor.perform_ocr().await.unwrap().unwrap();
        assert_eq!(found.len(), 2);
        let state = s.editor.state();
        assert!(!state.is_processing);
        assert_eq!(state.progress, 100.0);
        assert_eq!(state.ocr_blocks, Some(2));
        assert_eq!(state.status.text, "OCR completed: 2 text blocks found");
        assert!(s.view.statuses().contains(&"Performing OCR...".to_string()));

        let layout = s.ocr.cached_layout("page-1").unwrap();
        let mut linked: Vec<_> = layout.iter().filter_map(|e| e.text_block_id()).collect();
        linked.sort();
        assert_eq!(linked, vec!["b1", "b2"]);
        assert!(layout.iter().all(|e| e.element_type == BUBBLE_ELEMENT_TYPE));

        // second run hits the OCR cache and adds no duplicate bubbles
        s.editor.perform_ocr().await.unwrap().unwrap();
        assert_eq!(s.ocr_engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.ocr.cached_layout("page-1").unwrap().len(), 2);
        assert!(!s.editor.state().is_processing);
    }

    #[tokio::test]
    async fn test_editor_commands_reach_their_tools_while_another_is_active() {
        let s = session();
        assert!(
            s.manager
                .lock()
                .await
                .activate_tool(inkframe_domain::TEXT_EDITOR_ID)
                .await
        );

        s.editor.load_image("page-1", &blank_page()).await.unwrap();
        let found = s.editor.perform_ocr().await.unwrap().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(s.ocr.cached_layout("page-1").unwrap().len(), 2);
        assert_eq!(
            s.manager.lock().await.active_tool_id(),
            Some(inkframe_domain::TEXT_EDITOR_ID)
        );
    }

    #[tokio::test]
    async fn test_perform_ocr_failure_sets_error_status() {
        let s = session_with(
            CountingOcr {
                blocks: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Arc::new(PassthroughTranslator::new()),
        );
        s.editor.load_image("page-1", &blank_page()).await.unwrap();

        let err = s.editor.perform_ocr().await.unwrap_err();
        assert!(matches!(err, InterfaceError::Integration(_)));
        let state = s.editor.state();
        assert!(!state.is_processing);
        assert_eq!(state.status.level, StatusLevel::Error);
        assert!(state.status.text.starts_with("OCR failed"));
    }

    #[tokio::test]
    async fn test_perform_translation_needs_recognized_blocks() {
        let s = session();
        s.editor.load_image("page-1", &blank_page()).await.unwrap();

        assert!(s.editor.perform_translation().await.unwrap().is_none());
        let state = s.editor.state();
        assert_eq!(state.status.level, StatusLevel::Warning);
        assert!(!state.is_processing && !state.batch_translation);
    }

    #[tokio::test]
    async fn test_perform_ocr_and_translation() {
        let s = session();
        let batches = record(&s.bus, EventKind::BatchTranslationReady);
        s.editor.load_image("page-1", &blank_page()).await.unwrap();

        let result = s.editor.perform_ocr_and_translation().await.unwrap().unwrap();
        assert_eq!(result.translations.len(), 2);
        let pow = result
            .translations
            .iter()
            .find(|t| t.text_block_id == "b2")
            .unwrap();
        assert_eq!(pow.translated_text, "БАХ");
        assert!(pow.is_special_term);
        let hello = result
            .translations
            .iter()
            .find(|t| t.text_block_id == "b1")
            .unwrap();
        assert_eq!(hello.translated_text, "[ru] Hello");

        assert_eq!(batches.lock().unwrap().len(), 1);
        let state = s.editor.state();
        assert!(!state.is_processing && !state.batch_translation);
        assert_eq!(state.translated_blocks, Some(2));
        assert_eq!(
            state.status.text,
            "Translation completed: 2 text blocks translated"
        );
    }

    #[tokio::test]
    async fn test_translation_failure_clears_batch_flag() {
        let s = session_with(
            CountingOcr {
                blocks: blocks(),
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Arc::new(FailingTranslator),
        );
        s.editor.load_image("page-1", &blank_page()).await.unwrap();
        s.editor.perform_ocr().await.unwrap();

        let err = s.editor.perform_translation().await.unwrap_err();
        assert!(matches!(err, InterfaceError::Integration(_)));
        let state = s.editor.state();
        assert!(!state.is_processing && !state.batch_translation);
        assert_eq!(state.status.level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_operations_ignored_while_processing() {
        let s = session();
        s.editor.load_image("page-1", &blank_page()).await.unwrap();
        s.bus.emit(&EditorEvent::ProcessingStarted(
            inkframe_domain::event::JobStarted {
                job_id: "ocr_1".into(),
                source_id: "page-1".into(),
                kind: JobKind::Ocr,
            },
        ));
        assert!(s.editor.state().is_processing);

        assert!(s.editor.perform_ocr().await.unwrap().is_none());
        assert!(s.editor.perform_ocr_and_translation().await.unwrap().is_none());
        assert!(matches!(
            s.editor.load_image("page-2", &blank_page()).await,
            Err(InterfaceError::Busy)
        ));
        assert_eq!(s.ocr_engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_progress_events_update_state() {
        let s = session();
        s.bus.emit(&EditorEvent::ProcessingProgress(
            inkframe_domain::event::JobProgress {
                job_id: "translation_1".into(),
                progress: 40.0,
                kind: JobKind::Translation,
            },
        ));
        let state = s.editor.state();
        assert_eq!(state.progress, 40.0);
        assert_eq!(state.status.text, "Translating: 40%");
    }

    #[tokio::test]
    async fn test_switch_mode_emits_once() {
        let s = session();
        let seen = record(&s.bus, EventKind::UiModeChanged);

        assert!(s.editor.switch_mode(EditorMode::Translation));
        assert!(!s.editor.switch_mode(EditorMode::Translation));
        assert_eq!(s.editor.state().mode, EditorMode::Translation);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            EditorEvent::UiModeChanged(ModeChange {
                mode: "translation".into(),
                previous_mode: "ocr".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_toggles_publish_display_state() {
        let s = session();
        let seen = record(&s.bus, EventKind::UiDisplayChanged);

        assert!(!s.editor.toggle_original());
        assert!(!s.editor.toggle_translated());
        assert!(s.editor.toggle_original());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[1],
            EditorEvent::UiDisplayChanged(DisplayChange {
                show_original: false,
                show_translated: false,
            })
        );
    }

    #[tokio::test]
    async fn test_dispose_detaches_listeners() {
        let s = session();
        s.editor.dispose();
        assert!(!s.editor.is_initialized());
        assert!(s.view.is_closed());

        let frames = s.view.frames().len();
        s.manager
            .lock()
            .await
            .execute_command(&blank_page().to_command("page-9"))
            .await
            .unwrap();
        assert_eq!(s.view.frames().len(), frames);
        assert!(s.editor.state().current_image_id.is_none());
    }
}
