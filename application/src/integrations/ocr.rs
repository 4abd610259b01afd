//! OCR ↔ editor synchronization
//!
//! Keeps a per-image cache of recognition results, preprocessing
//! parameters, bubble hints and the last layout, and republishes editor
//! and processor events under the `integration.*` family.
//!
//! | Listens to | Effect | Publishes |
//! |------------|--------|-----------|
//! | `imageEditor.imageUpdated` | drops the image's cache | `integration.ocrRequireUpdate` |
//! | `imageEditor.preprocessingApplied` | stores params | `integration.preprocessingApplied` |
//! | `ocr.recognitionStarted` / `Progress` | tracks the job | `integration.processingStarted` / `Progress` |
//! | `ocr.recognitionCompleted` | caches results | `integration.ocrResultsAvailable`, `integration.layoutUpdateRequired` |
//! | `ocr.recognitionFailed` | clears the job | `integration.processingFailed` |
//! | `textEditor.textUpdated` | patches the block, marks it edited | `integration.textBlockUpdated` |
//! | `textEditor.formatUpdated` | patches formatting | `integration.formatUpdated` |
//! | `layoutEditor.bubbleUpdated` | records the bubble, links the block | `integration.bubbleUpdated` |
//! | `layoutEditor.layoutChanged` | stores the layout | `integration.layoutChanged` |

use super::{IntegrationError, next_job_id};
use crate::events::{EventBus, Subscriptions};
use crate::ports::ocr_processor::OcrProcessor;
use inkframe_domain::event::{JobFailure, JobStarted, OcrResults};
use inkframe_domain::{
    Bubble, EditorEvent, EventKind, JobKind, LayoutElement, OcrRequest, PreprocessingParams,
    TextBlock,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const COMPONENT: &str = "OcrEditorIntegration";

#[derive(Debug, Default)]
struct ImageEntry {
    results: Option<Vec<TextBlock>>,
    preprocessing_params: Option<PreprocessingParams>,
    bubbles: BTreeMap<String, Bubble>,
    layout: Option<Vec<LayoutElement>>,
}

impl ImageEntry {
    fn block_mut(&mut self, block_id: &str) -> Option<&mut TextBlock> {
        self.results
            .as_mut()
            .and_then(|blocks| blocks.iter_mut().find(|b| b.id == block_id))
    }
}

pub struct OcrEditorIntegration {
    processor: Arc<dyn OcrProcessor>,
    event_bus: EventBus,
    cache: Mutex<HashMap<String, ImageEntry>>,
    active_job: Mutex<Option<String>>,
    subscriptions: Subscriptions,
    initialized: AtomicBool,
}

impl OcrEditorIntegration {
    pub fn new(processor: Arc<dyn OcrProcessor>, event_bus: EventBus) -> Self {
        Self {
            processor,
            subscriptions: Subscriptions::new(event_bus.clone()),
            event_bus,
            cache: Mutex::new(HashMap::new()),
            active_job: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, ImageEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_active_job(&self, job_id: Option<String>) {
        *self
            .active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = job_id;
    }

    pub fn active_job(&self) -> Option<String> {
        self.active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("{}: already initialized", COMPONENT);
            return;
        }

        let subs = &self.subscriptions;
        subs.add_weak(EventKind::ImageUpdated, self, Self::on_image_updated);
        subs.add_weak(EventKind::PreprocessingApplied, self, Self::on_preprocessing_applied);
        subs.add_weak(EventKind::OcrRecognitionStarted, self, Self::on_recognition_started);
        subs.add_weak(EventKind::OcrRecognitionProgress, self, Self::on_recognition_progress);
        subs.add_weak(EventKind::OcrRecognitionCompleted, self, Self::on_recognition_completed);
        subs.add_weak(EventKind::OcrRecognitionFailed, self, Self::on_recognition_failed);
        subs.add_weak(EventKind::TextUpdated, self, Self::on_text_updated);
        subs.add_weak(EventKind::FormatUpdated, self, Self::on_format_updated);
        subs.add_weak(EventKind::BubbleUpdated, self, Self::on_bubble_updated);
        subs.add_weak(EventKind::LayoutChanged, self, Self::on_layout_changed);
        tracing::info!("{}: initialized", COMPONENT);
    }

    // ==================== Event handlers ====================

    fn on_image_updated(&self, event: &EditorEvent) {
        let EditorEvent::ImageUpdated(change) = event else {
            return;
        };
        tracing::debug!(image_id = ?change.image_id, "Image updated, dropping OCR cache");
        if let Some(image_id) = &change.image_id {
            self.cache().remove(image_id);
        }
        let mut change = change.clone();
        change.source = Some("imageEditor".to_string());
        self.event_bus.emit(&EditorEvent::OcrRequireUpdate(change));
    }

    fn on_preprocessing_applied(&self, event: &EditorEvent) {
        let EditorEvent::PreprocessingApplied(preprocessing) = event else {
            return;
        };
        self.cache()
            .entry(preprocessing.image_id.clone())
            .or_default()
            .preprocessing_params = Some(preprocessing.preprocessing_params.clone());
        self.event_bus
            .emit(&EditorEvent::IntegrationPreprocessingApplied(preprocessing.clone()));
    }

    fn on_recognition_started(&self, event: &EditorEvent) {
        let EditorEvent::OcrRecognitionStarted(job) = event else {
            return;
        };
        tracing::debug!(job_id = %job.job_id, image_id = %job.source_id, "Recognition started");
        self.set_active_job(Some(job.job_id.clone()));
        self.event_bus
            .emit(&EditorEvent::ProcessingStarted(job.clone()));
    }

    fn on_recognition_progress(&self, event: &EditorEvent) {
        let EditorEvent::OcrRecognitionProgress(progress) = event else {
            return;
        };
        self.event_bus
            .emit(&EditorEvent::ProcessingProgress(progress.clone()));
    }

    fn on_recognition_completed(&self, event: &EditorEvent) {
        let EditorEvent::OcrRecognitionCompleted(results) = event else {
            return;
        };
        tracing::debug!(
            image_id = %results.image_id,
            results = results.results.len(),
            "Recognition completed"
        );
        self.set_active_job(None);
        self.store_and_publish(results.clone());
    }

    fn on_recognition_failed(&self, event: &EditorEvent) {
        let EditorEvent::OcrRecognitionFailed(failure) = event else {
            return;
        };
        tracing::error!(job_id = %failure.job_id, error = %failure.error, "Recognition failed");
        self.set_active_job(None);
        self.event_bus
            .emit(&EditorEvent::ProcessingFailed(failure.clone()));
    }

    fn on_text_updated(&self, event: &EditorEvent) {
        let EditorEvent::TextUpdated(change) = event else {
            return;
        };
        if let Some(image_id) = &change.image_id
            && let Some(block) = self
                .cache()
                .get_mut(image_id)
                .and_then(|entry| entry.block_mut(&change.text_block_id))
        {
            block.text = change.text.clone();
            block.is_edited = true;
        }
        self.event_bus
            .emit(&EditorEvent::TextBlockUpdated(change.clone()));
    }

    fn on_format_updated(&self, event: &EditorEvent) {
        let EditorEvent::FormatUpdated(change) = event else {
            return;
        };
        if let Some(image_id) = &change.image_id
            && let Some(block) = self
                .cache()
                .get_mut(image_id)
                .and_then(|entry| entry.block_mut(&change.text_block_id))
        {
            block.formatting = Some(change.formatting.clone());
            block.is_formatted = true;
        }
        self.event_bus
            .emit(&EditorEvent::IntegrationFormatUpdated(change.clone()));
    }

    fn on_bubble_updated(&self, event: &EditorEvent) {
        let EditorEvent::BubbleUpdated(change) = event else {
            return;
        };
        if let Some(image_id) = &change.image_id {
            let mut cache = self.cache();
            let entry = cache.entry(image_id.clone()).or_default();
            entry.bubbles.insert(
                change.bubble_id.clone(),
                Bubble {
                    bubble_id: change.bubble_id.clone(),
                    bounds: change.bounds,
                    text_block_id: change.text_block_id.clone(),
                },
            );
            if let Some(block_id) = &change.text_block_id
                && let Some(block) = entry.block_mut(block_id)
            {
                block.bubble_id = Some(change.bubble_id.clone());
            }
        }
        self.event_bus
            .emit(&EditorEvent::IntegrationBubbleUpdated(change.clone()));
    }

    fn on_layout_changed(&self, event: &EditorEvent) {
        let EditorEvent::LayoutChanged(change) = event else {
            return;
        };
        if let Some(image_id) = &change.image_id
            && let Some(entry) = self.cache().get_mut(image_id)
        {
            entry.layout = Some(change.layout.clone());
        }
        self.event_bus
            .emit(&EditorEvent::IntegrationLayoutChanged(change.clone()));
    }

    fn store_and_publish(&self, results: OcrResults) {
        self.cache()
            .entry(results.image_id.clone())
            .or_default()
            .results = Some(results.results.clone());
        self.event_bus
            .emit(&EditorEvent::OcrResultsAvailable(results.clone()));
        self.event_bus
            .emit(&EditorEvent::LayoutUpdateRequired(results));
    }

    // ==================== Operations ====================

    /// Recognize the text of an image.
    ///
    /// Cached results are returned unless the request forces an update.
    /// Missing preprocessing parameters and bubble hints are filled from
    /// what the editors reported for the image.
    pub async fn perform_ocr(
        &self,
        mut request: OcrRequest,
    ) -> Result<Vec<TextBlock>, IntegrationError> {
        if !self.is_initialized() {
            return Err(IntegrationError::NotInitialized(COMPONENT));
        }
        tracing::info!(image_id = %request.image_id, "Performing OCR");

        {
            let cache = self.cache();
            if let Some(entry) = cache.get(&request.image_id) {
                if !request.force_update
                    && let Some(results) = &entry.results
                {
                    tracing::debug!(
                        image_id = %request.image_id,
                        results = results.len(),
                        "Using cached OCR results"
                    );
                    return Ok(results.clone());
                }
                if request.preprocessing_params.is_none() {
                    request.preprocessing_params = entry.preprocessing_params.clone();
                }
                if request.bubbles.is_empty() {
                    request.bubbles = entry.bubbles.values().cloned().collect();
                }
            }
        }

        let job_id = next_job_id("ocr");
        self.set_active_job(Some(job_id.clone()));
        self.event_bus
            .emit(&EditorEvent::ProcessingStarted(JobStarted {
                job_id: job_id.clone(),
                source_id: request.image_id.clone(),
                kind: JobKind::Ocr,
            }));

        let outcome = self.processor.recognize(&request).await;
        self.set_active_job(None);

        match outcome {
            Ok(results) => {
                tracing::info!(image_id = %request.image_id, blocks = results.len(), "OCR completed");
                self.store_and_publish(OcrResults {
                    job_id: Some(job_id),
                    image_id: request.image_id.clone(),
                    results: results.clone(),
                });
                Ok(results)
            }
            Err(e) => {
                tracing::error!(image_id = %request.image_id, error = %e, "OCR failed");
                self.event_bus
                    .emit(&EditorEvent::ProcessingFailed(JobFailure {
                        job_id,
                        source_id: request.image_id.clone(),
                        error: e.to_string(),
                        kind: JobKind::Ocr,
                    }));
                Err(e.into())
            }
        }
    }

    /// Adopt externally produced results for an image and hand them to the
    /// text and layout editors.
    pub fn apply_ocr_results(
        &self,
        image_id: &str,
        results: Vec<TextBlock>,
    ) -> Result<(), IntegrationError> {
        if !self.is_initialized() {
            return Err(IntegrationError::NotInitialized(COMPONENT));
        }
        tracing::info!(image_id = %image_id, blocks = results.len(), "Applying OCR results");

        self.cache().entry(image_id.to_string()).or_default().results = Some(results.clone());
        let payload = OcrResults {
            job_id: None,
            image_id: image_id.to_string(),
            results,
        };
        self.event_bus
            .emit(&EditorEvent::ApplyTextResults(payload.clone()));
        self.event_bus
            .emit(&EditorEvent::ApplyLayoutResults(payload));
        Ok(())
    }

    pub fn cached_results(&self, image_id: &str) -> Option<Vec<TextBlock>> {
        self.cache()
            .get(image_id)
            .and_then(|entry| entry.results.clone())
    }

    pub fn cached_bubbles(&self, image_id: &str) -> Vec<Bubble> {
        self.cache()
            .get(image_id)
            .map(|entry| entry.bubbles.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cached_layout(&self, image_id: &str) -> Option<Vec<LayoutElement>> {
        self.cache()
            .get(image_id)
            .and_then(|entry| entry.layout.clone())
    }

    /// Drop one image's cache, or everything when `image_id` is `None`.
    pub fn clear_cache(&self, image_id: Option<&str>) {
        match image_id {
            Some(id) => {
                tracing::debug!(image_id = %id, "Clearing OCR cache for image");
                self.cache().remove(id);
            }
            None => {
                tracing::debug!("Clearing all OCR cache");
                self.cache().clear();
            }
        }
    }

    pub fn dispose(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("{}: disposing", COMPONENT);
        self.subscriptions.clear();
        self.cache().clear();
        self.set_active_job(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Listener;
    use crate::ports::ocr_processor::ProcessingError;
    use async_trait::async_trait;
    use inkframe_domain::Rect;
    use inkframe_domain::event::{BubbleChange, ImageChange, Preprocessing, TextChange};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct StubOcr {
        calls: AtomicUsize,
        fail: bool,
        last_request: Mutex<Option<OcrRequest>>,
    }

    #[async_trait]
    impl OcrProcessor for StubOcr {
        async fn recognize(&self, request: &OcrRequest) -> Result<Vec<TextBlock>, ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.fail {
                return Err(ProcessingError::Failed("engine crashed".into()));
            }
            Ok(vec![
                TextBlock::new("b1", "HELLO", Rect::new(10.0, 10.0, 50.0, 20.0)),
                TextBlock::new("b2", "POW", Rect::new(80.0, 40.0, 30.0, 30.0)),
            ])
        }
    }

    fn setup(processor: Arc<StubOcr>) -> (EventBus, Arc<OcrEditorIntegration>) {
        let bus = EventBus::new();
        let integration = Arc::new(OcrEditorIntegration::new(processor, bus.clone()));
        integration.initialize();
        (bus, integration)
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
    async fn test_perform_ocr_caches_and_publishes() {
        let processor = Arc::new(StubOcr::default());
        let (bus, integration) = setup(processor.clone());
        let available = record(&bus, EventKind::OcrResultsAvailable);
        let layout = record(&bus, EventKind::LayoutUpdateRequired);
        let started = record(&bus, EventKind::ProcessingStarted);

        let results = integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(available.lock().unwrap().len(), 1);
        assert_eq!(layout.lock().unwrap().len(), 1);
        assert_eq!(started.lock().unwrap().len(), 1);
        assert!(integration.active_job().is_none());

        integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);

        integration
            .perform_ocr(OcrRequest::new("page-1").forced())
            .await
            .unwrap();
        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_perform_ocr_failure_emits_processing_failed() {
        let processor = Arc::new(StubOcr {
            fail: true,
            ..Default::default()
        });
        let (bus, integration) = setup(processor);
        let failed = record(&bus, EventKind::ProcessingFailed);

        let err = integration
            .perform_ocr(OcrRequest::new("page-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Processing(_)));

        let failed = failed.lock().unwrap();
        let EditorEvent::ProcessingFailed(failure) = &failed[0] else {
            panic!("unexpected event");
        };
        assert_eq!(failure.kind, JobKind::Ocr);
        assert_eq!(failure.source_id, "page-1");
        assert!(failure.error.contains("engine crashed"));
    }

    #[tokio::test]
    async fn test_cached_hints_are_forwarded() {
        let processor = Arc::new(StubOcr::default());
        let (bus, integration) = setup(processor.clone());

        let mut params = PreprocessingParams::new();
        params.insert("threshold".into(), json!(128));
        bus.emit(&EditorEvent::PreprocessingApplied(Preprocessing {
            image_id: "page-1".into(),
            preprocessing_params: params.clone(),
        }));
        bus.emit(&EditorEvent::BubbleUpdated(BubbleChange {
            bubble_id: "bubble-1".into(),
            image_id: Some("page-1".into()),
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            text_block_id: None,
        }));

        integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();
        let request = processor.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.preprocessing_params, Some(params));
        assert_eq!(request.bubbles.len(), 1);
        assert_eq!(request.language, "auto");
    }

    #[tokio::test]
    async fn test_image_update_invalidates_cache() {
        let processor = Arc::new(StubOcr::default());
        let (bus, integration) = setup(processor.clone());
        let require_update = record(&bus, EventKind::OcrRequireUpdate);

        integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();
        bus.emit(&EditorEvent::ImageUpdated(ImageChange {
            image_id: Some("page-1".into()),
            width: 100,
            height: 100,
            operation: "crop".into(),
            source: None,
        }));

        assert!(integration.cached_results("page-1").is_none());
        let events = require_update.lock().unwrap();
        let EditorEvent::OcrRequireUpdate(change) = &events[0] else {
            panic!("unexpected event");
        };
        assert_eq!(change.source.as_deref(), Some("imageEditor"));
    }

    #[tokio::test]
    async fn test_text_edit_patches_cached_block() {
        let (bus, integration) = setup(Arc::new(StubOcr::default()));
        let updated = record(&bus, EventKind::TextBlockUpdated);
        integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();

        bus.emit(&EditorEvent::TextUpdated(TextChange {
            text_block_id: "b1".into(),
            image_id: Some("page-1".into()),
            text: "HELLO THERE".into(),
        }));

        let cached = integration.cached_results("page-1").unwrap();
        assert_eq!(cached[0].text, "HELLO THERE");
        assert!(cached[0].is_edited);
        assert!(!cached[1].is_edited);
        assert_eq!(updated.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bubble_links_text_block() {
        let (bus, integration) = setup(Arc::new(StubOcr::default()));
        integration.perform_ocr(OcrRequest::new("page-1")).await.unwrap();

        bus.emit(&EditorEvent::BubbleUpdated(BubbleChange {
            bubble_id: "bubble-9".into(),
            image_id: Some("page-1".into()),
            bounds: Rect::new(5.0, 5.0, 60.0, 30.0),
            text_block_id: Some("b2".into()),
        }));

        let cached = integration.cached_results("page-1").unwrap();
        assert_eq!(cached[1].bubble_id.as_deref(), Some("bubble-9"));
        assert_eq!(integration.cached_bubbles("page-1").len(), 1);
    }

    #[test]
    fn test_apply_results_requires_initialization() {
        let integration = OcrEditorIntegration::new(Arc::new(StubOcr::default()), EventBus::new());
        assert_eq!(
            integration.apply_ocr_results("page-1", Vec::new()),
            Err(IntegrationError::NotInitialized(COMPONENT))
        );
    }

    #[tokio::test]
    async fn test_apply_results_publishes_to_editors() {
        let (bus, integration) = setup(Arc::new(StubOcr::default()));
        let text = record(&bus, EventKind::ApplyTextResults);
        let layout = record(&bus, EventKind::ApplyLayoutResults);

        let blocks = vec![TextBlock::new("b1", "HI", Rect::default())];
        integration.apply_ocr_results("page-2", blocks.clone()).unwrap();
        assert_eq!(integration.cached_results("page-2"), Some(blocks));
        assert_eq!(text.lock().unwrap().len(), 1);
        assert_eq!(layout.lock().unwrap().len(), 1);

        integration.clear_cache(Some("page-2"));
        assert!(integration.cached_results("page-2").is_none());
    }

    #[tokio::test]
    async fn test_dispose_detaches_listeners() {
        let (bus, integration) = setup(Arc::new(StubOcr::default()));
        integration.dispose();
        assert_eq!(bus.listener_count(&EventKind::ImageUpdated), 0);
        assert!(!integration.is_initialized());
    }
}
