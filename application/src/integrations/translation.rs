//! Translation ↔ editor synchronization
//!
//! Translates text blocks through a [`TranslationProcessor`], answering
//! short comic sound effects from a [`ComicTermsDictionary`] first and
//! caching every result under `(text block, source language, target language)`.
//!
//! Resolution order for a single block:
//!
//! ```text
//! cache hit (unless forced) ──▶ from_cache = true
//! dictionary hit ─────────────▶ is_special_term = true, cached
//! processor ──────────────────▶ cached
//! ```
//!
//! Edits to a block's text drop its cached translations; new OCR results
//! for an image drop every translation recorded for that image.

use super::{IntegrationError, next_job_id};
use crate::events::{EventBus, HandlerError, Listener, Subscriptions};
use crate::ports::translation_processor::TranslationProcessor;
use futures::future::join_all;
use inkframe_domain::event::{JobFailure, JobStarted};
use inkframe_domain::translation::ComicTerm;
use inkframe_domain::{
    BatchTranslationRequest, BatchTranslationResult, ComicTermsDictionary, EditorEvent, EventKind,
    JobKind, TranslationRequest, TranslationResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

const COMPONENT: &str = "TranslationEditorIntegration";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text_block_id: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn of(request: &TranslationRequest) -> Self {
        Self {
            text_block_id: request.text_block_id.clone(),
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedTranslation {
    image_id: Option<String>,
    source_text: String,
    translated_text: String,
    is_special_term: bool,
}

pub struct TranslationEditorIntegration {
    processor: Arc<dyn TranslationProcessor>,
    event_bus: EventBus,
    cache: Mutex<HashMap<CacheKey, CachedTranslation>>,
    terms: RwLock<ComicTermsDictionary>,
    subscriptions: Subscriptions,
    initialized: AtomicBool,
}

impl TranslationEditorIntegration {
    pub fn new(processor: Arc<dyn TranslationProcessor>, event_bus: EventBus) -> Self {
        Self {
            processor,
            subscriptions: Subscriptions::new(event_bus.clone()),
            event_bus,
            cache: Mutex::new(HashMap::new()),
            terms: RwLock::new(ComicTermsDictionary::with_defaults()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Extend the built-in dictionary with configured terms.
    pub fn with_terms(self, terms: impl IntoIterator<Item = ComicTerm>) -> Self {
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(terms);
        self
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, CachedTranslation>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
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
        subs.add_weak(EventKind::TextUpdated, self, Self::on_text_updated);
        subs.add_weak(EventKind::TermAdded, self, Self::on_term_added);
        subs.add_weak(EventKind::TranslationStarted, self, Self::on_translation_started);
        subs.add_weak(EventKind::TranslationProgress, self, Self::on_translation_progress);
        subs.add_weak(EventKind::TranslationCompleted, self, Self::on_translation_completed);
        subs.add_weak(EventKind::TranslationFailed, self, Self::on_translation_failed);
        subs.add_weak(EventKind::TextBlockResized, self, Self::on_text_block_resized);
        subs.add_weak(EventKind::OcrResultsAvailable, self, Self::on_ocr_results);

        // Translating awaits the processor, so this one runs as a task.
        let weak: Weak<Self> = Arc::downgrade(self);
        subs.add(
            EventKind::TranslationRequested,
            Listener::future(move |event| {
                let weak = weak.clone();
                async move {
                    let (Some(this), EditorEvent::TranslationRequested(request)) =
                        (weak.upgrade(), event)
                    else {
                        return Ok(());
                    };
                    this.translate_block(request)
                        .await
                        .map(|_| ())
                        .map_err(|e| HandlerError::from(e.to_string()))
                }
            }),
        );
        tracing::info!("{}: initialized", COMPONENT);
    }

    // ==================== Event handlers ====================

    fn on_text_updated(&self, event: &EditorEvent) {
        let EditorEvent::TextUpdated(change) = event else {
            return;
        };
        let removed = self.remove_where(|key, _| key.text_block_id == change.text_block_id);
        if removed > 0 {
            tracing::debug!(
                text_block_id = %change.text_block_id,
                removed,
                "Dropped cached translations for edited block"
            );
        }
    }

    fn on_term_added(&self, event: &EditorEvent) {
        let EditorEvent::TermAdded(term) = event else {
            return;
        };
        self.add_term(&term.source_term, &term.target_term, &term.target_language);
    }

    fn on_translation_started(&self, event: &EditorEvent) {
        if let EditorEvent::TranslationStarted(job) = event {
            self.event_bus
                .emit(&EditorEvent::ProcessingStarted(job.clone()));
        }
    }

    fn on_translation_progress(&self, event: &EditorEvent) {
        if let EditorEvent::TranslationProgress(progress) = event {
            self.event_bus
                .emit(&EditorEvent::ProcessingProgress(progress.clone()));
        }
    }

    fn on_translation_completed(&self, event: &EditorEvent) {
        let EditorEvent::TranslationCompleted(result) = event else {
            return;
        };
        self.store(
            CacheKey {
                text_block_id: result.text_block_id.clone(),
                source_language: result.source_language.clone(),
                target_language: result.target_language.clone(),
            },
            CachedTranslation {
                image_id: result.image_id.clone(),
                source_text: result.source_text.clone(),
                translated_text: result.translated_text.clone(),
                is_special_term: result.is_special_term,
            },
        );
        self.event_bus
            .emit(&EditorEvent::TranslationReady(result.clone()));
    }

    fn on_translation_failed(&self, event: &EditorEvent) {
        if let EditorEvent::TranslationFailed(failure) = event {
            tracing::error!(job_id = %failure.job_id, error = %failure.error, "Translation failed");
            self.event_bus
                .emit(&EditorEvent::ProcessingFailed(failure.clone()));
        }
    }

    fn on_text_block_resized(&self, event: &EditorEvent) {
        if let EditorEvent::TextBlockResized(resize) = event {
            self.event_bus
                .emit(&EditorEvent::IntegrationTextBlockResized(resize.clone()));
        }
    }

    fn on_ocr_results(&self, event: &EditorEvent) {
        if let EditorEvent::OcrResultsAvailable(results) = event {
            self.clear_cache_for_image(&results.image_id);
        }
    }

    fn store(&self, key: CacheKey, entry: CachedTranslation) {
        self.cache().insert(key, entry);
    }

    fn remove_where(&self, mut predicate: impl FnMut(&CacheKey, &CachedTranslation) -> bool) -> usize {
        let mut cache = self.cache();
        let before = cache.len();
        cache.retain(|key, entry| !predicate(key, entry));
        before - cache.len()
    }

    // ==================== Operations ====================

    /// Translate one text block.
    ///
    /// Unless the request is silent, publishes `integration.processingStarted`
    /// followed by `integration.translationReady` or `integration.processingFailed`.
    pub async fn translate_block(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResult, IntegrationError> {
        if !self.is_initialized() {
            return Err(IntegrationError::NotInitialized(COMPONENT));
        }
        let key = CacheKey::of(&request);

        if !request.force_update {
            let cached = self.cache().get(&key).cloned();
            if let Some(cached) = cached
                && cached.source_text == request.text
            {
                tracing::debug!(text_block_id = %request.text_block_id, "Using cached translation");
                let mut result = TranslationResult::for_request(&request, cached.translated_text);
                result.from_cache = true;
                result.is_special_term = cached.is_special_term;
                self.publish_ready(&request, &result);
                return Ok(result);
            }
        }

        let special = self
            .terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(&request.text, &request.target_language)
            .map(str::to_string);
        if let Some(term) = special {
            tracing::debug!(
                text_block_id = %request.text_block_id,
                term = %term,
                "Translated from comic terms dictionary"
            );
            let mut result = TranslationResult::for_request(&request, term);
            result.is_special_term = true;
            self.store(key, Self::cache_entry(&result));
            self.publish_ready(&request, &result);
            return Ok(result);
        }

        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| next_job_id("translation"));
        if !request.silent {
            self.event_bus
                .emit(&EditorEvent::ProcessingStarted(JobStarted {
                    job_id: job_id.clone(),
                    source_id: request.text_block_id.clone(),
                    kind: JobKind::Translation,
                }));
        }

        match self.processor.translate(&request).await {
            Ok(translated) => {
                let mut result = TranslationResult::for_request(&request, translated);
                result.job_id = Some(job_id);
                self.store(key, Self::cache_entry(&result));
                self.publish_ready(&request, &result);
                Ok(result)
            }
            Err(e) => {
                tracing::error!(
                    text_block_id = %request.text_block_id,
                    error = %e,
                    "Translation failed"
                );
                if !request.silent {
                    self.event_bus
                        .emit(&EditorEvent::ProcessingFailed(JobFailure {
                            job_id,
                            source_id: request.text_block_id.clone(),
                            error: e.to_string(),
                            kind: JobKind::Translation,
                        }));
                }
                Err(e.into())
            }
        }
    }

    fn cache_entry(result: &TranslationResult) -> CachedTranslation {
        CachedTranslation {
            image_id: result.image_id.clone(),
            source_text: result.source_text.clone(),
            translated_text: result.translated_text.clone(),
            is_special_term: result.is_special_term,
        }
    }

    fn publish_ready(&self, request: &TranslationRequest, result: &TranslationResult) {
        if !request.silent {
            self.event_bus
                .emit(&EditorEvent::TranslationReady(result.clone()));
        }
    }

    /// Translate every block of a batch concurrently.
    ///
    /// Sub-requests run silently; the batch publishes a single
    /// `integration.batchTranslationReady`, or one
    /// `integration.processingFailed` naming the first failure.
    pub async fn translate_batch(
        &self,
        request: BatchTranslationRequest,
    ) -> Result<BatchTranslationResult, IntegrationError> {
        if !self.is_initialized() {
            return Err(IntegrationError::NotInitialized(COMPONENT));
        }
        let job_id = next_job_id("batch");
        let source_id = request
            .image_id
            .clone()
            .unwrap_or_else(|| job_id.clone());
        tracing::info!(job_id = %job_id, blocks = request.blocks.len(), "Starting batch translation");

        self.event_bus
            .emit(&EditorEvent::ProcessingStarted(JobStarted {
                job_id: job_id.clone(),
                source_id: source_id.clone(),
                kind: JobKind::BatchTranslation,
            }));

        let jobs = request.blocks.iter().map(|block| {
            let mut sub = TranslationRequest::new(
                &block.text_block_id,
                &block.text,
                &request.source_language,
                &request.target_language,
            )
            .silent()
            .with_job_id(format!("{}_{}", job_id, block.text_block_id));
            sub.image_id = request.image_id.clone();
            sub.force_update = request.force_update;
            self.translate_block(sub)
        });

        let outcomes = join_all(jobs).await;
        let translations = match outcomes.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(translations) => translations,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Batch translation failed");
                self.event_bus
                    .emit(&EditorEvent::ProcessingFailed(JobFailure {
                        job_id,
                        source_id,
                        error: e.to_string(),
                        kind: JobKind::BatchTranslation,
                    }));
                return Err(e);
            }
        };

        let result = BatchTranslationResult {
            job_id,
            image_id: request.image_id,
            source_language: request.source_language,
            target_language: request.target_language,
            translations,
        };
        self.event_bus
            .emit(&EditorEvent::BatchTranslationReady(result.clone()));
        Ok(result)
    }

    pub fn add_term(&self, source: &str, target: &str, language: &str) {
        tracing::debug!(source = %source, target = %target, language = %language, "Adding comic term");
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source, target, language);
    }

    pub fn term_count(&self) -> usize {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Cached translation of a block, if any.
    pub fn cached_translation(
        &self,
        text_block_id: &str,
        source_language: &str,
        target_language: &str,
    ) -> Option<String> {
        let key = CacheKey {
            text_block_id: text_block_id.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };
        self.cache()
            .get(&key)
            .map(|entry| entry.translated_text.clone())
    }

    /// Drop the translations of every block on an image. Returns how many were removed.
    pub fn clear_cache_for_image(&self, image_id: &str) -> usize {
        let removed = self.remove_where(|_, entry| entry.image_id.as_deref() == Some(image_id));
        tracing::debug!(image_id = %image_id, removed, "Cleared translation cache for image");
        removed
    }

    pub fn clear_all_cache(&self) {
        self.cache().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    pub fn dispose(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("{}: disposing", COMPONENT);
        self.subscriptions.clear();
        self.cache().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ocr_processor::ProcessingError;
    use async_trait::async_trait;
    use inkframe_domain::TranslationBlock;
    use inkframe_domain::event::{OcrResults, TermAdded, TextChange};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct UppercaseTranslator {
        calls: AtomicUsize,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl TranslationProcessor for UppercaseTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String, ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(request.text_block_id.as_str()) {
                return Err(ProcessingError::Failed("quota exceeded".into()));
            }
            Ok(request.text.to_uppercase())
        }
    }

    fn setup(processor: Arc<UppercaseTranslator>) -> (EventBus, Arc<TranslationEditorIntegration>) {
        let bus = EventBus::new();
        let integration = Arc::new(TranslationEditorIntegration::new(processor, bus.clone()));
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
    async fn test_second_request_uses_cache() {
        let processor = Arc::new(UppercaseTranslator::default());
        let (bus, integration) = setup(processor.clone());
        let ready = record(&bus, EventKind::TranslationReady);

        let request = TranslationRequest::new("b1", "hello", "en", "de");
        let first = integration.translate_block(request.clone()).await.unwrap();
        assert_eq!(first.translated_text, "HELLO");
        assert!(!first.from_cache);

        let second = integration.translate_block(request).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.translated_text, "HELLO");
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ready.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_comic_term_skips_processor() {
        let processor = Arc::new(UppercaseTranslator::default());
        let (_bus, integration) = setup(processor.clone());

        let result = integration
            .translate_block(TranslationRequest::new("b1", "POW", "en", "ru"))
            .await
            .unwrap();
        assert_eq!(result.translated_text, "БАХ");
        assert!(result.is_special_term);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(integration.cached_translation("b1", "en", "ru").as_deref(), Some("БАХ"));
    }

    #[tokio::test]
    async fn test_forced_request_bypasses_cache() {
        let processor = Arc::new(UppercaseTranslator::default());
        let (_bus, integration) = setup(processor.clone());
        let request = TranslationRequest::new("b1", "hi", "en", "de");

        integration.translate_block(request.clone()).await.unwrap();
        integration.translate_block(request.forced()).await.unwrap();
        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_publishes_processing_failed() {
        let processor = Arc::new(UppercaseTranslator {
            fail_on: Some("b1".into()),
            ..Default::default()
        });
        let (bus, integration) = setup(processor);
        let failed = record(&bus, EventKind::ProcessingFailed);

        let err = integration
            .translate_block(TranslationRequest::new("b1", "hi", "en", "de"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(failed.lock().unwrap().len(), 1);
        assert_eq!(integration.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_silent_request_publishes_nothing() {
        let (bus, integration) = setup(Arc::new(UppercaseTranslator::default()));
        let started = record(&bus, EventKind::ProcessingStarted);
        let ready = record(&bus, EventKind::TranslationReady);

        integration
            .translate_block(TranslationRequest::new("b1", "hi", "en", "de").silent())
            .await
            .unwrap();
        assert!(started.lock().unwrap().is_empty());
        assert!(ready.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_translation() {
        let processor = Arc::new(UppercaseTranslator::default());
        let (bus, integration) = setup(processor.clone());
        let batch_ready = record(&bus, EventKind::BatchTranslationReady);
        let ready = record(&bus, EventKind::TranslationReady);

        let result = integration
            .translate_batch(BatchTranslationRequest {
                image_id: Some("page-1".into()),
                blocks: vec![
                    TranslationBlock::new("b1", "hello"),
                    TranslationBlock::new("b2", "BOOM"),
                ],
                source_language: "en".into(),
                target_language: "ru".into(),
                force_update: false,
            })
            .await
            .unwrap();

        assert_eq!(result.translations.len(), 2);
        assert_eq!(result.translations[0].translated_text, "HELLO");
        assert_eq!(result.translations[1].translated_text, "БУМ");
        assert_eq!(
            result.translations[0].job_id.as_deref(),
            Some(format!("{}_b1", result.job_id).as_str())
        );
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(batch_ready.lock().unwrap().len(), 1);
        assert!(ready.lock().unwrap().is_empty());

        assert_eq!(integration.clear_cache_for_image("page-1"), 2);
        assert_eq!(integration.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_batch_failure_reports_once() {
        let processor = Arc::new(UppercaseTranslator {
            fail_on: Some("b2".into()),
            ..Default::default()
        });
        let (bus, integration) = setup(processor);
        let failed = record(&bus, EventKind::ProcessingFailed);

        let outcome = integration
            .translate_batch(BatchTranslationRequest {
                image_id: None,
                blocks: vec![TranslationBlock::new("b1", "a"), TranslationBlock::new("b2", "b")],
                source_language: "en".into(),
                target_language: "de".into(),
                force_update: false,
            })
            .await;
        assert!(outcome.is_err());

        let failed = failed.lock().unwrap();
        assert_eq!(failed.len(), 1);
        let EditorEvent::ProcessingFailed(failure) = &failed[0] else {
            panic!("unexpected event");
        };
        assert_eq!(failure.kind, JobKind::BatchTranslation);
    }

    #[tokio::test]
    async fn test_text_edit_and_new_ocr_results_invalidate() {
        let (bus, integration) = setup(Arc::new(UppercaseTranslator::default()));
        integration
            .translate_block(TranslationRequest::new("b1", "hi", "en", "de").with_image("page-1"))
            .await
            .unwrap();
        integration
            .translate_block(TranslationRequest::new("b1", "hi", "en", "fr").with_image("page-1"))
            .await
            .unwrap();
        integration
            .translate_block(TranslationRequest::new("b2", "yo", "en", "de").with_image("page-1"))
            .await
            .unwrap();

        bus.emit(&EditorEvent::TextUpdated(TextChange {
            text_block_id: "b1".into(),
            image_id: Some("page-1".into()),
            text: "hey".into(),
        }));
        assert_eq!(integration.cache_len(), 1);

        bus.emit(&EditorEvent::OcrResultsAvailable(OcrResults {
            job_id: None,
            image_id: "page-1".into(),
            results: Vec::new(),
        }));
        assert_eq!(integration.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_term_added_event_extends_dictionary() {
        let processor = Arc::new(UppercaseTranslator::default());
        let (bus, integration) = setup(processor.clone());
        bus.emit(&EditorEvent::TermAdded(TermAdded {
            source_term: "THWIP".into(),
            target_term: "ФЬЮТЬ".into(),
            source_language: Some("en".into()),
            target_language: "ru".into(),
        }));

        let result = integration
            .translate_block(TranslationRequest::new("b1", "thwip", "en", "ru"))
            .await
            .unwrap();
        assert_eq!(result.translated_text, "ФЬЮТЬ");
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translation_requested_event_is_served() {
        let (bus, integration) = setup(Arc::new(UppercaseTranslator::default()));
        bus.emit_async(&EditorEvent::TranslationRequested(TranslationRequest::new(
            "b7", "ok", "en", "de",
        )))
        .await;
        assert_eq!(integration.cached_translation("b7", "en", "de").as_deref(), Some("OK"));
    }

    #[test]
    fn test_configured_terms() {
        let integration = TranslationEditorIntegration::new(
            Arc::new(UppercaseTranslator::default()),
            EventBus::new(),
        )
        .with_terms([ComicTerm {
            source: "KRAK".into(),
            target: "КРАК".into(),
            language: "ru".into(),
        }]);
        assert_eq!(integration.term_count(), 9);
    }
}
