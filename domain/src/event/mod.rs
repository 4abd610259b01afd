//! Editor events
//!
//! Every notification on the event bus is an [`EditorEvent`]: a typed
//! payload whose variant determines its [`EventKind`]. Subscriptions are
//! keyed by kind, so the payload shape for each kind is fixed at compile
//! time while publish/subscribe stays loosely coupled.
//!
//! # Naming
//!
//! Kinds render as `<component>.<verb>` with a `.` separator everywhere.
//! Older consumers used `:` for the integration, editor, OCR, translation
//! and UI families, and bare camelCase for plugin lifecycle. Parsing with
//! [`EventKind::parse`] accepts both spellings:
//!
//! | Historical name | Kind |
//! |-----------------|------|
//! | `integration:ocrResultsAvailable` | `integration.ocrResultsAvailable` |
//! | `imageEditor:imageUpdated` | `imageEditor.imageUpdated` |
//! | `ocr:recognitionCompleted` | `ocr.recognitionCompleted` |
//! | `pluginActivated` | `plugin.activated` |
//!
//! Names that are not built in become [`EventKind::Custom`].

mod kind;
pub mod payload;

pub use payload::*;

use crate::tool::ToolMetadata;
use crate::translation::{BatchTranslationResult, TranslationRequest, TranslationResult};
use serde::Serialize;

macro_rules! editor_events {
    ($( $(#[$doc:meta])* $variant:ident($payload:ty) => $name:literal, )*) => {
        /// Discriminant of [`EditorEvent`], used as the subscription key.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventKind {
            $( $(#[$doc])* $variant, )*
            /// Event name outside the built-in set (plugin relays)
            Custom(String),
        }

        /// A typed event published on the bus.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum EditorEvent {
            $( $variant($payload), )*
            Custom(CustomEvent),
        }

        impl EventKind {
            /// Canonical `.`-separated name.
            pub fn as_str(&self) -> &str {
                match self {
                    $( EventKind::$variant => $name, )*
                    EventKind::Custom(name) => name,
                }
            }

            fn from_builtin(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(EventKind::$variant), )*
                    _ => None,
                }
            }

            /// Every built-in kind, in declaration order.
            pub fn builtin() -> Vec<EventKind> {
                vec![$( EventKind::$variant, )*]
            }
        }

        impl EditorEvent {
            pub fn kind(&self) -> EventKind {
                match self {
                    $( EditorEvent::$variant(_) => EventKind::$variant, )*
                    EditorEvent::Custom(c) => EventKind::Custom(c.name.clone()),
                }
            }
        }
    };
}

editor_events! {
    ToolInitialized(ToolRef) => "tool.initialized",
    ToolActivated(ToolRef) => "tool.activated",
    ToolDeactivated(ToolRef) => "tool.deactivated",
    ToolDisposed(ToolRef) => "tool.disposed",
    ToolCommandExecuting(CommandEvent) => "tool.commandExecuting",
    ToolCommandExecuted(CommandEvent) => "tool.commandExecuted",
    ToolCommandFailed(CommandEvent) => "tool.commandFailed",

    ManagerInitialized(()) => "toolManager.initialized",
    ManagerToolRegistered(ToolRef) => "toolManager.toolRegistered",
    ManagerToolUnregistered(ToolRef) => "toolManager.toolUnregistered",
    ManagerToolActivated(ToolRef) => "toolManager.toolActivated",
    ManagerToolDeactivated(ToolRef) => "toolManager.toolDeactivated",
    ManagerCommandExecuting(CommandEvent) => "toolManager.commandExecuting",
    ManagerCommandExecuted(CommandEvent) => "toolManager.commandExecuted",
    ManagerCommandFailed(CommandEvent) => "toolManager.commandFailed",
    ManagerDisposed(()) => "toolManager.disposed",

    RegistryInitialized(()) => "toolRegistry.initialized",
    RegistryToolRegistered(ToolMetadata) => "toolRegistry.toolRegistered",
    RegistryToolUnregistered(ToolRef) => "toolRegistry.toolUnregistered",
    RegistryDisposed(()) => "toolRegistry.disposed",

    ContextStateChanged(StateChange) => "toolContext.stateChanged",
    ContextServiceRegistered(ServiceRef) => "toolContext.serviceRegistered",
    ContextServiceUnregistered(ServiceRef) => "toolContext.serviceUnregistered",

    IntegrationToolRegistered(PluginToolRef) => "toolIntegration.toolRegistered",
    IntegrationToolUnregistered(PluginToolRef) => "toolIntegration.toolUnregistered",

    PluginActivated(PluginRef) => "plugin.activated",
    PluginDeactivated(PluginRef) => "plugin.deactivated",
    PluginUninstalled(PluginRef) => "plugin.uninstalled",

    ImageLoaded(ImageChange) => "imageEditor.imageLoaded",
    ImageUpdated(ImageChange) => "imageEditor.imageUpdated",
    PreprocessingApplied(Preprocessing) => "imageEditor.preprocessingApplied",

    TextUpdated(TextChange) => "textEditor.textUpdated",
    FormatUpdated(FormatChange) => "textEditor.formatUpdated",
    TranslationRequested(TranslationRequest) => "textEditor.translationRequested",
    TermAdded(TermAdded) => "textEditor.termAdded",

    LayoutChanged(LayoutChange) => "layoutEditor.layoutChanged",
    BubbleUpdated(BubbleChange) => "layoutEditor.bubbleUpdated",
    TextBlockResized(TextBlockResize) => "layoutEditor.textBlockResized",

    OcrRecognitionStarted(JobStarted) => "ocr.recognitionStarted",
    OcrRecognitionProgress(JobProgress) => "ocr.recognitionProgress",
    OcrRecognitionCompleted(OcrResults) => "ocr.recognitionCompleted",
    OcrRecognitionFailed(JobFailure) => "ocr.recognitionFailed",

    TranslationStarted(JobStarted) => "translation.started",
    TranslationProgress(JobProgress) => "translation.progress",
    TranslationCompleted(TranslationResult) => "translation.completed",
    TranslationFailed(JobFailure) => "translation.failed",

    ProcessingStarted(JobStarted) => "integration.processingStarted",
    ProcessingProgress(JobProgress) => "integration.processingProgress",
    ProcessingFailed(JobFailure) => "integration.processingFailed",
    OcrResultsAvailable(OcrResults) => "integration.ocrResultsAvailable",
    LayoutUpdateRequired(OcrResults) => "integration.layoutUpdateRequired",
    OcrRequireUpdate(ImageChange) => "integration.ocrRequireUpdate",
    IntegrationPreprocessingApplied(Preprocessing) => "integration.preprocessingApplied",
    TextBlockUpdated(TextChange) => "integration.textBlockUpdated",
    IntegrationFormatUpdated(FormatChange) => "integration.formatUpdated",
    IntegrationBubbleUpdated(BubbleChange) => "integration.bubbleUpdated",
    IntegrationLayoutChanged(LayoutChange) => "integration.layoutChanged",
    ApplyTextResults(OcrResults) => "integration.applyTextResults",
    ApplyLayoutResults(OcrResults) => "integration.applyLayoutResults",
    TranslationReady(TranslationResult) => "integration.translationReady",
    BatchTranslationReady(BatchTranslationResult) => "integration.batchTranslationReady",
    IntegrationTextBlockResized(TextBlockResize) => "integration.textBlockResized",

    UiModeChanged(ModeChange) => "ui.modeChanged",
    UiDisplayChanged(DisplayChange) => "ui.displayChanged",
}

impl EditorEvent {
    /// Free-form event, e.g. one relayed from a plugin.
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        EditorEvent::Custom(CustomEvent {
            name: name.into(),
            source_plugin_id: None,
            payload,
        })
    }

    /// Payload as JSON, for logging sinks.
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
