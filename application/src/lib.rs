//! Application layer for inkframe
//!
//! This crate contains the tool orchestration core, the event bus, the
//! plugin bridge, the OCR/translation integrations and the port definitions
//! that infrastructure adapters implement. It depends only on the domain layer.
//!
//! ```text
//!                    ┌──────────────┐
//!                    │   EventBus   │◀──────────── every component
//!                    └──────┬───────┘
//!         ┌─────────────────┼──────────────────┐
//!         ▼                 ▼                  ▼
//!   ToolRegistry       ToolContext        ToolManager ──▶ Box<dyn Tool>
//!         ▲                 ▲                  ▲
//!         └──────── ToolIntegration ───────────┘   (plugin tools)
//!
//!   OcrEditorIntegration ──▶ OcrProcessor          (port)
//!   TranslationEditorIntegration ──▶ TranslationProcessor (port)
//! ```

pub mod config;
pub mod events;
pub mod integrations;
pub mod plugins;
pub mod ports;
pub mod tools;

// Re-export commonly used types
pub use config::EditorParams;
pub use events::{EventBus, HandlerError, Listener, Subscriptions};
pub use integrations::{IntegrationError, OcrEditorIntegration, TranslationEditorIntegration};
pub use plugins::{InMemoryPluginHost, PluginHost, PluginManifest, PluginToolApi, ToolIntegration, ToolPlugin};
pub use ports::{
    event_logger::{EditorEventLogger, EventRecord, NoEventLogger, attach_event_logger},
    ocr_processor::{OcrProcessor, ProcessingError},
    spell_checker::{SpellChecker, SpellingIssue},
    surface::{DrawOp, DrawableSurface, SurfaceFactory},
    translation_processor::TranslationProcessor,
};
pub use tools::{
    ChildContextOptions, CommandHandler, CommandTable, DependencyCheck, RegistryStats,
    SharedToolManager, Tool, ToolContext, ToolCore, ToolManager, ToolRegistry,
};
