//! Tool domain module
//!
//! A **tool** is the polymorphic unit of work of the editor: an image,
//! text, or layout editor that accepts [`Command`]s and answers with a
//! [`CommandResult`]. This module holds the pure data side of the tool
//! system; the orchestration (manager, registry, context) lives in the
//! application layer.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────┐
//! │ Command      │───▶│ Tool         │───▶│ CommandResult │
//! │ {type, ...}  │    │ (dispatch)   │    │ {success,...} │
//! └──────────────┘    └──────┬───────┘    └───────────────┘
//!                            │
//!                            ├─ ToolMetadata  (registry snapshot)
//!                            └─ HistoryStack  (undo / redo)
//! ```
//!
//! # Lifecycle
//!
//! | State | Reached by | Notes |
//! |-------|-----------|-------|
//! | `Created` | construction | Inert, no event bus |
//! | `Initialized` | `initialize()` | Idempotent |
//! | `Active` / `Inactive` | `activate()` / `deactivate()` | At most one active tool per manager |
//! | `Disposed` | `dispose()` | Terminal |
//!
//! # Key Types
//!
//! - [`Command`]: transient request `{type, toolId?, ...payload}`
//! - [`CommandResult`]: `{success, message?, ...fields}`
//! - [`ToolMetadata`]: immutable snapshot stored by the registry
//! - [`HistoryStack`]: bounded linear undo/redo log

pub mod entities;
pub mod history;
pub mod value_objects;

pub use entities::{ToolLifecycle, ToolMetadata};
pub use history::{DEFAULT_MAX_HISTORY, HistoryStack};
pub use value_objects::{Command, CommandResult};

/// Id of the built-in image editor.
pub const IMAGE_EDITOR_ID: &str = "image-editor";
/// Id of the built-in text editor.
pub const TEXT_EDITOR_ID: &str = "text-editor";
/// Id of the built-in layout editor.
pub const LAYOUT_EDITOR_ID: &str = "layout-editor";
