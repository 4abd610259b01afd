//! Payload structs carried by [`EditorEvent`](super::EditorEvent) variants
//!
//! All payloads serialize with camelCase keys so JSONL logs and plugin
//! relays see the same field names the editors historically used.

use crate::core::geometry::Rect;
use crate::layout::LayoutElement;
use crate::ocr::{PreprocessingParams, TextBlock};
use crate::tool::{Command, CommandResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of the tool an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRef {
    pub tool_id: String,
    pub tool_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
}

impl ToolRef {
    pub fn new(tool_id: impl Into<String>, tool_type: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            tool_type: tool_type.into(),
            plugin_id: None,
        }
    }
}

/// Command lifecycle notification (executing / executed / failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandEvent {
    pub fn executing(tool_id: Option<&str>, command: &Command) -> Self {
        Self {
            tool_id: tool_id.map(str::to_string),
            command: command.clone(),
            result: None,
            error: None,
        }
    }

    pub fn executed(tool_id: Option<&str>, command: &Command, result: &CommandResult) -> Self {
        Self {
            result: Some(result.clone()),
            ..Self::executing(tool_id, command)
        }
    }

    pub fn failed(tool_id: Option<&str>, command: &Command, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::executing(tool_id, command)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub old_state: Map<String, Value>,
    pub new_state: Map<String, Value>,
    /// Keys of the patch that triggered the change
    pub changed_props: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRef {
    pub plugin_id: String,
}

impl PluginRef {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginToolRef {
    pub plugin_id: String,
    pub tool_id: String,
}

/// Image loaded or modified in the image editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Command that caused the change, e.g. `crop`
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preprocessing {
    pub image_id: String,
    pub preprocessing_params: PreprocessingParams,
}

/// Text of an OCR-bound block changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatChange {
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub formatting: Value,
}

/// New entry for the comic terms dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermAdded {
    pub source_term: String,
    pub target_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub operation: String,
    /// Top-level elements after the change
    pub layout: Vec<LayoutElement>,
}

/// A speech bubble moved or was linked to a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleChange {
    pub bubble_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub bounds: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlockResize {
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub new_bounds: Rect,
}

/// Which processing pipeline a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobKind {
    Ocr,
    Translation,
    BatchTranslation,
}

impl JobKind {
    pub fn as_str(&self) -> &str {
        match self {
            JobKind::Ocr => "ocr",
            JobKind::Translation => "translation",
            JobKind::BatchTranslation => "batchTranslation",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStarted {
    pub job_id: String,
    /// Image id for OCR jobs, text block id for translation jobs
    pub source_id: String,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub job_id: String,
    /// Percentage in `[0, 100]`
    pub progress: f64,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    pub job_id: String,
    pub source_id: String,
    pub error: String,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub image_id: String,
    pub results: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeChange {
    pub mode: String,
    pub previous_mode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayChange {
    pub show_original: bool,
    pub show_translated: bool,
}

/// Event outside the built-in set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEvent {
    #[serde(skip)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_plugin_id: Option<String>,
    pub payload: Value,
}
