//! Runs a JSON command script against a wired editor session
//!
//! A script is a JSON array of command objects. `ui.*` entries drive the
//! [`UnifiedEditorInterface`]; everything else is routed through the tool
//! manager exactly as a host application would send it.
//!
//! | Step | Effect |
//! |------|--------|
//! | `ui.loadImage` `{imageId, path \| dataUrl}` | [`UnifiedEditorInterface::load_image`] |
//! | `ui.performOcr` | [`UnifiedEditorInterface::perform_ocr`] |
//! | `ui.performTranslation` | [`UnifiedEditorInterface::perform_translation`] |
//! | `ui.performOcrAndTranslation` | [`UnifiedEditorInterface::perform_ocr_and_translation`] |
//! | `ui.switchMode` `{mode}` | [`UnifiedEditorInterface::switch_mode`] |
//! | `ui.toggleOriginal` / `ui.toggleTranslated` | display toggles |
//! | `ui.state` | current UI state |
//! | anything else | `ToolManager::execute_command` |

use crate::editor::{EditorMode, ImageSource, InterfaceError, UnifiedEditorInterface};
use inkframe_application::SharedToolManager;
use inkframe_domain::{Command, CommandResult, ToolError};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of one script step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub command_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.result.as_ref().is_some_and(|r| r.success)
    }
}

/// All step outcomes of a script, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptReport {
    pub steps: Vec<StepOutcome>,
}

impl ScriptReport {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.succeeded()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Parse a script body into commands.
pub fn parse_script(source: &str) -> Result<Vec<Command>, ToolError> {
    let value: Value = serde_json::from_str(source)
        .map_err(|e| ToolError::InvalidCommand(format!("script is not valid JSON: {}", e)))?;
    let Value::Array(entries) = value else {
        return Err(ToolError::InvalidCommand(
            "script must be a JSON array of commands".into(),
        ));
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            Command::from_value(entry).map_err(|e| {
                ToolError::InvalidCommand(format!("step {}: {}", index + 1, e))
            })
        })
        .collect()
}

pub struct ScriptRunner {
    editor: Arc<UnifiedEditorInterface>,
    tool_manager: SharedToolManager,
    stop_on_error: bool,
}

impl ScriptRunner {
    pub fn new(editor: Arc<UnifiedEditorInterface>, tool_manager: SharedToolManager) -> Self {
        Self {
            editor,
            tool_manager,
            stop_on_error: false,
        }
    }

    /// Stop at the first failing step instead of running the rest.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub async fn run(&self, commands: &[Command]) -> ScriptReport {
        let mut report = ScriptReport::default();
        for (index, command) in commands.iter().enumerate() {
            tracing::debug!(step = index + 1, command = %command.command_type, "Running script step");
            let outcome = match self.run_step(command).await {
                Ok(result) => StepOutcome {
                    index: index + 1,
                    command_type: command.command_type.clone(),
                    result: Some(result),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(step = index + 1, command = %command.command_type, error = %e, "Script step failed");
                    StepOutcome {
                        index: index + 1,
                        command_type: command.command_type.clone(),
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            let failed = !outcome.succeeded();
            report.steps.push(outcome);
            if failed && self.stop_on_error {
                tracing::info!(step = index + 1, "Stopping script after failed step");
                break;
            }
        }
        report
    }

    async fn run_step(&self, command: &Command) -> Result<CommandResult, InterfaceError> {
        let editor = &self.editor;
        match command.command_type.as_str() {
            "ui.loadImage" => {
                let image_id = command.require_str("imageId")?;
                let source = image_source(command)?;
                editor.load_image(image_id, &source).await
            }
            "ui.performOcr" => Ok(match editor.perform_ocr().await? {
                Some(blocks) => CommandResult::ok()
                    .with_field("count", blocks.len())
                    .with_json("results", &blocks),
                None => ignored(),
            }),
            "ui.performTranslation" => Ok(match editor.perform_translation().await? {
                Some(batch) => CommandResult::ok().with_json("translations", &batch.translations),
                None => ignored(),
            }),
            "ui.performOcrAndTranslation" => {
                Ok(match editor.perform_ocr_and_translation().await? {
                    Some(batch) => {
                        CommandResult::ok().with_json("translations", &batch.translations)
                    }
                    None => ignored(),
                })
            }
            "ui.switchMode" => {
                let name = command.require_str("mode")?;
                let mode = EditorMode::parse(name).ok_or_else(|| {
                    ToolError::invalid_argument(format!("unknown mode `{}`", name))
                })?;
                let changed = editor.switch_mode(mode);
                Ok(CommandResult::ok()
                    .with_field("mode", mode.as_str())
                    .with_field("changed", changed))
            }
            "ui.toggleOriginal" => {
                Ok(CommandResult::ok().with_field("showOriginal", editor.toggle_original()))
            }
            "ui.toggleTranslated" => {
                Ok(CommandResult::ok().with_field("showTranslated", editor.toggle_translated()))
            }
            "ui.state" => Ok(CommandResult::ok().with_json("state", &editor.state())),
            other if other.starts_with("ui.") => Err(ToolError::NoToolFound(other.to_string()).into()),
            _ => Ok(self.tool_manager.lock().await.execute_command(command).await?),
        }
    }
}

fn ignored() -> CommandResult {
    CommandResult::failure("ignored: processing in progress or no image loaded")
}

fn image_source(command: &Command) -> Result<ImageSource, ToolError> {
    if let Some(path) = command.get_str("path") {
        Ok(ImageSource::Path(PathBuf::from(path)))
    } else if let Some(url) = command.get_str("dataUrl") {
        Ok(ImageSource::DataUrl(url.to_string()))
    } else if let Some(rgba) = command.get_str("rgba") {
        Ok(ImageSource::Rgba {
            width: command.require_f64("width")? as u32,
            height: command.require_f64("height")? as u32,
            base64: rgba.to_string(),
        })
    } else {
        Err(ToolError::invalid_argument(
            "ui.loadImage needs one of `path`, `dataUrl` or `rgba`",
        ))
    }
}
