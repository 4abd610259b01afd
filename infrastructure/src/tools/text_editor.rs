//! Text editor tool
//!
//! Edits the text of one speech bubble or caption. Content is kept as a
//! single string that is either plain text or HTML produced by the
//! formatting commands; all positions are character offsets, never bytes.
//!
//! When loaded with a `textBlockId` the editor is bound to an OCR text
//! block and every content change is published as
//! `textEditor.textUpdated`, which the translation integration uses to
//! invalidate cached translations.

use super::text_format::{self, StylePatch, TextFormat, TextStyle};
use async_trait::async_trait;
use inkframe_application::ports::spell_checker::SpellChecker;
use inkframe_application::{CommandTable, Tool, ToolCore};
use inkframe_domain::event::TextChange;
use inkframe_domain::{Command, CommandResult, DEFAULT_MAX_HISTORY, EditorEvent, HistoryStack, ToolError};
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, OnceLock};

pub use inkframe_domain::TEXT_EDITOR_ID;

/// Half-open character range; `start == end` is a cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    fn cursor(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TextSnapshot {
    content: String,
    selection: TextSelection,
}

// ==================== Character offsets ====================

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn char_slice(text: &str, start: usize, end: usize) -> &str {
    &text[byte_offset(text, start)..byte_offset(text, end)]
}

/// Replace the characters in `start..end` with `insert`.
fn splice(text: &str, start: usize, end: usize, insert: &str) -> String {
    let (a, b) = (byte_offset(text, start), byte_offset(text, end));
    let mut out = String::with_capacity(text.len() - (b - a) + insert.len());
    out.push_str(&text[..a]);
    out.push_str(insert);
    out.push_str(&text[b..]);
    out
}

fn position_arg(command: &Command, key: &str) -> Option<usize> {
    command.get_f64(key).map(|v| v.max(0.0) as usize)
}

pub struct TextEditorTool {
    core: ToolCore,
    content: String,
    selection: TextSelection,
    style: TextStyle,
    history: HistoryStack<TextSnapshot>,
    spell_checker: Option<Arc<dyn SpellChecker>>,
    text_block_id: Option<String>,
    image_id: Option<String>,
}

impl TextEditorTool {
    pub fn new() -> Self {
        let mut tool = Self {
            core: ToolCore::new(TEXT_EDITOR_ID, "text-editor")
                .with_name("Text Editor")
                .with_description("Editing and formatting of bubble text")
                .with_category("text")
                .with_capabilities(["text-editing", "text-formatting", "spell-checking"]),
            content: String::new(),
            selection: TextSelection::default(),
            style: TextStyle::default(),
            history: HistoryStack::new(DEFAULT_MAX_HISTORY),
            spell_checker: None,
            text_block_id: None,
            image_id: None,
        };
        let base = tool.snapshot();
        tool.history.reset(base);
        tool
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_history(mut self, max_len: usize) -> Self {
        self.history = HistoryStack::new(max_len);
        let base = self.snapshot();
        self.history.reset(base);
        self
    }

    pub fn with_spell_checker(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        self.spell_checker = Some(checker);
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn selection(&self) -> TextSelection {
        self.selection
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn text_block_id(&self) -> Option<&str> {
        self.text_block_id.as_deref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn commands() -> &'static CommandTable<Self> {
        static TABLE: OnceLock<CommandTable<TextEditorTool>> = OnceLock::new();
        TABLE.get_or_init(|| {
            CommandTable::new()
                .with("text.load", Self::load)
                .with("text.save", Self::save)
                .with("text.insert", Self::insert)
                .with("text.delete", Self::delete)
                .with("text.replace", Self::replace)
                .with("text.select", Self::select)
                .with("text.format", Self::format)
                .with("text.setStyle", Self::set_style)
                .with("text.checkSpelling", Self::check_spelling)
                .with("text.undo", Self::undo)
                .with("text.redo", Self::redo)
                .with("text.clear", Self::clear)
        })
    }

    // ==================== Helpers ====================

    fn len(&self) -> usize {
        char_len(&self.content)
    }

    /// Clamp a range to the content, forcing `end >= start`.
    fn clamp_range(&self, start: usize, end: usize) -> TextSelection {
        let len = self.len();
        let start = start.min(len);
        TextSelection {
            start,
            end: end.min(len).max(start),
        }
    }

    /// The selection, or the whole content when nothing is selected.
    fn target_range(&self) -> TextSelection {
        if self.selection.is_empty() {
            TextSelection {
                start: 0,
                end: self.len(),
            }
        } else {
            self.selection
        }
    }

    fn snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            content: self.content.clone(),
            selection: self.selection,
        }
    }

    /// Record the current content and tell listeners about it.
    fn commit(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        self.notify();
    }

    fn notify(&self) {
        if let Some(block_id) = &self.text_block_id {
            self.core.emit(EditorEvent::TextUpdated(TextChange {
                text_block_id: block_id.clone(),
                image_id: self.image_id.clone(),
                text: text_format::strip_tags(&self.content),
            }));
        }
    }

    fn restore(&mut self, snapshot: TextSnapshot) {
        self.content = snapshot.content;
        self.selection = snapshot.selection;
        self.notify();
    }

    fn html(&self) -> String {
        if text_format::contains_markup(&self.content) {
            self.content.clone()
        } else {
            text_format::escape_html(&self.content)
        }
    }

    fn history_result(&self) -> CommandResult {
        CommandResult::ok()
            .with_field("historyIndex", self.history.index().unwrap_or(0) as u64)
            .with_field("historyLength", self.history.len() as u64)
    }

    fn parse_format(name: &str) -> Result<TextFormat, ToolError> {
        TextFormat::parse(name)
            .ok_or_else(|| ToolError::not_found(format!("Format {} is not registered", name)))
    }

    // ==================== Command handlers ====================

    fn load(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let text = command.get_str("text").unwrap_or_default();
        let format = Self::parse_format(command.get_str("format").unwrap_or("plain"))?;

        self.content = match format {
            TextFormat::Markdown | TextFormat::Rich => text_format::markdown_to_html(text),
            TextFormat::Plain | TextFormat::Html => text.to_string(),
        };
        self.selection = TextSelection::default();
        self.text_block_id = command.get_str("textBlockId").map(str::to_string);
        self.image_id = command.get_str("imageId").map(str::to_string);
        let base = self.snapshot();
        self.history.reset(base);

        tracing::debug!(
            tool = %self.core.id(),
            format = format.as_str(),
            text_block = ?self.text_block_id,
            "Text loaded"
        );
        Ok(CommandResult::ok()
            .with_field("length", self.len() as u64)
            .with_field("format", format.as_str()))
    }

    fn save(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let format = Self::parse_format(command.get_str("format").unwrap_or("plain"))?;
        let text = match format {
            TextFormat::Plain => text_format::strip_tags(&self.content),
            TextFormat::Html => self.html(),
            TextFormat::Markdown => text_format::html_to_markdown(&self.html()),
            TextFormat::Rich => json!({
                "html": self.html(),
                "styles": self.style,
            })
            .to_string(),
        };
        Ok(CommandResult::ok()
            .with_field("length", char_len(&text) as u64)
            .with_field("text", text)
            .with_field("format", format.as_str()))
    }

    fn insert(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let text = command.get_str("text").unwrap_or_default();
        if text.is_empty() {
            return Ok(CommandResult::failure("No text to insert"));
        }
        let position = position_arg(command, "position")
            .unwrap_or(self.selection.start)
            .min(self.len());

        self.content = splice(&self.content, position, position, text);
        let inserted = char_len(text);
        self.selection = TextSelection::cursor(position + inserted);
        self.commit();

        Ok(CommandResult::ok()
            .with_field("position", position as u64)
            .with_field("insertedLength", inserted as u64)
            .with_field("newLength", self.len() as u64))
    }

    fn delete(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let (start, end) = match (position_arg(command, "start"), position_arg(command, "end")) {
            (Some(start), Some(end)) => (start, end),
            _ if self.selection.is_empty() => {
                (self.selection.start.saturating_sub(1), self.selection.end)
            }
            _ => (self.selection.start, self.selection.end),
        };
        let range = self.clamp_range(start, end);
        if range.is_empty() {
            return Ok(CommandResult::ok().with_field("deletedLength", 0));
        }

        let deleted = char_slice(&self.content, range.start, range.end).to_string();
        self.content = splice(&self.content, range.start, range.end, "");
        self.selection = TextSelection::cursor(range.start);
        self.commit();

        Ok(CommandResult::ok()
            .with_field("start", range.start as u64)
            .with_field("end", range.end as u64)
            .with_field("deletedLength", char_len(&deleted) as u64)
            .with_field("deletedText", deleted)
            .with_field("newLength", self.len() as u64))
    }

    fn replace(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let text = command.get_str("text").unwrap_or_default();
        let range = match (position_arg(command, "start"), position_arg(command, "end")) {
            (Some(start), Some(end)) => self.clamp_range(start, end),
            _ => self.clamp_range(self.selection.start, self.selection.end),
        };

        let replaced = char_slice(&self.content, range.start, range.end).to_string();
        self.content = splice(&self.content, range.start, range.end, text);
        self.selection = TextSelection::cursor(range.start + char_len(text));
        self.commit();

        Ok(CommandResult::ok()
            .with_field("start", range.start as u64)
            .with_field("end", range.end as u64)
            .with_field("replacedLength", char_len(&replaced) as u64)
            .with_field("replacedText", replaced)
            .with_field("newText", text)
            .with_field("newLength", self.len() as u64))
    }

    fn select(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let start = position_arg(command, "start").unwrap_or(0);
        let end = position_arg(command, "end").unwrap_or(start);
        self.selection = self.clamp_range(start, end);

        let selected = char_slice(&self.content, self.selection.start, self.selection.end);
        Ok(CommandResult::ok()
            .with_field("start", self.selection.start as u64)
            .with_field("end", self.selection.end as u64)
            .with_field("selectedText", selected)
            .with_field("selectedLength", (self.selection.end - self.selection.start) as u64))
    }

    fn format(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let format = Self::parse_format(command.require_str("format")?)?;
        let options: StylePatch = command.get_as("options")?.unwrap_or_default();
        let range = self.target_range();

        let source = char_slice(&self.content, range.start, range.end);
        let formatted = text_format::apply_format(format, source, &options);
        let formatted_len = char_len(&formatted);
        self.content = splice(&self.content, range.start, range.end, &formatted);
        self.selection = TextSelection {
            start: range.start,
            end: range.start + formatted_len,
        };
        self.commit();

        Ok(CommandResult::ok()
            .with_field("format", format.as_str())
            .with_field("start", range.start as u64)
            .with_field("end", self.selection.end as u64)
            .with_field("formattedLength", formatted_len as u64))
    }

    fn set_style(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let patch: StylePatch = command.require_as("style")?;
        patch.apply_to(&mut self.style);

        if !self.selection.is_empty() && !patch.is_empty() {
            let range = self.selection;
            let inner = char_slice(&self.content, range.start, range.end);
            let span = format!(r#"<span style="{}">{}</span>"#, patch.css(), inner);
            let span_len = char_len(&span);
            self.content = splice(&self.content, range.start, range.end, &span);
            self.selection = TextSelection {
                start: range.start,
                end: range.start + span_len,
            };
            self.commit();
        }

        Ok(CommandResult::ok().with_json("style", &self.style))
    }

    fn check_spelling(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(checker) = &self.spell_checker else {
            return Ok(CommandResult::failure("Spell checker is not available"));
        };
        let range = self.target_range();
        let text = char_slice(&self.content, range.start, range.end);

        let issues: Vec<_> = checker
            .check(text)
            .into_iter()
            .map(|mut issue| {
                issue.start += range.start;
                issue.end += range.start;
                issue
            })
            .collect();
        tracing::debug!(tool = %self.core.id(), issues = issues.len(), "Spelling checked");

        Ok(CommandResult::ok()
            .with_json("errors", &issues)
            .with_field("start", range.start as u64)
            .with_field("end", range.end as u64))
    }

    fn undo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(CommandResult::failure("Nothing to undo"));
        };
        self.restore(snapshot);
        Ok(self.history_result())
    }

    fn redo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(CommandResult::failure("Nothing to redo"));
        };
        self.restore(snapshot);
        Ok(self.history_result())
    }

    fn clear(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        self.content.clear();
        self.selection = TextSelection::default();
        self.commit();
        Ok(CommandResult::ok())
    }
}

impl Default for TextEditorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TextEditorTool {
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
        let id = self.core.id().to_string();
        Self::commands().dispatch(self, &id, command)
    }

    async fn on_dispose(&mut self) -> Result<(), ToolError> {
        self.content.clear();
        self.selection = TextSelection::default();
        self.history.clear();
        self.spell_checker = None;
        self.text_block_id = None;
        Ok(())
    }
}
