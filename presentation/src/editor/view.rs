//! Rendering targets for the unified editor

use super::ui_state::{StatusLevel, UiState};
use colored::Colorize;
use std::sync::{Mutex, PoisonError};

/// Something that can display the editor state.
///
/// Called from synchronous bus handlers, so implementations must not block
/// on the tool manager.
pub trait EditorView: Send + Sync {
    /// The state changed; redraw.
    fn render(&self, state: &UiState);

    /// Called once when the interface is disposed.
    fn close(&self) {}
}

/// Discards every update.
pub struct NullView;

impl EditorView for NullView {
    fn render(&self, _state: &UiState) {}
}

/// One status line per change, no progress bar.
pub struct PlainView {
    last: Mutex<Option<String>>,
}

impl PlainView {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    pub(crate) fn status_line(state: &UiState) -> String {
        let text = &state.status.text;
        let status = match state.status.level {
            StatusLevel::Info => text.normal(),
            StatusLevel::Warning => text.yellow(),
            StatusLevel::Error => text.red().bold(),
        };
        let mut line = format!("[{}] {}", state.mode.as_str().cyan(), status);
        if let Some(info) = &state.image_info {
            line.push_str(&format!(" {}", format!("(image {})", info).dimmed()));
        }
        line
    }
}

impl Default for PlainView {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorView for PlainView {
    fn render(&self, state: &UiState) {
        if state.status.text.is_empty() {
            return;
        }
        let line = Self::status_line(state);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() != Some(line.as_str()) {
            eprintln!("{}", line);
            *last = Some(line);
        }
    }
}

/// Keeps every rendered state; used by tests and scripted sessions.
#[derive(Default)]
pub struct RecordingView {
    frames: Mutex<Vec<UiState>>,
    closed: Mutex<bool>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<UiState> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<UiState> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.frames()
            .into_iter()
            .map(|state| state.status.text)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EditorView for RecordingView {
    fn render(&self, state: &UiState) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state.clone());
    }

    fn close(&self) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ui_state::Status;

    #[test]
    fn test_recording_view_keeps_frames() {
        let view = RecordingView::new();
        let mut state = UiState::default();
        state.status = Status::info("Image loaded");
        view.render(&state);
        state.status = Status::error("OCR failed: boom");
        view.render(&state);

        assert_eq!(view.statuses(), vec!["Image loaded", "OCR failed: boom"]);
        assert_eq!(view.last().unwrap().status.level, StatusLevel::Error);
        view.close();
        assert!(view.is_closed());
    }

    #[test]
    fn test_status_line_names_mode_and_image() {
        colored::control::set_override(false);
        let mut state = UiState::default();
        state.status = Status::info("Image loaded");
        state.image_info = Some("640x480".into());
        assert_eq!(
            PlainView::status_line(&state),
            "[ocr] Image loaded (image 640x480)"
        );
    }
}
