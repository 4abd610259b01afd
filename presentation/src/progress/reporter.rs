//! Progress reporting for OCR and translation jobs

use crate::editor::{EditorView, PlainView, StatusLevel, UiState};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};

/// Renders the editor state with a progress bar while a job runs and a
/// coloured status line otherwise.
pub struct ProgressView {
    bar: Mutex<Option<ProgressBar>>,
    status: PlainView,
}

impl ProgressView {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            status: PlainView::new(),
        }
    }

    fn job_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn finish_message(state: &UiState) -> String {
        match state.status.level {
            StatusLevel::Error => format!("{} {}", "x".red(), state.status.text.red()),
            StatusLevel::Warning => format!("{} {}", "!".yellow(), state.status.text.yellow()),
            StatusLevel::Info => format!("{} {}", "v".green(), state.status.text.green()),
        }
    }
}

impl Default for ProgressView {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorView for ProgressView {
    fn render(&self, state: &UiState) {
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);

        if state.is_processing {
            let pb = bar.get_or_insert_with(|| {
                let pb = ProgressBar::new(100);
                pb.set_style(Self::job_style());
                pb.set_prefix(state.mode.as_str().to_string());
                pb
            });
            pb.set_position(state.progress.round().clamp(0.0, 100.0) as u64);
            pb.set_message(state.status.text.clone());
            return;
        }

        let running = bar.take();
        drop(bar);
        match running {
            Some(pb) => {
                if state.status.level == StatusLevel::Error {
                    pb.abandon_with_message(Self::finish_message(state));
                } else {
                    pb.set_position(100);
                    pb.finish_with_message(Self::finish_message(state));
                }
            }
            None => self.status.render(state),
        }
    }

    fn close(&self) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Status;

    #[test]
    fn test_bar_lives_only_while_processing() {
        let view = ProgressView::new();
        let mut state = UiState::default();
        state.is_processing = true;
        state.progress = 40.0;
        state.status = Status::info("Performing OCR...");
        view.render(&state);
        {
            let bar = view.bar.lock().unwrap();
            assert_eq!(bar.as_ref().map(|pb| pb.position()), Some(40));
        }

        state.is_processing = false;
        state.status = Status::info("OCR completed: 3 text blocks found");
        view.render(&state);
        assert!(view.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_close_clears_running_bar() {
        let view = ProgressView::new();
        let mut state = UiState::default();
        state.is_processing = true;
        view.render(&state);
        view.close();
        assert!(view.bar.lock().unwrap().is_none());
    }
}
