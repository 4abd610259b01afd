//! OCR processor answering from recorded fixtures
//!
//! Results are looked up by image id, first in memory, then in
//! `<fixture_dir>/<image_id>.json` holding a JSON array of text blocks:
//!
//! ```json
//! [{"id": "b1", "text": "POW", "bounds": {"x": 10, "y": 20, "width": 80, "height": 40}}]
//! ```

use async_trait::async_trait;
use inkframe_application::{OcrProcessor, ProcessingError};
use inkframe_domain::{OcrRequest, TextBlock};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct FixtureOcrProcessor {
    fixture_dir: Option<PathBuf>,
    blocks: HashMap<String, Vec<TextBlock>>,
}

impl FixtureOcrProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = Some(dir.into());
        self
    }

    /// Register in-memory results for an image.
    pub fn with_blocks(mut self, image_id: impl Into<String>, blocks: Vec<TextBlock>) -> Self {
        self.blocks.insert(image_id.into(), blocks);
        self
    }

    async fn load_fixture(&self, image_id: &str) -> Result<Vec<TextBlock>, ProcessingError> {
        let Some(dir) = &self.fixture_dir else {
            return Err(ProcessingError::Unavailable(format!(
                "No OCR fixture for image {}",
                image_id
            )));
        };
        if image_id.contains(['/', '\\']) || image_id.starts_with('.') {
            return Err(ProcessingError::InvalidInput(format!(
                "Image id {} cannot name a fixture file",
                image_id
            )));
        }

        let path = dir.join(format!("{}.json", image_id));
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ProcessingError::Unavailable(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let blocks: Vec<TextBlock> = serde_json::from_str(&content).map_err(|e| {
            ProcessingError::Failed(format!("Invalid fixture {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), blocks = blocks.len(), "Loaded OCR fixture");
        Ok(blocks)
    }
}

#[async_trait]
impl OcrProcessor for FixtureOcrProcessor {
    async fn recognize(&self, request: &OcrRequest) -> Result<Vec<TextBlock>, ProcessingError> {
        if let Some(blocks) = self.blocks.get(&request.image_id) {
            return Ok(blocks.clone());
        }
        self.load_fixture(&request.image_id).await
    }
}
