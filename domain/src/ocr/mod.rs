//! OCR value objects
//!
//! Recognition itself is an opaque service; the domain only fixes the
//! shape of what goes in ([`OcrRequest`]) and what comes out ([`TextBlock`]).

use crate::core::geometry::Rect;
use crate::core::image::ImageFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form preprocessing parameters recorded by the image editor
/// (threshold, denoise level, ...). Forwarded to the OCR processor verbatim.
pub type PreprocessingParams = Map<String, Value>;

/// A recognized region of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub bounds: Rect,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble_id: Option<String>,
    /// Set once a user edits the recognized text
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<Value>,
    #[serde(default)]
    pub is_formatted: bool,
}

impl TextBlock {
    pub fn new(id: impl Into<String>, text: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            bounds,
            confidence: 1.0,
            bubble_id: None,
            is_edited: false,
            formatting: None,
            is_formatted: false,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A speech bubble known to the layout editor, used as an OCR hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    pub bubble_id: String,
    pub bounds: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_block_id: Option<String>,
}

/// Input of a recognition job.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRequest {
    pub image_id: String,
    pub image: Option<ImageFrame>,
    pub preprocessing_params: Option<PreprocessingParams>,
    pub bubbles: Vec<Bubble>,
    /// Recognition language, `auto` by default
    pub language: String,
    /// Bypass cached results
    pub force_update: bool,
}

impl OcrRequest {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            image: None,
            preprocessing_params: None,
            bubbles: Vec::new(),
            language: "auto".to_string(),
            force_update: false,
        }
    }

    pub fn with_image(mut self, image: ImageFrame) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_preprocessing(mut self, params: PreprocessingParams) -> Self {
        self.preprocessing_params = Some(params);
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_update = true;
        self
    }
}
