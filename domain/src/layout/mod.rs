//! Layout document model: elements placed on ordered layers

use crate::core::geometry::Rect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Element type used for groups created by `layout.groupElements`.
pub const GROUP_ELEMENT_TYPE: &str = "group";

/// An element on the layout canvas (speech bubble, text, image, shape, group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub layer_index: usize,
    #[serde(flatten)]
    pub bounds: Rect,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub style: Map<String, Value>,
    /// Free-form properties, e.g. `textBlockId` for OCR-linked bubbles
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Member ids, only for groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl LayoutElement {
    pub fn is_group(&self) -> bool {
        self.element_type == GROUP_ELEMENT_TYPE
    }

    /// OCR text block linked to this element, if any.
    pub fn text_block_id(&self) -> Option<&str> {
        self.properties.get("textBlockId").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Top-level elements of this layer in paint order
    pub element_ids: Vec<String>,
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visible: true,
            locked: false,
            element_ids: Vec::new(),
        }
    }
}

/// Everything the layout editor records in its history.
///
/// Group members stay in `elements` but are removed from their layer's
/// `element_ids` while grouped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub elements: BTreeMap<String, LayoutElement>,
    pub layers: Vec<Layer>,
}

impl LayoutDocument {
    /// Top-level elements in layer then paint order.
    pub fn visible_elements(&self) -> Vec<&LayoutElement> {
        self.layers
            .iter()
            .flat_map(|l| l.element_ids.iter())
            .filter_map(|id| self.elements.get(id))
            .collect()
    }
}
