//! Layout editor tool
//!
//! Places speech bubbles, captions, images and shapes on ordered layers.
//! The whole [`LayoutDocument`] is the history snapshot, so every command
//! that changes the document is one undo step.
//!
//! ```text
//! layers[0] "Layer 1"  ── element_1, group_3 ─┬─ element_2 (group-relative)
//!                                             └─ element_4 (group-relative)
//! layers[1] "Lettering" ── element_5
//! ```
//!
//! Elements linked to an OCR text block (`properties.textBlockId`) announce
//! moves as `layoutEditor.bubbleUpdated` and resizes as
//! `layoutEditor.textBlockResized`, so the OCR and translation integrations
//! can follow the bubble.

use async_trait::async_trait;
use inkframe_application::{CommandTable, Tool, ToolCore};
use inkframe_domain::event::{BubbleChange, LayoutChange, TextBlockResize};
use inkframe_domain::layout::GROUP_ELEMENT_TYPE;
use inkframe_domain::{
    Command, CommandResult, DEFAULT_MAX_HISTORY, EditorEvent, HistoryStack, Layer,
    LayoutDocument, LayoutElement, Rect, ToolError,
};
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub use inkframe_domain::LAYOUT_EDITOR_ID;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
const DEFAULT_WIDTH: f64 = 100.0;
const DEFAULT_HEIGHT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
struct LayoutSnapshot {
    document: LayoutDocument,
    active_layer: usize,
}

/// How a command changed an element's bounds, for bubble notifications.
enum BoundsChange {
    Moved,
    Resized,
}

pub struct LayoutEditorTool {
    core: ToolCore,
    document: LayoutDocument,
    active_element: Option<String>,
    active_layer: usize,
    grid_size: f64,
    snap_to_grid: bool,
    zoom: f64,
    history: HistoryStack<LayoutSnapshot>,
    image_id: Option<String>,
    next_id: u64,
}

impl LayoutEditorTool {
    pub fn new() -> Self {
        let mut tool = Self {
            core: ToolCore::new(LAYOUT_EDITOR_ID, "layout-editor")
                .with_name("Layout Editor")
                .with_description("Layers, bubbles and element placement on a page")
                .with_category("layout")
                .with_capabilities(["layout-management", "layer-management", "element-alignment"]),
            document: LayoutDocument::default(),
            active_element: None,
            active_layer: 0,
            grid_size: 10.0,
            snap_to_grid: true,
            zoom: 1.0,
            history: HistoryStack::new(DEFAULT_MAX_HISTORY),
            image_id: None,
            next_id: 1,
        };
        tool.reset_document();
        tool
    }

    pub fn with_max_history(mut self, max_len: usize) -> Self {
        self.history = HistoryStack::new(max_len);
        let base = self.snapshot();
        self.history.reset(base);
        self
    }

    pub fn with_grid(mut self, size: f64, snap: bool) -> Self {
        self.grid_size = size.max(1.0);
        self.snap_to_grid = snap;
        self
    }

    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    pub fn element(&self, id: &str) -> Option<&LayoutElement> {
        self.document.elements.get(id)
    }

    pub fn active_layer(&self) -> usize {
        self.active_layer
    }

    pub fn active_element(&self) -> Option<&str> {
        self.active_element.as_deref()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn commands() -> &'static CommandTable<Self> {
        static TABLE: OnceLock<CommandTable<LayoutEditorTool>> = OnceLock::new();
        TABLE.get_or_init(|| {
            CommandTable::new()
                .with("layout.addElement", Self::add_element)
                .with("layout.removeElement", Self::remove_element)
                .with("layout.moveElement", Self::move_element)
                .with("layout.resizeElement", Self::resize_element)
                .with("layout.setElementProperties", Self::set_element_properties)
                .with("layout.selectElement", Self::select_element)
                .with("layout.deselectElement", Self::deselect_element)
                .with("layout.addLayer", Self::add_layer)
                .with("layout.removeLayer", Self::remove_layer)
                .with("layout.renameLayer", Self::rename_layer)
                .with("layout.moveLayer", Self::move_layer)
                .with("layout.setActiveLayer", Self::set_active_layer)
                .with("layout.alignElements", Self::align_elements)
                .with("layout.distributeElements", Self::distribute_elements)
                .with("layout.groupElements", Self::group_elements)
                .with("layout.ungroupElements", Self::ungroup_elements)
                .with("layout.setZoom", Self::set_zoom)
                .with("layout.setGrid", Self::set_grid)
                .with("layout.undo", Self::undo)
                .with("layout.redo", Self::redo)
                .with("layout.clear", Self::clear)
        })
    }

    // ==================== Helpers ====================

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    /// One empty layer named "Layer 1", recorded as the history base.
    fn reset_document(&mut self) {
        let layer_id = self.next_id("layer");
        self.document = LayoutDocument {
            elements: Default::default(),
            layers: vec![Layer::new(layer_id, "Layer 1")],
        };
        self.active_layer = 0;
        self.active_element = None;
        let base = self.snapshot();
        self.history.reset(base);
    }

    fn snap(&self, value: f64) -> f64 {
        if self.snap_to_grid {
            (value / self.grid_size).round() * self.grid_size
        } else {
            value
        }
    }

    fn snap_size(&self, value: f64) -> f64 {
        if self.snap_to_grid {
            self.snap(value).max(self.grid_size)
        } else {
            value
        }
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            document: self.document.clone(),
            active_layer: self.active_layer,
        }
    }

    fn commit(&mut self, operation: &str) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        tracing::debug!(
            tool = %self.core.id(),
            operation,
            elements = self.document.elements.len(),
            layers = self.document.layers.len(),
            "Layout changed"
        );
        self.emit_layout_changed(operation);
    }

    fn emit_layout_changed(&self, operation: &str) {
        self.core.emit(EditorEvent::LayoutChanged(LayoutChange {
            image_id: self.image_id.clone(),
            operation: operation.to_string(),
            layout: self
                .document
                .visible_elements()
                .into_iter()
                .cloned()
                .collect(),
        }));
    }

    fn notify_bubble(&self, element_id: &str, change: BoundsChange) {
        let Some(element) = self.document.elements.get(element_id) else {
            return;
        };
        let Some(text_block_id) = element.text_block_id() else {
            return;
        };
        let event = match change {
            BoundsChange::Moved => EditorEvent::BubbleUpdated(BubbleChange {
                bubble_id: element.id.clone(),
                image_id: self.image_id.clone(),
                bounds: element.bounds,
                text_block_id: Some(text_block_id.to_string()),
            }),
            BoundsChange::Resized => EditorEvent::TextBlockResized(TextBlockResize {
                text_block_id: text_block_id.to_string(),
                image_id: self.image_id.clone(),
                new_bounds: element.bounds,
            }),
        };
        self.core.emit(event);
    }

    fn check_layer(&self, index: i64) -> Result<usize, ToolError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.document.layers.len())
            .ok_or_else(|| ToolError::invalid_argument(format!("Invalid layer index: {}", index)))
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut LayoutElement, ToolError> {
        self.document
            .elements
            .get_mut(id)
            .ok_or_else(|| ToolError::not_found(format!("Element {} not found", id)))
    }

    /// Existing elements among `ids`, in the given order.
    fn existing(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| self.document.elements.contains_key(id.as_str()))
            .cloned()
            .collect()
    }

    /// Set every element's layer index from the layer that lists it.
    fn reindex_layers(&mut self) {
        let LayoutDocument { elements, layers } = &mut self.document;
        for (index, layer) in layers.iter().enumerate() {
            for id in &layer.element_ids {
                let children = match elements.get_mut(id) {
                    Some(element) => {
                        element.layer_index = index;
                        element.children.clone()
                    }
                    None => continue,
                };
                for child in children {
                    if let Some(member) = elements.get_mut(&child) {
                        member.layer_index = index;
                    }
                }
            }
        }
    }

    /// Move without recording history; returns the snapped position.
    fn place(&mut self, id: &str, x: f64, y: f64) -> Result<(f64, f64), ToolError> {
        let (x, y) = (self.snap(x), self.snap(y));
        let element = self.element_mut(id)?;
        element.bounds.x = x;
        element.bounds.y = y;
        self.notify_bubble(id, BoundsChange::Moved);
        Ok((x, y))
    }

    fn bounds_of(&self, id: &str) -> Result<Rect, ToolError> {
        self.document
            .elements
            .get(id)
            .map(|e| e.bounds)
            .ok_or_else(|| ToolError::not_found(format!("Element {} not found", id)))
    }

    fn history_result(&self) -> CommandResult {
        CommandResult::ok()
            .with_field("historyIndex", self.history.index().unwrap_or(0) as u64)
            .with_field("historyLength", self.history.len() as u64)
    }

    // ==================== Elements ====================

    fn add_element(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let element_type = command.require_str("elementType")?.to_string();
        let mut properties: Map<String, Value> = command.get_as("properties")?.unwrap_or_default();
        let layer_index = match command.get_i64("layerIndex") {
            Some(index) => self.check_layer(index)?,
            None => self.active_layer,
        };
        if let Some(image_id) = command.get_str("imageId") {
            self.image_id = Some(image_id.to_string());
        }

        let mut take_f64 = |key: &str, default: f64| {
            properties
                .remove(key)
                .and_then(|v| v.as_f64())
                .unwrap_or(default)
        };
        let x = take_f64("x", 0.0);
        let y = take_f64("y", 0.0);
        let width = take_f64("width", DEFAULT_WIDTH);
        let height = take_f64("height", DEFAULT_HEIGHT);
        let content = properties
            .remove("content")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let style = match properties.remove("style") {
            Some(Value::Object(style)) => style,
            _ => Map::new(),
        };

        let id = self.next_id("element");
        let element = LayoutElement {
            id: id.clone(),
            element_type,
            layer_index,
            bounds: Rect::new(self.snap(x), self.snap(y), width, height),
            content,
            style,
            properties,
            children: Vec::new(),
        };
        self.document.layers[layer_index].element_ids.push(id.clone());
        self.document.elements.insert(id.clone(), element.clone());
        self.commit("addElement");

        Ok(CommandResult::ok()
            .with_field("elementId", id)
            .with_json("element", &element))
    }

    fn remove_element(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let id = command.require_str("elementId")?;
        let Some(element) = self.document.elements.remove(id) else {
            return Ok(CommandResult::failure(format!("Element {} not found", id)));
        };
        if let Some(layer) = self.document.layers.get_mut(element.layer_index) {
            layer.element_ids.retain(|e| e != id);
        }
        for child in &element.children {
            self.document.elements.remove(child);
        }
        if self.active_element.as_deref() == Some(id) {
            self.active_element = None;
        }
        self.commit("removeElement");
        Ok(CommandResult::ok().with_field("elementId", id))
    }

    fn move_element(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let id = command.require_str("elementId")?;
        let (x, y) = self.place(id, command.require_f64("x")?, command.require_f64("y")?)?;
        self.commit("moveElement");
        Ok(CommandResult::ok()
            .with_field("elementId", id)
            .with_field("x", x)
            .with_field("y", y))
    }

    fn resize_element(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let id = command.require_str("elementId")?;
        let width = self.snap_size(command.require_f64("width")?);
        let height = self.snap_size(command.require_f64("height")?);
        let element = self.element_mut(id)?;
        element.bounds.width = width;
        element.bounds.height = height;
        self.notify_bubble(id, BoundsChange::Resized);
        self.commit("resizeElement");
        Ok(CommandResult::ok()
            .with_field("elementId", id)
            .with_field("width", width)
            .with_field("height", height))
    }

    fn set_element_properties(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let id = command.require_str("elementId")?.to_string();
        let mut patch: Map<String, Value> = command.require_as("properties")?;
        let old = self
            .element(&id)
            .map(serde_json::to_value)
            .ok_or_else(|| ToolError::not_found(format!("Element {} not found", id)))?
            .map_err(|e| ToolError::invalid_state(e.to_string()))?;

        let mut take = |key: &str| patch.remove(key).and_then(|v| v.as_f64());
        let (x, y) = (take("x").map(|v| self.snap(v)), take("y").map(|v| self.snap(v)));
        let width = take("width").map(|v| self.snap_size(v));
        let height = take("height").map(|v| self.snap_size(v));
        let content = patch.remove("content");
        let style = patch.remove("style");

        let element = self.element_mut(&id)?;
        let before = element.bounds;
        if let Some(x) = x {
            element.bounds.x = x;
        }
        if let Some(y) = y {
            element.bounds.y = y;
        }
        if let Some(width) = width {
            element.bounds.width = width;
        }
        if let Some(height) = height {
            element.bounds.height = height;
        }
        if let Some(content) = content {
            element.content = content.as_str().map(str::to_string).unwrap_or_default();
        }
        if let Some(Value::Object(style)) = style {
            element.style = style;
        }
        element.properties.extend(patch);
        let after = element.bounds;
        let new = serde_json::to_value(&*element)
            .map_err(|e| ToolError::invalid_state(e.to_string()))?;

        if (before.x, before.y) != (after.x, after.y) {
            self.notify_bubble(&id, BoundsChange::Moved);
        }
        if (before.width, before.height) != (after.width, after.height) {
            self.notify_bubble(&id, BoundsChange::Resized);
        }
        self.commit("setElementProperties");

        Ok(CommandResult::ok()
            .with_field("elementId", id)
            .with_field("newProperties", new)
            .with_field("oldProperties", old))
    }

    fn select_element(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let id = command.require_str("elementId")?;
        if !self.document.elements.contains_key(id) {
            return Ok(CommandResult::failure(format!("Element {} not found", id)));
        }
        self.active_element = Some(id.to_string());
        Ok(CommandResult::ok().with_field("elementId", id))
    }

    fn deselect_element(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        self.active_element = None;
        Ok(CommandResult::ok())
    }

    // ==================== Layers ====================

    fn add_layer(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let name = command
            .get_str("name")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Layer {}", self.document.layers.len() + 1));
        let layer = Layer::new(self.next_id("layer"), name);
        self.document.layers.push(layer.clone());
        self.commit("addLayer");
        Ok(CommandResult::ok()
            .with_field("layerIndex", (self.document.layers.len() - 1) as u64)
            .with_json("layer", &layer))
    }

    fn remove_layer(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let index = self.check_layer(command.require_i64("layerIndex")?)?;
        if self.document.layers.len() <= 1 {
            return Err(ToolError::invalid_state("Cannot remove the last layer"));
        }

        let removed = self.document.layers.remove(index);
        for id in &removed.element_ids {
            if let Some(element) = self.document.elements.remove(id) {
                for child in &element.children {
                    self.document.elements.remove(child);
                }
            }
        }
        if self
            .active_element
            .as_ref()
            .is_some_and(|active| !self.document.elements.contains_key(active))
        {
            self.active_element = None;
        }
        if self.active_layer == index {
            self.active_layer = index.saturating_sub(1);
        } else if self.active_layer > index {
            self.active_layer -= 1;
        }
        self.reindex_layers();
        self.commit("removeLayer");

        Ok(CommandResult::ok()
            .with_field("layerIndex", index as u64)
            .with_json("removedLayer", &removed))
    }

    fn rename_layer(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let index = self.check_layer(command.require_i64("layerIndex")?)?;
        let new_name = command.require_str("newName")?;
        if new_name.is_empty() {
            return Err(ToolError::invalid_argument("Layer name cannot be empty"));
        }
        let old_name = std::mem::replace(&mut self.document.layers[index].name, new_name.to_string());
        self.commit("renameLayer");
        Ok(CommandResult::ok()
            .with_field("layerIndex", index as u64)
            .with_field("newName", new_name)
            .with_field("oldName", old_name))
    }

    fn move_layer(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let from = self.check_layer(command.require_i64("layerIndex")?)?;
        let to = self.check_layer(command.require_i64("newIndex")?)?;
        if from == to {
            return Ok(CommandResult::ok().with_message("Layer already at the target index"));
        }

        let layer = self.document.layers.remove(from);
        self.document.layers.insert(to, layer);
        self.active_layer = if self.active_layer == from {
            to
        } else if from < to && (from + 1..=to).contains(&self.active_layer) {
            self.active_layer - 1
        } else if to < from && (to..from).contains(&self.active_layer) {
            self.active_layer + 1
        } else {
            self.active_layer
        };
        self.reindex_layers();
        self.commit("moveLayer");

        Ok(CommandResult::ok()
            .with_field("oldIndex", from as u64)
            .with_field("newIndex", to as u64))
    }

    fn set_active_layer(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        self.active_layer = self.check_layer(command.require_i64("layerIndex")?)?;
        Ok(CommandResult::ok().with_field("activeLayerIndex", self.active_layer as u64))
    }

    // ==================== Arrangement ====================

    fn align_elements(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let ids: Vec<String> = command.require_as("elementIds")?;
        let alignment = command.require_str("alignment")?;
        if ids.len() < 2 {
            return Err(ToolError::invalid_argument(
                "At least two elements are required for alignment",
            ));
        }
        let found = self.existing(&ids);
        if found.len() < 2 {
            return Err(ToolError::invalid_argument(
                "Could not find at least two elements to align",
            ));
        }

        let reference = self.bounds_of(&found[0])?;
        let mut targets = Vec::with_capacity(found.len() - 1);
        for id in &found[1..] {
            let b = self.bounds_of(id)?;
            let (x, y) = match alignment {
                "left" => (reference.x, b.y),
                "center" => (reference.center_x() - b.width / 2.0, b.y),
                "right" => (reference.right() - b.width, b.y),
                "top" => (b.x, reference.y),
                "middle" => (b.x, reference.center_y() - b.height / 2.0),
                "bottom" => (b.x, reference.bottom() - b.height),
                other => {
                    return Err(ToolError::invalid_argument(format!(
                        "Invalid alignment type: {}",
                        other
                    )));
                }
            };
            targets.push((id.clone(), x, y));
        }
        for (id, x, y) in targets {
            self.place(&id, x, y)?;
        }
        self.commit("alignElements");

        Ok(CommandResult::ok()
            .with_field("elementIds", ids)
            .with_field("alignment", alignment))
    }

    fn distribute_elements(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let ids: Vec<String> = command.require_as("elementIds")?;
        let distribution = command.require_str("distribution")?;
        if ids.len() < 3 {
            return Err(ToolError::invalid_argument(
                "At least three elements are required for distribution",
            ));
        }
        let horizontal = match distribution {
            "horizontal" => true,
            "vertical" => false,
            other => {
                return Err(ToolError::invalid_argument(format!(
                    "Invalid distribution type: {}",
                    other
                )));
            }
        };
        let mut items = Vec::new();
        for id in self.existing(&ids) {
            let b = self.bounds_of(&id)?;
            // (id, position, extent, cross-axis position)
            items.push(if horizontal {
                (id, b.x, b.width, b.y)
            } else {
                (id, b.y, b.height, b.x)
            });
        }
        if items.len() < 3 {
            return Err(ToolError::invalid_argument(
                "Could not find at least three elements to distribute",
            ));
        }
        items.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (first, last) = (&items[0], &items[items.len() - 1]);
        let total_extent: f64 = items.iter().map(|i| i.2).sum();
        let gaps = (items.len() - 1) as f64;
        let mut spacing = (last.1 - first.1 - total_extent) / gaps;
        if spacing < 0.0 {
            spacing = (last.1 + last.2 - first.1 - total_extent) / gaps;
        }

        let mut cursor = first.1 + first.2;
        let middle: Vec<_> = items[1..items.len() - 1].to_vec();
        for (id, _, extent, cross) in middle {
            let pos = cursor + spacing;
            if horizontal {
                self.place(&id, pos, cross)?;
            } else {
                self.place(&id, cross, pos)?;
            }
            cursor = pos + extent;
        }
        self.commit("distributeElements");

        Ok(CommandResult::ok()
            .with_field("elementIds", ids)
            .with_field("distribution", distribution))
    }

    fn group_elements(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let ids: Vec<String> = command.require_as("elementIds")?;
        if ids.len() < 2 {
            return Err(ToolError::invalid_argument(
                "At least two elements are required for grouping",
            ));
        }
        let members = self.existing(&ids);
        if members.len() < 2 {
            return Err(ToolError::invalid_argument(
                "Could not find at least two elements to group",
            ));
        }

        let layer_index = self.document.elements[&members[0]].layer_index;
        let mut rects = Vec::with_capacity(members.len());
        for id in &members {
            let element = &self.document.elements[id];
            if element.layer_index != layer_index {
                return Err(ToolError::invalid_argument(
                    "Cannot group elements from different layers",
                ));
            }
            rects.push(element.bounds);
        }
        let Some(bounds) = Rect::union_all(&rects) else {
            return Err(ToolError::invalid_state("Group has no members"));
        };

        let group_id = self.next_id("group");
        for id in &members {
            if let Some(element) = self.document.elements.get_mut(id) {
                element.bounds = element.bounds.translated(-bounds.x, -bounds.y);
            }
        }
        let layer = &mut self.document.layers[layer_index];
        layer.element_ids.retain(|e| !members.contains(e));
        layer.element_ids.push(group_id.clone());

        let group = LayoutElement {
            id: group_id.clone(),
            element_type: GROUP_ELEMENT_TYPE.to_string(),
            layer_index,
            bounds,
            content: String::new(),
            style: Map::new(),
            properties: Map::new(),
            children: members,
        };
        self.document.elements.insert(group_id.clone(), group.clone());
        self.commit("groupElements");

        Ok(CommandResult::ok()
            .with_field("groupId", group_id)
            .with_json("groupElement", &group))
    }

    fn ungroup_elements(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let group_id = command.require_str("groupId")?;
        let group = match self.document.elements.get(group_id) {
            Some(element) if element.is_group() => element.clone(),
            _ => return Err(ToolError::not_found(format!("Group {} not found", group_id))),
        };

        self.document.elements.remove(group_id);
        let layer_index = group.layer_index;
        let mut restored = Vec::new();
        for child in &group.children {
            if let Some(element) = self.document.elements.get_mut(child) {
                element.bounds = element.bounds.translated(group.bounds.x, group.bounds.y);
                element.layer_index = layer_index;
                restored.push(child.clone());
            }
        }
        if let Some(layer) = self.document.layers.get_mut(layer_index) {
            layer.element_ids.retain(|e| e != group_id);
            layer.element_ids.extend(restored.iter().cloned());
        }
        if self.active_element.as_deref() == Some(group_id) {
            self.active_element = None;
        }
        self.commit("ungroupElements");

        Ok(CommandResult::ok()
            .with_field("groupId", group_id)
            .with_field("ungroupedElementIds", restored))
    }

    // ==================== View ====================

    fn set_zoom(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        self.zoom = command.require_f64("level")?.clamp(MIN_ZOOM, MAX_ZOOM);
        Ok(CommandResult::ok().with_field("zoomLevel", self.zoom))
    }

    fn set_grid(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        if let Some(size) = command.get_f64("size") {
            self.grid_size = size.max(1.0);
        }
        self.snap_to_grid = command.get_bool("snap").unwrap_or(false);
        Ok(CommandResult::ok()
            .with_field("gridSize", self.grid_size)
            .with_field("snapToGrid", self.snap_to_grid))
    }

    // ==================== History ====================

    fn restore(&mut self, snapshot: LayoutSnapshot, operation: &str) {
        self.document = snapshot.document;
        self.active_layer = snapshot.active_layer;
        if self
            .active_element
            .as_ref()
            .is_some_and(|active| !self.document.elements.contains_key(active))
        {
            self.active_element = None;
        }
        self.emit_layout_changed(operation);
    }

    fn undo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(CommandResult::failure("Nothing to undo"));
        };
        self.restore(snapshot, "undo");
        Ok(self.history_result())
    }

    fn redo(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(CommandResult::failure("Nothing to redo"));
        };
        self.restore(snapshot, "redo");
        Ok(self.history_result())
    }

    fn clear(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        let layer_id = self.next_id("layer");
        self.document = LayoutDocument {
            elements: Default::default(),
            layers: vec![Layer::new(layer_id, "Layer 1")],
        };
        self.active_layer = 0;
        self.active_element = None;
        if let Some(image_id) = command.get_str("imageId") {
            self.image_id = Some(image_id.to_string());
        }
        self.commit("clear");
        Ok(CommandResult::ok())
    }
}

impl Default for LayoutEditorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for LayoutEditorTool {
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
        self.document = LayoutDocument::default();
        self.active_element = None;
        self.history.clear();
        Ok(())
    }
}
