//! Tool Registry
//!
//! The [`ToolRegistry`] is a catalogue of [`ToolMetadata`] snapshots,
//! independent of the live tool instances held by the
//! [`ToolManager`](super::manager::ToolManager). It answers discovery
//! queries (by type, category or capability) and dependency checks.
//!
//! # Usage
//!
//! ```ignore
//! let registry = ToolRegistry::new().with_event_bus(bus.clone());
//!
//! registry.register_tool(
//!     ToolMetadata::new("text-editor", "text-editor")
//!         .with_category("text")
//!         .with_capability("text-editing")
//!         .with_dependency("image-editor"),
//! );
//!
//! let check = registry.check_dependencies("text-editor");
//! assert!(!check.valid); // image-editor is not registered yet
//! ```
//!
//! # Indexes
//!
//! | Index | Key | Value |
//! |-------|-----|-------|
//! | tools | tool id | metadata |
//! | by category | category | tool ids |
//! | by capability | capability | tool ids |
//! | by dependency | tool id | ids it depends on |
//!
//! [`ToolRegistry::dependent_tools`] scans every entry, so it grows linearly
//! with the number of registered tools.

use crate::events::EventBus;
use inkframe_domain::event::ToolRef;
use inkframe_domain::{EditorEvent, ToolMetadata};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Outcome of [`ToolRegistry::check_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheck {
    pub valid: bool,
    pub message: String,
    pub missing_dependencies: Vec<String>,
}

impl DependencyCheck {
    fn satisfied(message: &str) -> Self {
        Self {
            valid: true,
            message: message.to_string(),
            missing_dependencies: Vec::new(),
        }
    }
}

/// Statistics about the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_tools: usize,
    pub total_categories: usize,
    pub total_capabilities: usize,
    pub tools_per_category: BTreeMap<String, usize>,
}

#[derive(Default)]
struct RegistryIndex {
    tools: BTreeMap<String, ToolMetadata>,
    by_category: HashMap<String, BTreeSet<String>>,
    by_capability: HashMap<String, BTreeSet<String>>,
    by_dependency: HashMap<String, BTreeSet<String>>,
}

impl RegistryIndex {
    fn insert(&mut self, metadata: ToolMetadata) {
        let id = metadata.id.clone();
        if !metadata.category.is_empty() {
            self.by_category
                .entry(metadata.category.clone())
                .or_default()
                .insert(id.clone());
        }
        for capability in &metadata.capabilities {
            self.by_capability
                .entry(capability.clone())
                .or_default()
                .insert(id.clone());
        }
        if !metadata.dependencies.is_empty() {
            self.by_dependency
                .insert(id.clone(), metadata.dependencies.clone());
        }
        self.tools.insert(id, metadata);
    }

    fn remove(&mut self, id: &str) -> Option<ToolMetadata> {
        let metadata = self.tools.remove(id)?;
        if let Some(ids) = self.by_category.get_mut(&metadata.category) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_category.remove(&metadata.category);
            }
        }
        for capability in &metadata.capabilities {
            if let Some(ids) = self.by_capability.get_mut(capability) {
                ids.remove(id);
                if ids.is_empty() {
                    self.by_capability.remove(capability);
                }
            }
        }
        self.by_dependency.remove(id);
        Some(metadata)
    }

    fn collect(&self, ids: Option<&BTreeSet<String>>) -> Vec<ToolMetadata> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.tools.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Catalogue of tool metadata with category, capability and dependency indexes.
///
/// All methods take `&self`; the indexes live behind an internal lock so the
/// registry can be shared as `Arc<ToolRegistry>` between the plugin bridge,
/// plugins and the UI.
#[derive(Default)]
pub struct ToolRegistry {
    index: RwLock<RegistryIndex>,
    event_bus: Option<EventBus>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish registry events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.event_bus.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: EditorEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(&event);
        }
    }

    pub fn initialize(&self) {
        tracing::debug!("Tool registry initialized");
        self.emit(EditorEvent::RegistryInitialized(()));
    }

    /// Add a metadata snapshot.
    ///
    /// Returns `false` when the id or type is empty, or when a tool with the
    /// same id is already registered.
    pub fn register_tool(&self, metadata: ToolMetadata) -> bool {
        if !metadata.is_valid() {
            tracing::warn!(tool = %metadata.id, "Invalid tool metadata, missing id or type");
            return false;
        }

        {
            let mut index = self.write();
            if index.tools.contains_key(&metadata.id) {
                tracing::warn!(tool = %metadata.id, "Tool is already registered");
                return false;
            }
            index.insert(metadata.clone());
        }

        tracing::debug!(
            tool = %metadata.id,
            tool_type = %metadata.tool_type,
            category = %metadata.category,
            "Registered tool metadata"
        );
        self.emit(EditorEvent::RegistryToolRegistered(metadata));
        true
    }

    /// Remove a tool and every index entry pointing at it.
    ///
    /// Tools that still depend on it are only warned about.
    pub fn unregister_tool(&self, id: &str) -> bool {
        let removed = {
            let mut index = self.write();
            let Some(removed) = index.remove(id) else {
                tracing::warn!(tool = %id, "Tool is not registered");
                return false;
            };
            for (dependent, deps) in &index.by_dependency {
                if deps.contains(id) {
                    tracing::warn!(
                        tool = %id,
                        dependent = %dependent,
                        "Tool {} is a dependency for {}",
                        id,
                        dependent
                    );
                }
            }
            removed
        };

        tracing::debug!(tool = %id, "Unregistered tool metadata");
        let mut tool_ref = ToolRef::new(removed.id, removed.tool_type);
        tool_ref.plugin_id = removed.plugin_id;
        self.emit(EditorEvent::RegistryToolUnregistered(tool_ref));
        true
    }

    /// Replace the snapshot of an already registered tool, re-indexing it.
    pub fn update_metadata(&self, metadata: ToolMetadata) -> bool {
        let mut index = self.write();
        if index.remove(&metadata.id).is_none() {
            return false;
        }
        index.insert(metadata);
        true
    }

    pub fn get_tool_metadata(&self, id: &str) -> Option<ToolMetadata> {
        self.read().tools.get(id).cloned()
    }

    pub fn has_tool(&self, id: &str) -> bool {
        self.read().tools.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tools.is_empty()
    }

    /// Every registered tool, ordered by id.
    pub fn all_tools(&self) -> Vec<ToolMetadata> {
        self.read().tools.values().cloned().collect()
    }

    pub fn tools_by_type(&self, tool_type: &str) -> Vec<ToolMetadata> {
        self.read()
            .tools
            .values()
            .filter(|m| m.tool_type == tool_type)
            .cloned()
            .collect()
    }

    pub fn tools_by_category(&self, category: &str) -> Vec<ToolMetadata> {
        let index = self.read();
        index.collect(index.by_category.get(category))
    }

    pub fn tools_by_capability(&self, capability: &str) -> Vec<ToolMetadata> {
        let index = self.read();
        index.collect(index.by_capability.get(capability))
    }

    /// Ids the tool declares as dependencies (empty when unknown).
    pub fn tool_dependencies(&self, id: &str) -> Vec<String> {
        self.read()
            .by_dependency
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of the tools that declare `id` as a dependency.
    pub fn dependent_tools(&self, id: &str) -> Vec<String> {
        self.read()
            .by_dependency
            .iter()
            .filter(|(_, deps)| deps.contains(id))
            .map(|(dependent, _)| dependent.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check that every declared dependency of `id` is registered.
    ///
    /// Only presence is checked; cycles and versions are not.
    pub fn check_dependencies(&self, id: &str) -> DependencyCheck {
        let index = self.read();
        if !index.tools.contains_key(id) {
            return DependencyCheck {
                valid: false,
                message: format!("Tool {} is not registered", id),
                missing_dependencies: Vec::new(),
            };
        }

        let Some(deps) = index.by_dependency.get(id) else {
            return DependencyCheck::satisfied("No dependencies");
        };

        let missing: Vec<String> = deps
            .iter()
            .filter(|dep| !index.tools.contains_key(*dep))
            .cloned()
            .collect();
        if missing.is_empty() {
            DependencyCheck::satisfied("All dependencies satisfied")
        } else {
            DependencyCheck {
                valid: false,
                message: format!("Missing dependencies: {}", missing.join(", ")),
                missing_dependencies: missing,
            }
        }
    }

    /// Get statistics about registered tools
    pub fn stats(&self) -> RegistryStats {
        let index = self.read();
        RegistryStats {
            total_tools: index.tools.len(),
            total_categories: index.by_category.len(),
            total_capabilities: index.by_capability.len(),
            tools_per_category: index
                .by_category
                .iter()
                .map(|(category, ids)| (category.clone(), ids.len()))
                .collect(),
        }
    }

    /// Drop every entry and announce disposal.
    pub fn dispose(&self) {
        *self.write() = RegistryIndex::default();
        tracing::debug!("Tool registry disposed");
        self.emit(EditorEvent::RegistryDisposed(()));
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.read().tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
