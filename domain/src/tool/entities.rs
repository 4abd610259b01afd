//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle state of a tool instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolLifecycle {
    #[default]
    Created,
    Initialized,
    Active,
    Inactive,
    Disposed,
}

impl ToolLifecycle {
    pub fn as_str(&self) -> &str {
        match self {
            ToolLifecycle::Created => "created",
            ToolLifecycle::Initialized => "initialized",
            ToolLifecycle::Active => "active",
            ToolLifecycle::Inactive => "inactive",
            ToolLifecycle::Disposed => "disposed",
        }
    }

    /// Whether `initialize()` has run and the tool has not been disposed.
    pub fn is_initialized(&self) -> bool {
        matches!(
            self,
            ToolLifecycle::Initialized | ToolLifecycle::Active | ToolLifecycle::Inactive
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ToolLifecycle::Active)
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, ToolLifecycle::Disposed)
    }
}

impl std::fmt::Display for ToolLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of a tool's identity, capabilities and state flags.
///
/// Stored by the registry independently of the live tool, so it survives
/// the instance being swapped out. When mirrored from a live tool the ids
/// always match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub active: bool,
}

impl ToolMetadata {
    pub fn new(id: impl Into<String>, tool_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tool_type: tool_type.into(),
            description: String::new(),
            category: String::new(),
            capabilities: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            plugin_id: None,
            initialized: false,
            active: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_dependency(mut self, tool_id: impl Into<String>) -> Self {
        self.dependencies.insert(tool_id.into());
        self
    }

    pub fn with_plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether the required identity fields are present.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.tool_type.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_flags() {
        assert!(!ToolLifecycle::Created.is_initialized());
        assert!(ToolLifecycle::Initialized.is_initialized());
        assert!(ToolLifecycle::Active.is_initialized());
        assert!(ToolLifecycle::Active.is_active());
        assert!(!ToolLifecycle::Inactive.is_active());
        assert!(!ToolLifecycle::Disposed.is_initialized());
        assert!(ToolLifecycle::Disposed.is_disposed());
    }

    #[test]
    fn test_metadata_builder() {
        let meta = ToolMetadata::new("text-editor", "text")
            .with_name("Text Editor")
            .with_category("text")
            .with_capability("text-editing")
            .with_dependency("image-editor");

        assert_eq!(meta.name, "Text Editor");
        assert!(meta.has_capability("text-editing"));
        assert!(meta.dependencies.contains("image-editor"));
        assert!(meta.is_valid());
        assert!(!ToolMetadata::new("", "text").is_valid());
    }

    #[test]
    fn test_metadata_serializes_type_field() {
        let meta = ToolMetadata::new("layout-editor", "layout").with_plugin("comic-pack");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "layout");
        assert_eq!(json["pluginId"], "comic-pack");
    }
}
