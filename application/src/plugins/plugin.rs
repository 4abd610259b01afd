//! Plugin contracts and the in-memory plugin host

use super::integration::ToolIntegration;
use crate::events::EventBus;
use crate::tools::{ToolContext, ToolRegistry, Tool};
use async_trait::async_trait;
use inkframe_domain::event::PluginRef;
use inkframe_domain::{Command, CommandResult, EditorEvent, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Wildcard entry in [`PluginManifest::allowed_events`].
pub const ALL_EVENTS: &str = "*";

/// Static description of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Whether the plugin contributes editor tools
    #[serde(default)]
    pub provides_tools: bool,
    /// Event names the plugin may publish through the relay
    #[serde(default)]
    pub allowed_events: Vec<String>,
}

impl PluginManifest {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn providing_tools(mut self) -> Self {
        self.provides_tools = true;
        self
    }

    pub fn allow_event(mut self, name: impl Into<String>) -> Self {
        self.allowed_events.push(name.into());
        self
    }

    pub fn allows_event(&self, name: &str) -> bool {
        self.allowed_events
            .iter()
            .any(|allowed| allowed == ALL_EVENTS || allowed == name)
    }
}

/// A plugin as seen by the tool system.
#[async_trait]
pub trait ToolPlugin: Send + Sync {
    fn manifest(&self) -> &PluginManifest;

    /// The plugin's own context, if it keeps one.
    ///
    /// When present, the tool services are registered into it before
    /// [`ToolPlugin::register_tools`] runs.
    fn context(&self) -> Option<Arc<ToolContext>> {
        None
    }

    /// Contribute tools. Called on activation when the manifest says the
    /// plugin provides tools.
    async fn register_tools(&self, api: &PluginToolApi) -> Result<(), ToolError>;
}

/// Lookup of installed plugins.
pub trait PluginHost: Send + Sync {
    fn get_plugin(&self, plugin_id: &str) -> Option<Arc<dyn ToolPlugin>>;

    fn plugin_ids(&self) -> Vec<String>;
}

/// The operations a plugin may perform on the tool system.
///
/// Every operation is scoped to the plugin the API was created for, so a
/// plugin can never unregister another plugin's tools.
pub struct PluginToolApi {
    plugin_id: String,
    integration: Arc<ToolIntegration>,
}

impl PluginToolApi {
    pub(crate) fn new(plugin_id: impl Into<String>, integration: Arc<ToolIntegration>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            integration,
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub async fn register_tool(&self, tool: Box<dyn Tool>) -> bool {
        self.integration
            .register_tool_from_plugin(&self.plugin_id, tool)
            .await
    }

    pub async fn unregister_tool(&self, tool_id: &str) -> bool {
        self.integration
            .unregister_tool_from_plugin(&self.plugin_id, tool_id)
            .await
    }

    pub async fn execute_command(&self, command: &Command) -> Result<CommandResult, ToolError> {
        self.integration
            .tool_manager()
            .lock()
            .await
            .execute_command(command)
            .await
    }

    /// Read access to the tool catalogue.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.integration.tool_registry()
    }

    /// Publish `plugin.<name>` if the manifest allows it.
    pub fn relay_event(&self, name: &str, payload: Value) -> bool {
        self.integration
            .relay_plugin_event(&self.plugin_id, name, payload)
    }
}

/// Plugin host keeping installed plugins in memory.
///
/// Lifecycle changes are announced on the bus as `plugin.activated`,
/// `plugin.deactivated` and `plugin.uninstalled`.
pub struct InMemoryPluginHost {
    plugins: RwLock<BTreeMap<String, Arc<dyn ToolPlugin>>>,
    active: RwLock<BTreeSet<String>>,
    event_bus: EventBus,
}

impl InMemoryPluginHost {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            plugins: RwLock::new(BTreeMap::new()),
            active: RwLock::new(BTreeSet::new()),
            event_bus,
        }
    }

    pub fn install(&self, plugin: Arc<dyn ToolPlugin>) -> bool {
        let id = plugin.manifest().id.clone();
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        if plugins.contains_key(&id) {
            tracing::warn!(plugin = %id, "Plugin is already installed");
            return false;
        }
        plugins.insert(id.clone(), plugin);
        tracing::info!(plugin = %id, "Installed plugin");
        true
    }

    pub fn is_active(&self, plugin_id: &str) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(plugin_id)
    }

    pub async fn activate(&self, plugin_id: &str) -> bool {
        if self.get_plugin(plugin_id).is_none() {
            tracing::warn!(plugin = %plugin_id, "Cannot activate: plugin is not installed");
            return false;
        }
        let newly_active = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(plugin_id.to_string());
        if newly_active {
            self.event_bus
                .emit_async(&EditorEvent::PluginActivated(PluginRef::new(plugin_id)))
                .await;
        }
        true
    }

    pub async fn deactivate(&self, plugin_id: &str) -> bool {
        let was_active = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(plugin_id);
        if was_active {
            self.event_bus
                .emit_async(&EditorEvent::PluginDeactivated(PluginRef::new(plugin_id)))
                .await;
        }
        was_active
    }

    pub async fn uninstall(&self, plugin_id: &str) -> bool {
        let removed = self
            .plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(plugin_id)
            .is_some();
        if !removed {
            return false;
        }
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(plugin_id);
        tracing::info!(plugin = %plugin_id, "Uninstalled plugin");
        self.event_bus
            .emit_async(&EditorEvent::PluginUninstalled(PluginRef::new(plugin_id)))
            .await;
        true
    }
}

impl PluginHost for InMemoryPluginHost {
    fn get_plugin(&self, plugin_id: &str) -> Option<Arc<dyn ToolPlugin>> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(plugin_id)
            .cloned()
    }

    fn plugin_ids(&self) -> Vec<String> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_allows_events() {
        let manifest = PluginManifest::new("p").allow_event("pageTurned");
        assert!(manifest.allows_event("pageTurned"));
        assert!(!manifest.allows_event("other"));
        assert!(PluginManifest::new("q").allow_event("*").allows_event("anything"));
    }

    #[test]
    fn test_manifest_deserializes_camel_case() {
        let manifest: PluginManifest = serde_json::from_value(serde_json::json!({
            "id": "sfx-pack",
            "providesTools": true,
            "allowedEvents": ["sfxPlaced"]
        }))
        .unwrap();
        assert!(manifest.provides_tools);
        assert_eq!(manifest.allowed_events, vec!["sfxPlaced"]);
    }
}
