//! Tool integration: bridges the plugin host and the tool system
//!
//! # Flow
//!
//! ```text
//! plugin.activated ──▶ look up plugin ──▶ register services into its context
//!                                      └─▶ plugin.register_tools(PluginToolApi)
//!                                              │
//!                                              ▼
//!                      ToolManager.register_tool + ToolRegistry.register_tool
//!                      + ownership map (plugin id → tool ids)
//!
//! plugin.deactivated / plugin.uninstalled ──▶ unregister that plugin's tools
//! ```
//!
//! Plugins may also publish their own events through
//! [`ToolIntegration::relay_plugin_event`]; only names listed in the
//! manifest's `allowedEvents` are relayed, always under `plugin.<name>`.

use super::plugin::{PluginHost, PluginToolApi};
use crate::events::{EventBus, Listener, Subscriptions};
use crate::tools::{SharedToolManager, Tool, ToolRegistry};
use inkframe_domain::event::{CustomEvent, PluginToolRef};
use inkframe_domain::{EditorEvent, EventKind};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub struct ToolIntegration {
    tool_manager: SharedToolManager,
    tool_registry: Arc<ToolRegistry>,
    plugin_host: Arc<dyn PluginHost>,
    event_bus: EventBus,
    plugin_tools: Mutex<BTreeMap<String, BTreeSet<String>>>,
    subscriptions: Subscriptions,
    initialized: AtomicBool,
}

impl ToolIntegration {
    pub fn new(
        tool_manager: SharedToolManager,
        tool_registry: Arc<ToolRegistry>,
        plugin_host: Arc<dyn PluginHost>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            tool_manager,
            tool_registry,
            plugin_host,
            subscriptions: Subscriptions::new(event_bus.clone()),
            event_bus,
            plugin_tools: Mutex::new(BTreeMap::new()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn tool_manager(&self) -> &SharedToolManager {
        &self.tool_manager
    }

    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    fn ownership(&self) -> MutexGuard<'_, BTreeMap<String, BTreeSet<String>>> {
        self.plugin_tools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to plugin lifecycle events. Idempotent.
    pub fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(self);
        let listener = Listener::future(move |event| {
            let weak: Weak<ToolIntegration> = weak.clone();
            async move {
                let Some(this) = weak.upgrade() else {
                    return Ok(());
                };
                match event {
                    EditorEvent::PluginActivated(plugin) => {
                        this.handle_plugin_activated(&plugin.plugin_id).await
                    }
                    EditorEvent::PluginDeactivated(plugin)
                    | EditorEvent::PluginUninstalled(plugin) => {
                        this.unregister_plugin_tools(&plugin.plugin_id).await
                    }
                    _ => {}
                }
                Ok(())
            }
        });

        for kind in [
            EventKind::PluginActivated,
            EventKind::PluginDeactivated,
            EventKind::PluginUninstalled,
        ] {
            self.subscriptions.add(kind, listener.clone());
        }
        tracing::debug!("Tool integration initialized");
    }

    /// Register a tool on behalf of a plugin.
    ///
    /// The tool is stamped with the plugin id, handed to the manager, and its
    /// metadata mirrored into the registry.
    pub async fn register_tool_from_plugin(&self, plugin_id: &str, mut tool: Box<dyn Tool>) -> bool {
        if plugin_id.trim().is_empty() {
            tracing::error!("Invalid plugin id provided for tool registration");
            return false;
        }

        tool.core_mut().set_plugin_id(plugin_id);
        let tool_id = tool.id().to_string();
        let metadata = tool.metadata();

        if !self.tool_manager.lock().await.register_tool(tool) {
            return false;
        }
        if !self.tool_registry.register_tool(metadata) {
            tracing::warn!(tool = %tool_id, plugin = %plugin_id, "Tool metadata was not mirrored");
        }
        self.ownership()
            .entry(plugin_id.to_string())
            .or_default()
            .insert(tool_id.clone());

        tracing::info!(tool = %tool_id, plugin = %plugin_id, "Registered plugin tool");
        self.event_bus
            .emit(&EditorEvent::IntegrationToolRegistered(PluginToolRef {
                plugin_id: plugin_id.to_string(),
                tool_id,
            }));
        true
    }

    /// Unregister a tool, but only if `plugin_id` owns it.
    pub async fn unregister_tool_from_plugin(&self, plugin_id: &str, tool_id: &str) -> bool {
        let owned = self
            .ownership()
            .get(plugin_id)
            .is_some_and(|tools| tools.contains(tool_id));
        if !owned {
            tracing::warn!(tool = %tool_id, plugin = %plugin_id, "Tool is not registered by plugin");
            return false;
        }

        if !self.tool_manager.lock().await.unregister_tool(tool_id).await {
            return false;
        }

        {
            let mut ownership = self.ownership();
            if let Some(tools) = ownership.get_mut(plugin_id) {
                tools.remove(tool_id);
                if tools.is_empty() {
                    ownership.remove(plugin_id);
                }
            }
        }
        self.tool_registry.unregister_tool(tool_id);

        tracing::info!(tool = %tool_id, plugin = %plugin_id, "Unregistered plugin tool");
        self.event_bus
            .emit(&EditorEvent::IntegrationToolUnregistered(PluginToolRef {
                plugin_id: plugin_id.to_string(),
                tool_id: tool_id.to_string(),
            }));
        true
    }

    pub fn tools_from_plugin(&self, plugin_id: &str) -> Vec<String> {
        self.ownership()
            .get(plugin_id)
            .map(|tools| tools.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn plugin_for_tool(&self, tool_id: &str) -> Option<String> {
        self.ownership()
            .iter()
            .find(|(_, tools)| tools.contains(tool_id))
            .map(|(plugin_id, _)| plugin_id.clone())
    }

    /// Let an activated plugin contribute its tools.
    pub async fn handle_plugin_activated(self: &Arc<Self>, plugin_id: &str) {
        let Some(plugin) = self.plugin_host.get_plugin(plugin_id) else {
            tracing::warn!(plugin = %plugin_id, "Activated plugin is not known to the host");
            return;
        };
        if !plugin.manifest().provides_tools {
            return;
        }

        if let Some(context) = plugin.context() {
            context.register_service("toolManager", self.tool_manager.clone());
            context.register_service("toolRegistry", self.tool_registry.clone());
            context.register_service("toolIntegration", self.clone());
        }

        let api = PluginToolApi::new(plugin_id, self.clone());
        if let Err(e) = plugin.register_tools(&api).await {
            tracing::error!(plugin = %plugin_id, error = %e, "Plugin failed to register its tools");
        }
    }

    /// Remove every tool owned by `plugin_id`.
    pub async fn unregister_plugin_tools(&self, plugin_id: &str) {
        for tool_id in self.tools_from_plugin(plugin_id) {
            self.unregister_tool_from_plugin(plugin_id, &tool_id).await;
        }
    }

    /// Publish a plugin event as `plugin.<name>`.
    ///
    /// Rejected when the plugin is unknown, the manifest does not allow the
    /// name, or the name would collide with a built-in event.
    pub fn relay_plugin_event(&self, plugin_id: &str, name: &str, payload: Value) -> bool {
        let Some(plugin) = self.plugin_host.get_plugin(plugin_id) else {
            tracing::warn!(plugin = %plugin_id, event = %name, "Relay from unknown plugin");
            return false;
        };
        if !plugin.manifest().allows_event(name) {
            tracing::warn!(plugin = %plugin_id, event = %name, "Plugin is not allowed to publish event");
            return false;
        }

        let kind = EventKind::plugin(name);
        if !kind.is_custom() {
            tracing::warn!(plugin = %plugin_id, event = %name, "Plugin event collides with a built-in event");
            return false;
        }

        self.event_bus.emit(&EditorEvent::Custom(CustomEvent {
            name: kind.as_str().to_string(),
            source_plugin_id: Some(plugin_id.to_string()),
            payload,
        }));
        true
    }

    /// Unsubscribe and unregister every plugin tool.
    pub async fn dispose(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }

        self.subscriptions.clear();

        let plugins: Vec<String> = self.ownership().keys().cloned().collect();
        for plugin_id in plugins {
            self.unregister_plugin_tools(&plugin_id).await;
        }
        self.ownership().clear();
        tracing::debug!("Tool integration disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::plugin::{InMemoryPluginHost, PluginManifest, ToolPlugin};
    use crate::tools::tool::test_support::EchoTool;
    use crate::tools::{ToolContext, ToolManager};
    use async_trait::async_trait;
    use inkframe_domain::{Command, ToolError};
    use serde_json::json;

    struct EchoPlugin {
        manifest: PluginManifest,
        tool_ids: Vec<&'static str>,
        context: Arc<ToolContext>,
    }

    impl EchoPlugin {
        fn new(id: &str, tool_ids: Vec<&'static str>, bus: &EventBus) -> Self {
            Self {
                manifest: PluginManifest::new(id)
                    .providing_tools()
                    .allow_event("pageTurned")
                    .allow_event("activated"),
                tool_ids,
                context: Arc::new(ToolContext::new(bus.clone())),
            }
        }
    }

    #[async_trait]
    impl ToolPlugin for EchoPlugin {
        fn manifest(&self) -> &PluginManifest {
            &self.manifest
        }

        fn context(&self) -> Option<Arc<ToolContext>> {
            Some(self.context.clone())
        }

        async fn register_tools(&self, api: &PluginToolApi) -> Result<(), ToolError> {
            for id in &self.tool_ids {
                api.register_tool(Box::new(EchoTool::new(id))).await;
            }
            Ok(())
        }
    }

    struct Session {
        bus: EventBus,
        host: Arc<InMemoryPluginHost>,
        manager: SharedToolManager,
        registry: Arc<ToolRegistry>,
        integration: Arc<ToolIntegration>,
    }

    fn session() -> Session {
        let bus = EventBus::new();
        let host = Arc::new(InMemoryPluginHost::new(bus.clone()));
        let manager = ToolManager::new(bus.clone()).into_shared();
        let registry = Arc::new(ToolRegistry::new().with_event_bus(bus.clone()));
        let integration = Arc::new(ToolIntegration::new(
            manager.clone(),
            registry.clone(),
            host.clone(),
            bus.clone(),
        ));
        integration.initialize();
        Session {
            bus,
            host,
            manager,
            registry,
            integration,
        }
    }

    #[tokio::test]
    async fn test_activation_registers_plugin_tools() {
        let s = session();
        let plugin = Arc::new(EchoPlugin::new("alpha", vec!["alpha-echo"], &s.bus));
        s.host.install(plugin.clone());
        assert!(s.host.activate("alpha").await);

        assert!(s.manager.lock().await.has_tool("alpha-echo"));
        let metadata = s.registry.get_tool_metadata("alpha-echo").unwrap();
        assert_eq!(metadata.plugin_id.as_deref(), Some("alpha"));
        assert_eq!(s.integration.tools_from_plugin("alpha"), vec!["alpha-echo"]);
        assert_eq!(
            s.integration.plugin_for_tool("alpha-echo").as_deref(),
            Some("alpha")
        );

        assert!(plugin.context.has_service("toolManager"));
        assert!(plugin.context.has_service("toolRegistry"));
        let integration: Arc<ToolIntegration> =
            plugin.context.get_service("toolIntegration").unwrap();
        assert!(Arc::ptr_eq(&integration, &s.integration));
    }

    #[tokio::test]
    async fn test_deactivation_removes_only_own_tools() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec!["a1", "a2"], &s.bus)));
        s.host
            .install(Arc::new(EchoPlugin::new("beta", vec!["b1"], &s.bus)));
        s.host.activate("alpha").await;
        s.host.activate("beta").await;

        assert!(s.host.deactivate("alpha").await);

        let manager = s.manager.lock().await;
        assert!(!manager.has_tool("a1"));
        assert!(!manager.has_tool("a2"));
        assert!(manager.has_tool("b1"));
        drop(manager);
        assert!(s.integration.tools_from_plugin("alpha").is_empty());
        assert!(s.registry.has_tool("b1"));
        assert!(!s.registry.has_tool("a1"));
    }

    #[tokio::test]
    async fn test_plugin_cannot_unregister_foreign_tool() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec!["a1"], &s.bus)));
        s.host
            .install(Arc::new(EchoPlugin::new("beta", vec!["b1"], &s.bus)));
        s.host.activate("alpha").await;
        s.host.activate("beta").await;

        let api = PluginToolApi::new("beta", s.integration.clone());
        assert!(!api.unregister_tool("a1").await);
        assert!(s.manager.lock().await.has_tool("a1"));
        assert!(api.unregister_tool("b1").await);
    }

    #[tokio::test]
    async fn test_uninstall_removes_tools() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec!["a1"], &s.bus)));
        s.host.activate("alpha").await;
        assert!(s.host.uninstall("alpha").await);
        assert!(!s.manager.lock().await.has_tool("a1"));
    }

    #[tokio::test]
    async fn test_api_executes_commands() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec!["a1"], &s.bus)));
        s.host.activate("alpha").await;

        let api = PluginToolApi::new("alpha", s.integration.clone());
        let result = api
            .execute_command(&Command::new("echo.say").with_arg("text", "hi"))
            .await
            .unwrap();
        assert_eq!(result.get_str("toolId"), Some("a1"));
        assert_eq!(api.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_respects_manifest_and_builtins() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec![], &s.bus)));

        let relayed = Arc::new(Mutex::new(Vec::new()));
        let sink = relayed.clone();
        s.bus.on(
            EventKind::parse("plugin.pageTurned"),
            Listener::sync(move |event| {
                if let EditorEvent::Custom(custom) = event {
                    sink.lock().unwrap().push(custom.source_plugin_id.clone());
                }
                Ok(())
            }),
        );

        assert!(s.integration.relay_plugin_event("alpha", "pageTurned", json!({"page": 2})));
        assert!(!s.integration.relay_plugin_event("alpha", "notAllowed", json!({})));
        assert!(!s.integration.relay_plugin_event("alpha", "activated", json!({})));
        assert!(!s.integration.relay_plugin_event("ghost", "pageTurned", json!({})));
        assert_eq!(*relayed.lock().unwrap(), vec![Some("alpha".to_string())]);
    }

    #[tokio::test]
    async fn test_dispose_unregisters_everything() {
        let s = session();
        s.host
            .install(Arc::new(EchoPlugin::new("alpha", vec!["a1"], &s.bus)));
        s.host.activate("alpha").await;

        s.integration.dispose().await;
        assert!(!s.manager.lock().await.has_tool("a1"));
        assert_eq!(s.bus.listener_count(&EventKind::PluginActivated), 0);
    }
}
