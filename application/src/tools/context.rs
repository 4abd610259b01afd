//! Tool context: per-session services and shared state
//!
//! A [`ToolContext`] is handed to tools at initialization. It carries the
//! session's [`EventBus`], weak handles to the tool manager and plugin
//! host, a typed service map and a JSON state bag.
//!
//! Services are stored type-erased and recovered with a checked downcast:
//!
//! ```ignore
//! context.register_service("toolRegistry", registry.clone());
//! let registry: Arc<ToolRegistry> = context.get_service("toolRegistry").unwrap();
//! ```

use super::manager::{SharedToolManager, ToolManager};
use crate::events::EventBus;
use crate::plugins::PluginHost;
use inkframe_domain::EditorEvent;
use inkframe_domain::event::{ServiceRef, StateChange};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

type Service = Arc<dyn Any + Send + Sync>;

/// Options for [`ToolContext::create_child_context`].
#[derive(Debug, Clone, Default)]
pub struct ChildContextOptions {
    /// Keys shallow-merged over the copied parent state
    pub state: Option<Map<String, Value>>,
}

pub struct ToolContext {
    event_bus: EventBus,
    tool_manager: Option<Weak<tokio::sync::Mutex<ToolManager>>>,
    plugin_host: Option<Arc<dyn PluginHost>>,
    services: RwLock<HashMap<String, Service>>,
    state: RwLock<Map<String, Value>>,
}

impl ToolContext {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            event_bus,
            tool_manager: None,
            plugin_host: None,
            services: RwLock::new(HashMap::new()),
            state: RwLock::new(Map::new()),
        }
    }

    /// Reference the session's tool manager without keeping it alive.
    pub fn with_tool_manager(mut self, manager: &SharedToolManager) -> Self {
        self.tool_manager = Some(Arc::downgrade(manager));
        self
    }

    pub fn with_plugin_host(mut self, host: Arc<dyn PluginHost>) -> Self {
        self.plugin_host = Some(host);
        self
    }

    pub fn with_state(self, state: Map<String, Value>) -> Self {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// The tool manager, if it is still alive.
    pub fn tool_manager(&self) -> Option<SharedToolManager> {
        self.tool_manager.as_ref().and_then(Weak::upgrade)
    }

    pub fn plugin_host(&self) -> Option<&Arc<dyn PluginHost>> {
        self.plugin_host.as_ref()
    }

    // ==================== Services ====================

    /// Register a service under `name`.
    ///
    /// Returns `false` if the name is already taken.
    pub fn register_service<T: Any + Send + Sync>(&self, name: &str, service: Arc<T>) -> bool {
        {
            let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
            if services.contains_key(name) {
                tracing::warn!(service = %name, "Service is already registered");
                return false;
            }
            services.insert(name.to_string(), service);
        }
        self.event_bus
            .emit(&EditorEvent::ContextServiceRegistered(ServiceRef {
                name: name.to_string(),
            }));
        true
    }

    pub fn unregister_service(&self, name: &str) -> bool {
        let removed = self
            .services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            self.event_bus
                .emit(&EditorEvent::ContextServiceUnregistered(ServiceRef {
                    name: name.to_string(),
                }));
        }
        removed
    }

    /// Look up a service and downcast it to `T`.
    ///
    /// Returns `None` when the name is unknown or holds another type.
    pub fn get_service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let service = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        service.downcast::<T>().ok()
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    // ==================== State ====================

    /// Apply a state patch.
    ///
    /// With `merge` the patch keys overwrite the current ones; without it the
    /// patch becomes the whole state. Emits `toolContext.stateChanged` listing
    /// only the patch keys as changed.
    pub fn set_state(&self, patch: Map<String, Value>, merge: bool) {
        let changed_props: Vec<String> = patch.keys().cloned().collect();
        let (old_state, new_state) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old_state = state.clone();
            if merge {
                state.extend(patch);
            } else {
                *state = patch;
            }
            (old_state, state.clone())
        };

        self.event_bus
            .emit(&EditorEvent::ContextStateChanged(StateChange {
                old_state,
                new_state,
                changed_props,
            }));
    }

    pub fn state(&self) -> Map<String, Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Derive a context sharing this one's bus, manager and plugin host.
    ///
    /// The child starts with a copy of the state and of the service map; later
    /// registrations on either side are not visible to the other.
    pub fn create_child_context(&self, options: ChildContextOptions) -> ToolContext {
        let mut state = self.state();
        if let Some(extra) = options.state {
            state.extend(extra);
        }
        let services = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        ToolContext {
            event_bus: self.event_bus.clone(),
            tool_manager: self.tool_manager.clone(),
            plugin_host: self.plugin_host.clone(),
            services: RwLock::new(services),
            state: RwLock::new(state),
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("services", &self.service_names())
            .field("state", &self.state())
            .finish()
    }
}
