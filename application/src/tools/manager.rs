//! Tool manager: owns live tools, activation and command routing
//!
//! At most one tool is active at a time. Commands are routed to a tool in
//! this order:
//!
//! 1. the tool named by the command's `toolId` (an unknown id is an error),
//! 2. the active tool, which rejects types outside its command table,
//! 3. the first registered tool (registration order) that accepts it.
//!
//! The manager is shared as a [`SharedToolManager`]. Synchronous bus
//! handlers must never lock it, since the manager emits while locked.

use super::context::ToolContext;
use super::tool::Tool;
use crate::events::EventBus;
use inkframe_domain::event::CommandEvent;
use inkframe_domain::{Command, CommandResult, EditorEvent, ToolError, ToolMetadata};
use std::collections::HashMap;
use std::sync::Arc;

pub type SharedToolManager = Arc<tokio::sync::Mutex<ToolManager>>;

pub struct ToolManager {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
    active_tool_id: Option<String>,
    event_bus: EventBus,
    context: Option<Arc<ToolContext>>,
    initialized: bool,
}

impl ToolManager {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            active_tool_id: None,
            event_bus,
            context: None,
            initialized: false,
        }
    }

    /// Context handed to tools that are initialized through the manager.
    pub fn with_context(mut self, context: Arc<ToolContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn set_context(&mut self, context: Arc<ToolContext>) {
        self.context = Some(context);
    }

    pub fn into_shared(self) -> SharedToolManager {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn context(&self) -> Option<&Arc<ToolContext>> {
        self.context.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        tracing::debug!("Tool manager initialized");
        self.event_bus.emit(&EditorEvent::ManagerInitialized(()));
    }

    /// Take ownership of a tool.
    ///
    /// Returns `false` when the id or type is empty or the id is taken.
    /// A tool without an event bus gets the manager's.
    pub fn register_tool(&mut self, mut tool: Box<dyn Tool>) -> bool {
        let id = tool.id().to_string();
        if id.trim().is_empty() || tool.tool_type().trim().is_empty() {
            tracing::warn!(tool = %id, "Invalid tool, missing id or type");
            return false;
        }
        if self.tools.contains_key(&id) {
            tracing::warn!(tool = %id, "Tool is already registered");
            return false;
        }

        if tool.event_bus().is_none() {
            tool.set_event_bus(self.event_bus.clone());
        }
        if tool.core().context().is_none()
            && let Some(context) = &self.context
        {
            tool.core_mut().set_context(context.clone());
        }

        let tool_ref = tool.core().tool_ref();
        self.tools.insert(id.clone(), tool);
        self.order.push(id.clone());

        tracing::info!(tool = %id, "Registered tool");
        self.event_bus
            .emit(&EditorEvent::ManagerToolRegistered(tool_ref));
        true
    }

    /// Remove a tool, deactivating it first when it is active.
    pub async fn unregister_tool(&mut self, id: &str) -> bool {
        if !self.tools.contains_key(id) {
            tracing::warn!(tool = %id, "Cannot unregister: tool is not registered");
            return false;
        }
        if self.active_tool_id.as_deref() == Some(id) {
            self.deactivate_tool(id).await;
            self.active_tool_id = None;
        }

        let Some(tool) = self.tools.remove(id) else {
            return false;
        };
        self.order.retain(|t| t != id);

        tracing::info!(tool = %id, "Unregistered tool");
        self.event_bus
            .emit(&EditorEvent::ManagerToolUnregistered(tool.core().tool_ref()));
        true
    }

    pub fn has_tool(&self, id: &str) -> bool {
        self.tools.contains_key(id)
    }

    pub fn get_tool(&self, id: &str) -> Option<&dyn Tool> {
        self.tools.get(id).map(|t| t.as_ref())
    }

    pub fn get_tool_mut(&mut self, id: &str) -> Option<&mut (dyn Tool + 'static)> {
        self.tools.get_mut(id).map(|t| t.as_mut())
    }

    /// Tool ids in registration order.
    pub fn tool_ids(&self) -> &[String] {
        &self.order
    }

    pub fn tools_by_type(&self, tool_type: &str) -> Vec<&dyn Tool> {
        self.ordered()
            .filter(|t| t.tool_type() == tool_type)
            .collect()
    }

    pub fn all_metadata(&self) -> Vec<ToolMetadata> {
        self.ordered().map(|t| t.metadata()).collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &dyn Tool> {
        self.order
            .iter()
            .filter_map(|id| self.tools.get(id).map(|t| t.as_ref()))
    }

    pub fn active_tool_id(&self) -> Option<&str> {
        self.active_tool_id.as_deref()
    }

    pub fn active_tool(&self) -> Option<&dyn Tool> {
        self.active_tool_id
            .as_deref()
            .and_then(|id| self.get_tool(id))
    }

    /// Make `id` the active tool.
    ///
    /// The previously active tool is deactivated first. If it refuses, the
    /// activation is abandoned and the previous tool stays active; a plain
    /// hand-over would go on activating the target and end up with two
    /// active tools. If the target's own activation fails, no tool is left
    /// active and the previous one is not restored.
    pub async fn activate_tool(&mut self, id: &str) -> bool {
        if !self.tools.contains_key(id) {
            tracing::warn!(tool = %id, "Cannot activate: tool is not registered");
            return false;
        }

        if let Some(previous) = self.active_tool_id.clone()
            && previous != id
            && !self.deactivate_tool(&previous).await
        {
            tracing::warn!(
                tool = %id,
                previous = %previous,
                "Activation aborted, previous tool refused to deactivate"
            );
            return false;
        }

        let Some(tool) = self.tools.get_mut(id) else {
            return false;
        };
        if !tool.activate().await {
            self.active_tool_id = None;
            return false;
        }

        let tool_ref = tool.core().tool_ref();
        self.active_tool_id = Some(id.to_string());
        tracing::info!(tool = %id, "Activated tool");
        self.event_bus
            .emit(&EditorEvent::ManagerToolActivated(tool_ref));
        true
    }

    /// Deactivate `id`, which must be the active tool.
    pub async fn deactivate_tool(&mut self, id: &str) -> bool {
        let Some(tool) = self.tools.get_mut(id) else {
            tracing::warn!(tool = %id, "Cannot deactivate: tool is not registered");
            return false;
        };
        if self.active_tool_id.as_deref() != Some(id) {
            tracing::warn!(tool = %id, "Tool is not currently active");
            return false;
        }
        if !tool.deactivate().await {
            return false;
        }

        let tool_ref = tool.core().tool_ref();
        self.active_tool_id = None;
        tracing::info!(tool = %id, "Deactivated tool");
        self.event_bus
            .emit(&EditorEvent::ManagerToolDeactivated(tool_ref));
        true
    }

    fn resolve_target(&self, command: &Command) -> Result<String, ToolError> {
        if let Some(tool_id) = &command.tool_id {
            return if self.tools.contains_key(tool_id) {
                Ok(tool_id.clone())
            } else {
                Err(ToolError::ToolNotRegistered(tool_id.clone()))
            };
        }

        if let Some(active) = self.active_tool_id.as_deref() {
            return Ok(active.to_string());
        }

        self.ordered()
            .find(|t| t.can_handle_command(command))
            .map(|t| t.id().to_string())
            .ok_or_else(|| ToolError::NoToolFound(command.command_type.clone()))
    }

    /// Route a command to its tool and run it.
    pub async fn execute_command(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        if command.command_type.trim().is_empty() {
            return Err(ToolError::InvalidCommand("missing type".into()));
        }

        let target = self.resolve_target(command)?;
        let Some(tool) = self.tools.get_mut(&target) else {
            return Err(ToolError::ToolNotRegistered(target));
        };

        self.event_bus
            .emit(&EditorEvent::ManagerCommandExecuting(CommandEvent::executing(
                Some(&target),
                command,
            )));

        match tool.execute_command(command).await {
            Ok(result) => {
                self.event_bus
                    .emit(&EditorEvent::ManagerCommandExecuted(CommandEvent::executed(
                        Some(&target),
                        command,
                        &result,
                    )));
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    tool = %target,
                    command = %command.command_type,
                    error = %e,
                    "Command failed"
                );
                self.event_bus
                    .emit(&EditorEvent::ManagerCommandFailed(CommandEvent::failed(
                        Some(&target),
                        command,
                        &e,
                    )));
                Err(e)
            }
        }
    }

    /// Deactivate the active tool, dispose and drop every tool.
    pub async fn dispose(&mut self) {
        if let Some(active) = self.active_tool_id.clone() {
            self.deactivate_tool(&active).await;
            self.active_tool_id = None;
        }

        for id in std::mem::take(&mut self.order) {
            if let Some(mut tool) = self.tools.remove(&id)
                && let Err(e) = tool.dispose().await
            {
                tracing::error!(tool = %id, error = %e, "Tool dispose failed");
            }
        }
        self.tools.clear();
        self.initialized = false;

        tracing::debug!("Tool manager disposed");
        self.event_bus.emit(&EditorEvent::ManagerDisposed(()));
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("tools", &self.order)
            .field("active", &self.active_tool_id)
            .finish()
    }
}
