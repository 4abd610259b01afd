//! Tool trait and shared tool state
//!
//! Every editor tool implements [`Tool`]. The trait's provided methods give
//! all tools the same lifecycle and command protocol; a concrete tool only
//! supplies its [`ToolCore`], its command dispatch and optional hooks.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──initialize()──▶ Initialized ──activate()──▶ Active
//!                                             ▲            │
//!                                             └─deactivate()┘ (Inactive)
//!
//! any state ──dispose()──▶ Disposed (terminal)
//! ```
//!
//! `activate()` and `execute_command()` initialize lazily. Hook failures in
//! `activate`/`deactivate` are logged and reported as `false`, leaving the
//! state unchanged; `dispose` propagates hook errors.
//!
//! # Command dispatch
//!
//! Concrete tools route commands through a static [`CommandTable`] mapping
//! each command type to a handler function:
//!
//! ```ignore
//! fn commands() -> &'static CommandTable<Self> {
//!     static TABLE: OnceLock<CommandTable<ImageEditorTool>> = OnceLock::new();
//!     TABLE.get_or_init(|| {
//!         CommandTable::new()
//!             .with("image.crop", Self::crop)
//!             .with("image.undo", Self::undo)
//!     })
//! }
//! ```

use super::context::ToolContext;
use crate::events::EventBus;
use async_trait::async_trait;
use inkframe_domain::event::{CommandEvent, ToolRef};
use inkframe_domain::{Command, CommandResult, EditorEvent, ToolError, ToolLifecycle, ToolMetadata};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Handler for one command type.
pub type CommandHandler<T> = fn(&mut T, &Command) -> Result<CommandResult, ToolError>;

/// Map from command type to handler function.
pub struct CommandTable<T: 'static> {
    handlers: BTreeMap<&'static str, CommandHandler<T>>,
}

impl<T: 'static> CommandTable<T> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    pub fn with(mut self, command_type: &'static str, handler: CommandHandler<T>) -> Self {
        self.handlers.insert(command_type, handler);
        self
    }

    pub fn contains(&self, command_type: &str) -> bool {
        self.handlers.contains_key(command_type)
    }

    /// Registered command types, sorted.
    pub fn command_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Run the handler for `command` against `tool`.
    pub fn dispatch(
        &self,
        tool: &mut T,
        tool_id: &str,
        command: &Command,
    ) -> Result<CommandResult, ToolError> {
        let handler = self
            .handlers
            .get(command.command_type.as_str())
            .ok_or_else(|| ToolError::UnsupportedCommand {
                tool_id: tool_id.to_string(),
                command_type: command.command_type.clone(),
            })?;
        handler(tool, command)
    }
}

impl<T: 'static> Default for CommandTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity, lifecycle and wiring shared by every tool.
#[derive(Debug)]
pub struct ToolCore {
    id: String,
    tool_type: String,
    name: String,
    description: String,
    category: String,
    capabilities: BTreeSet<String>,
    dependencies: BTreeSet<String>,
    plugin_id: Option<String>,
    lifecycle: ToolLifecycle,
    event_bus: Option<EventBus>,
    context: Option<Arc<ToolContext>>,
}

impl ToolCore {
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
            lifecycle: ToolLifecycle::Created,
            event_bus: None,
            context: None,
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

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    pub fn with_dependency(mut self, tool_id: impl Into<String>) -> Self {
        self.dependencies.insert(tool_id.into());
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tool_type(&self) -> &str {
        &self.tool_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    pub fn set_plugin_id(&mut self, plugin_id: impl Into<String>) {
        self.plugin_id = Some(plugin_id.into());
    }

    pub fn lifecycle(&self) -> ToolLifecycle {
        self.lifecycle
    }

    pub fn set_lifecycle(&mut self, lifecycle: ToolLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.event_bus.as_ref()
    }

    pub fn set_event_bus(&mut self, bus: EventBus) {
        self.event_bus = Some(bus);
    }

    pub fn context(&self) -> Option<&Arc<ToolContext>> {
        self.context.as_ref()
    }

    pub fn set_context(&mut self, context: Arc<ToolContext>) {
        self.context = Some(context);
    }

    pub fn tool_ref(&self) -> ToolRef {
        let mut tool_ref = ToolRef::new(&self.id, &self.tool_type);
        tool_ref.plugin_id = self.plugin_id.clone();
        tool_ref
    }

    pub fn metadata(&self) -> ToolMetadata {
        let mut metadata = ToolMetadata::new(&self.id, &self.tool_type)
            .with_name(&self.name)
            .with_description(&self.description)
            .with_category(&self.category);
        metadata.capabilities = self.capabilities.clone();
        metadata.dependencies = self.dependencies.clone();
        metadata.plugin_id = self.plugin_id.clone();
        metadata.initialized = self.lifecycle.is_initialized();
        metadata.active = self.lifecycle.is_active();
        metadata
    }

    /// Publish on the tool's bus; silently dropped before initialization.
    pub fn emit(&self, event: EditorEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(&event);
        }
    }
}

/// A pluggable editor tool driven by [`Command`]s.
#[async_trait]
pub trait Tool: Send + Sync {
    fn core(&self) -> &ToolCore;

    fn core_mut(&mut self) -> &mut ToolCore;

    /// Whether the dispatch table knows `command_type`.
    fn supports_command(&self, command_type: &str) -> bool;

    /// Every command type the tool accepts.
    fn command_types(&self) -> Vec<&'static str>;

    /// Run a supported command. Called by [`Tool::execute_command`] after
    /// the lifecycle checks.
    async fn handle_command(&mut self, command: &Command) -> Result<CommandResult, ToolError>;

    async fn on_initialize(&mut self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn on_activate(&mut self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn on_deactivate(&mut self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn on_dispose(&mut self) -> Result<(), ToolError> {
        Ok(())
    }

    // ==================== Provided ====================

    fn id(&self) -> &str {
        self.core().id()
    }

    fn tool_type(&self) -> &str {
        self.core().tool_type()
    }

    fn lifecycle(&self) -> ToolLifecycle {
        self.core().lifecycle()
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle().is_initialized()
    }

    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }

    fn metadata(&self) -> ToolMetadata {
        self.core().metadata()
    }

    fn event_bus(&self) -> Option<&EventBus> {
        self.core().event_bus()
    }

    fn set_event_bus(&mut self, bus: EventBus) {
        self.core_mut().set_event_bus(bus);
    }

    fn can_handle_command(&self, command: &Command) -> bool {
        self.supports_command(&command.command_type)
    }

    /// Wire the tool to a context and run its initialization hook.
    ///
    /// Idempotent. The event bus is taken from the tool itself, else from
    /// the context, else a private bus is created.
    async fn initialize(&mut self, context: Option<Arc<ToolContext>>) -> Result<(), ToolError> {
        let lifecycle = self.lifecycle();
        if lifecycle.is_disposed() {
            return Err(ToolError::Disposed(self.id().to_string()));
        }
        if lifecycle.is_initialized() {
            return Ok(());
        }

        let core = self.core_mut();
        if let Some(context) = context {
            core.set_context(context);
        }
        if core.event_bus().is_none() {
            let bus = core
                .context()
                .map(|c| c.event_bus().clone())
                .unwrap_or_default();
            core.set_event_bus(bus);
        }

        self.on_initialize().await?;

        let core = self.core_mut();
        core.set_lifecycle(ToolLifecycle::Initialized);
        tracing::debug!(tool = %core.id(), "Tool initialized");
        core.emit(EditorEvent::ToolInitialized(core.tool_ref()));
        Ok(())
    }

    async fn activate(&mut self) -> bool {
        match self.lifecycle() {
            ToolLifecycle::Active => return true,
            ToolLifecycle::Disposed => {
                tracing::warn!(tool = %self.id(), "Cannot activate a disposed tool");
                return false;
            }
            ToolLifecycle::Created => {
                if let Err(e) = self.initialize(None).await {
                    tracing::error!(tool = %self.id(), error = %e, "Tool initialization failed");
                    return false;
                }
            }
            ToolLifecycle::Initialized | ToolLifecycle::Inactive => {}
        }

        if let Err(e) = self.on_activate().await {
            tracing::error!(tool = %self.id(), error = %e, "Tool activation failed");
            return false;
        }

        let core = self.core_mut();
        core.set_lifecycle(ToolLifecycle::Active);
        tracing::debug!(tool = %core.id(), "Tool activated");
        core.emit(EditorEvent::ToolActivated(core.tool_ref()));
        true
    }

    async fn deactivate(&mut self) -> bool {
        if !self.is_active() {
            return true;
        }

        if let Err(e) = self.on_deactivate().await {
            tracing::error!(tool = %self.id(), error = %e, "Tool deactivation failed");
            return false;
        }

        let core = self.core_mut();
        core.set_lifecycle(ToolLifecycle::Inactive);
        tracing::debug!(tool = %core.id(), "Tool deactivated");
        core.emit(EditorEvent::ToolDeactivated(core.tool_ref()));
        true
    }

    async fn execute_command(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
        if self.lifecycle().is_disposed() {
            return Err(ToolError::Disposed(self.id().to_string()));
        }
        if !self.is_initialized() {
            self.initialize(None).await?;
        }
        if !self.can_handle_command(command) {
            return Err(ToolError::UnsupportedCommand {
                tool_id: self.id().to_string(),
                command_type: command.command_type.clone(),
            });
        }

        let id = self.id().to_string();
        tracing::debug!(tool = %id, command = %command.command_type, "Executing command");
        self.core()
            .emit(EditorEvent::ToolCommandExecuting(CommandEvent::executing(
                Some(&id),
                command,
            )));

        match self.handle_command(command).await {
            Ok(result) => {
                self.core()
                    .emit(EditorEvent::ToolCommandExecuted(CommandEvent::executed(
                        Some(&id),
                        command,
                        &result,
                    )));
                Ok(result)
            }
            Err(e) => {
                tracing::debug!(tool = %id, command = %command.command_type, error = %e, "Command failed");
                self.core()
                    .emit(EditorEvent::ToolCommandFailed(CommandEvent::failed(
                        Some(&id),
                        command,
                        &e,
                    )));
                Err(e)
            }
        }
    }

    /// Deactivate, run the dispose hook and become permanently disposed.
    async fn dispose(&mut self) -> Result<(), ToolError> {
        if self.lifecycle().is_disposed() {
            return Ok(());
        }
        if self.is_active() {
            self.deactivate().await;
        }

        self.on_dispose().await?;

        let core = self.core_mut();
        core.set_lifecycle(ToolLifecycle::Disposed);
        tracing::debug!(tool = %core.id(), "Tool disposed");
        core.emit(EditorEvent::ToolDisposed(core.tool_ref()));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal tool used by the manager, integration and interface tests.

    use super::*;
    use std::sync::OnceLock;

    pub struct EchoTool {
        core: ToolCore,
        pub fail_activate: bool,
        pub fail_deactivate: bool,
        pub executed: Vec<String>,
    }

    impl EchoTool {
        pub fn new(id: &str) -> Self {
            Self {
                core: ToolCore::new(id, "echo")
                    .with_category("test")
                    .with_capabilities(["echo"]),
                fail_activate: false,
                fail_deactivate: false,
                executed: Vec::new(),
            }
        }

        pub fn failing_activate(mut self) -> Self {
            self.fail_activate = true;
            self
        }

        pub fn failing_deactivate(mut self) -> Self {
            self.fail_deactivate = true;
            self
        }

        fn commands() -> &'static CommandTable<Self> {
            static TABLE: OnceLock<CommandTable<EchoTool>> = OnceLock::new();
            TABLE.get_or_init(|| {
                CommandTable::new()
                    .with("echo.say", Self::say)
                    .with("echo.fail", Self::fail)
            })
        }

        fn say(&mut self, command: &Command) -> Result<CommandResult, ToolError> {
            let text = command.require_str("text")?.to_string();
            self.executed.push(text.clone());
            Ok(CommandResult::ok()
                .with_field("text", text)
                .with_field("toolId", self.core.id()))
        }

        fn fail(&mut self, _command: &Command) -> Result<CommandResult, ToolError> {
            Err(ToolError::invalid_state("echo failure"))
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
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

        async fn on_activate(&mut self) -> Result<(), ToolError> {
            if self.fail_activate {
                return Err(ToolError::Hook("activation refused".into()));
            }
            Ok(())
        }

        async fn on_deactivate(&mut self) -> Result<(), ToolError> {
            if self.fail_deactivate {
                return Err(ToolError::Hook("deactivation refused".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::EchoTool;
    use super::*;
    use crate::events::Listener;
    use inkframe_domain::EventKind;
    use std::sync::Mutex;

    fn recorder(bus: &EventBus, kinds: &[EventKind]) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in kinds {
            let seen = seen.clone();
            bus.on(
                kind.clone(),
                Listener::sync(move |event| {
                    seen.lock().unwrap().push(event.kind().to_string());
                    Ok(())
                }),
            );
        }
        seen
    }

    #[tokio::test]
    async fn test_initialize_takes_bus_from_context() {
        let bus = EventBus::new();
        let context = Arc::new(ToolContext::new(bus.clone()));
        let seen = recorder(&bus, &[EventKind::ToolInitialized]);

        let mut tool = EchoTool::new("echo");
        tool.initialize(Some(context)).await.unwrap();
        tool.initialize(None).await.unwrap();

        assert!(tool.event_bus().unwrap().same_bus(&bus));
        assert_eq!(tool.lifecycle(), ToolLifecycle::Initialized);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_activate_initializes_lazily_and_is_idempotent() {
        let mut tool = EchoTool::new("echo");
        assert!(tool.activate().await);
        assert!(tool.activate().await);
        assert!(tool.is_active());
        assert!(tool.event_bus().is_some());

        assert!(tool.deactivate().await);
        assert_eq!(tool.lifecycle(), ToolLifecycle::Inactive);
        assert!(tool.deactivate().await);
    }

    #[tokio::test]
    async fn test_hook_failure_leaves_state_unchanged() {
        let mut tool = EchoTool::new("echo").failing_activate();
        assert!(!tool.activate().await);
        assert_eq!(tool.lifecycle(), ToolLifecycle::Initialized);

        let mut tool = EchoTool::new("echo").failing_deactivate();
        assert!(tool.activate().await);
        assert!(!tool.deactivate().await);
        assert!(tool.is_active());
    }

    #[tokio::test]
    async fn test_execute_command_emits_lifecycle_events() {
        let bus = EventBus::new();
        let seen = recorder(
            &bus,
            &[
                EventKind::ToolCommandExecuting,
                EventKind::ToolCommandExecuted,
                EventKind::ToolCommandFailed,
            ],
        );
        let mut tool = EchoTool::new("echo");
        tool.set_event_bus(bus);

        let result = tool
            .execute_command(&Command::new("echo.say").with_arg("text", "hi"))
            .await
            .unwrap();
        assert_eq!(result.get_str("text"), Some("hi"));

        let err = tool
            .execute_command(&Command::new("echo.fail"))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::invalid_state("echo failure"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "tool.commandExecuting",
                "tool.commandExecuted",
                "tool.commandExecuting",
                "tool.commandFailed"
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_command_is_rejected() {
        let mut tool = EchoTool::new("echo");
        let err = tool
            .execute_command(&Command::new("image.crop"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::UnsupportedCommand {
                tool_id: "echo".into(),
                command_type: "image.crop".into()
            }
        );
    }

    #[tokio::test]
    async fn test_dispose_is_terminal() {
        let mut tool = EchoTool::new("echo");
        tool.activate().await;
        tool.dispose().await.unwrap();

        assert!(tool.lifecycle().is_disposed());
        assert!(!tool.activate().await);
        assert_eq!(
            tool.execute_command(&Command::new("echo.say")).await,
            Err(ToolError::Disposed("echo".into()))
        );
        assert!(tool.initialize(None).await.is_err());
    }

    #[test]
    fn test_metadata_mirrors_core() {
        let mut tool = EchoTool::new("echo");
        tool.core_mut().set_plugin_id("plugin-a");
        let metadata = tool.metadata();
        assert_eq!(metadata.id, "echo");
        assert_eq!(metadata.plugin_id.as_deref(), Some("plugin-a"));
        assert!(metadata.has_capability("echo"));
        assert!(!metadata.initialized);
    }
}
