//! Domain error types

use thiserror::Error;

/// Errors raised by tools and the components that route commands to them.
///
/// Registration problems are not represented here: registries and managers
/// signal those with a `false` return and a logged warning instead.
///
/// | Variant | Raised by | Meaning |
/// |---------|-----------|---------|
/// | `InvalidCommand` | command parsing | Malformed command object |
/// | `UnsupportedCommand` | `Tool::execute_command` | Type not in the tool's dispatch table |
/// | `NoToolFound` | `ToolManager::execute_command` | No registered tool accepts the command |
/// | `ToolNotRegistered` | `ToolManager::execute_command` | Explicit `toolId` is unknown |
/// | `Disposed` | lifecycle | Tool was disposed and cannot be revived |
/// | `InvalidArgument` / `NotFound` / `InvalidState` | command handlers | Caller errors |
/// | `Hook` | lifecycle hooks | Tool-specific activate/deactivate/dispose failure |
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Tool {tool_id} cannot handle command type: {command_type}")]
    UnsupportedCommand {
        tool_id: String,
        command_type: String,
    },

    #[error("No tool found to handle command: {0}")]
    NoToolFound(String),

    #[error("Tool with id {0} is not registered")]
    ToolNotRegistered(String),

    #[error("Tool {0} is not initialized")]
    NotInitialized(String),

    #[error("Tool {0} has been disposed")]
    Disposed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Lifecycle hook failed: {0}")]
    Hook(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ToolError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn missing_argument(key: &str) -> Self {
        Self::InvalidArgument(format!("Missing required argument: {}", key))
    }

    /// Stable machine-readable code, used in failure event payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::InvalidCommand(_) => "INVALID_COMMAND",
            ToolError::UnsupportedCommand { .. } => "UNSUPPORTED_COMMAND",
            ToolError::NoToolFound(_) => "NO_TOOL_FOUND",
            ToolError::ToolNotRegistered(_) => "TOOL_NOT_REGISTERED",
            ToolError::NotInitialized(_) => "NOT_INITIALIZED",
            ToolError::Disposed(_) => "DISPOSED",
            ToolError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ToolError::NotFound(_) => "NOT_FOUND",
            ToolError::InvalidState(_) => "INVALID_STATE",
            ToolError::Hook(_) => "HOOK_FAILED",
            ToolError::Surface(_) => "SURFACE_ERROR",
            ToolError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the error stems from the command routing layer rather than
    /// from the tool that handled the command.
    pub fn is_routing_error(&self) -> bool {
        matches!(
            self,
            ToolError::NoToolFound(_)
                | ToolError::ToolNotRegistered(_)
                | ToolError::UnsupportedCommand { .. }
        )
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e.to_string())
    }
}
