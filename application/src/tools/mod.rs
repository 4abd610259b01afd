//! Tool orchestration: registry, context, lifecycle and command routing

pub mod context;
pub mod manager;
pub mod registry;
pub mod tool;

pub use context::{ChildContextOptions, ToolContext};
pub use manager::{SharedToolManager, ToolManager};
pub use registry::{DependencyCheck, RegistryStats, ToolRegistry};
pub use tool::{CommandHandler, CommandTable, Tool, ToolCore};
