//! Plugin bridge
//!
//! Plugins contribute tools at activation time through a constrained
//! [`PluginToolApi`]; the [`ToolIntegration`] keeps track of which plugin
//! owns which tool so deactivation removes exactly that plugin's tools.

pub mod integration;
pub mod plugin;

pub use integration::ToolIntegration;
pub use plugin::{InMemoryPluginHost, PluginHost, PluginManifest, PluginToolApi, ToolPlugin};
