//! Configuration file loading for inkframe
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `INKFRAME_*` environment variables (`INKFRAME_TOOLS__GRID_SIZE=8`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./inkframe.toml` or `./.inkframe.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/inkframe/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileOcrConfig, FileOutputConfig, FileOutputFormat,
    FileTermConfig, FileTextStyleConfig, FileToolsConfig, FileTranslationConfig,
};
pub use loader::ConfigLoader;
