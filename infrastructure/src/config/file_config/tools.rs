//! Tools configuration from TOML (`[tools]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [tools]
//! max_history_length = 100
//! grid_size = 8.0
//! snap_to_grid = true
//!
//! [tools.text]
//! font_family = "Anime Ace"
//! font_size = 14.0
//! color = "#202020"
//! ```

use inkframe_domain::DEFAULT_MAX_HISTORY;
use serde::{Deserialize, Serialize};

/// Raw tool defaults from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Undo depth of every editor tool
    pub max_history_length: usize,
    /// Layout grid spacing
    pub grid_size: f64,
    pub snap_to_grid: bool,
    /// Text editor default style
    pub text: FileTextStyleConfig,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY,
            grid_size: 10.0,
            snap_to_grid: true,
            text: FileTextStyleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTextStyleConfig {
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
}

impl Default for FileTextStyleConfig {
    fn default() -> Self {
        Self {
            font_family: "Comic Sans MS".to_string(),
            font_size: 16.0,
            color: "#000000".to_string(),
        }
    }
}
