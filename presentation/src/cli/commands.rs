//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for script results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured report, one block per step
    Pretty,
    /// JSON output
    Json,
}

/// CLI arguments for inkframe
#[derive(Parser, Debug)]
#[command(name = "inkframe")]
#[command(author, version, about = "Comic editor tools driven by command scripts")]
#[command(long_about = r#"
Inkframe runs a script of editor commands through a fully wired session:
image, text and layout editors, the OCR and translation integrations, and
the unified editor interface.

A script is a JSON array of commands. Tool commands are routed to the
editor that handles them; `ui.*` steps drive the editor interface:

  [
    {"type": "ui.loadImage", "imageId": "page-1", "path": "page-1.png"},
    {"type": "ui.performOcrAndTranslation"},
    {"type": "layout.moveElement", "id": "element_1", "x": 40, "y": 12}
  ]

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./inkframe.toml     Project-level config
3. ~/.config/inkframe/config.toml   Global config
Environment variables prefixed with INKFRAME_ override all files.

Example:
  inkframe page-1.json
  inkframe --tool layout-editor --output json script.json
  inkframe - < script.json
"#)]
pub struct Cli {
    /// Path to the JSON command script (`-` reads stdin)
    pub script: Option<PathBuf>,

    /// Tool to activate before the script runs
    #[arg(short, long, value_name = "TOOL_ID")]
    pub tool: Option<String>,

    /// Output format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Stop at the first failing step
    #[arg(long)]
    pub fail_fast: bool,

    /// Word list (one word per line) for `text.checkSpelling`
    #[arg(long, value_name = "PATH")]
    pub dictionary: Option<PathBuf>,

    /// Append every bus event to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Write tracing output to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// List the registered tools and exit
    #[arg(long)]
    pub list_tools: bool,
}
