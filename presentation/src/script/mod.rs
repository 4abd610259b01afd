//! JSON command scripts

pub mod runner;

pub use runner::{ScriptReport, ScriptRunner, StepOutcome, parse_script};
