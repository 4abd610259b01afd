//! Output formatter trait

use crate::script::ScriptReport;

/// Trait for formatting script reports
pub trait OutputFormatter {
    /// Human-readable report, one block per step
    fn format(&self, report: &ScriptReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &ScriptReport) -> String;
}
