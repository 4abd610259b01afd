//! Console output formatter for script results

use crate::output::formatter::OutputFormatter;
use crate::script::{ScriptReport, StepOutcome};
use colored::Colorize;
use inkframe_domain::ToolMetadata;
use serde_json::Value;

/// Formats script reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format(report: &ScriptReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Script Results"));
        output.push('\n');

        for step in &report.steps {
            output.push_str(&Self::format_step(step));
        }

        let failures = report.failures();
        let summary = format!(
            "{} steps, {} succeeded, {} failed",
            report.steps.len(),
            report.steps.len() - failures,
            failures
        );
        output.push('\n');
        if failures == 0 {
            output.push_str(&summary.green().bold().to_string());
        } else {
            output.push_str(&summary.red().bold().to_string());
        }
        output.push_str(&Self::footer());

        output
    }

    fn format_step(step: &StepOutcome) -> String {
        let title = format!("── {}. {} ──", step.index, step.command_type);
        let mut output = if step.succeeded() {
            format!("\n{}\n", title.yellow().bold())
        } else {
            format!("\n{}\n", title.red().bold())
        };

        if let Some(error) = &step.error {
            output.push_str(&format!("  {} {}\n", "Error:".red(), error));
        }
        if let Some(result) = &step.result {
            if let Some(message) = &result.message {
                output.push_str(&format!("  {}\n", message));
            }
            for (key, value) in &result.fields {
                output.push_str(&format!("  {} {}\n", format!("{}:", key).cyan(), Self::value(value)));
            }
        }
        output
    }

    /// Scalars inline, structures as indented JSON.
    fn value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                let json = serde_json::to_string_pretty(value).unwrap_or_default();
                format!("\n{}", Self::indent(&json, "    "))
            }
            other => other.to_string(),
        }
    }

    /// Format as JSON
    pub fn format_json(report: &ScriptReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Table of registered tools, for `--show-tools`-style listings.
    pub fn format_tools(tools: &[ToolMetadata], active: Option<&str>) -> String {
        let mut output = Self::section_header("Tools");
        for tool in tools {
            let marker = if Some(tool.id.as_str()) == active {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            output.push_str(&format!(
                "{} {:<16} {:<10} {}\n",
                marker,
                tool.id.bold(),
                tool.tool_type,
                tool.name.dimmed()
            ));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &ScriptReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &ScriptReport) -> String {
        Self::format_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_domain::CommandResult;

    fn report() -> ScriptReport {
        ScriptReport {
            steps: vec![
                StepOutcome {
                    index: 1,
                    command_type: "layout.addElement".into(),
                    result: Some(CommandResult::ok().with_field("elementId", "element_1")),
                    error: None,
                },
                StepOutcome {
                    index: 2,
                    command_type: "image.crop".into(),
                    result: None,
                    error: Some("no image loaded".into()),
                },
            ],
        }
    }

    #[test]
    fn test_format_lists_steps_and_summary() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());
        assert!(text.contains("── 1. layout.addElement ──"));
        assert!(text.contains("elementId: element_1"));
        assert!(text.contains("Error: no image loaded"));
        assert!(text.contains("2 steps, 1 succeeded, 1 failed"));
    }

    #[test]
    fn test_format_json_is_parseable() {
        let json: Value = serde_json::from_str(&ConsoleFormatter::format_json(&report())).unwrap();
        assert_eq!(json["steps"][0]["result"]["elementId"], "element_1");
        assert_eq!(json["steps"][1]["error"], "no image loaded");
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
