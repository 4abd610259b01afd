//! Tool domain value objects: commands and command results
//!
//! Both types are plain data objects on the wire: a flat JSON object with a
//! discriminating `type` (commands) or `success` flag (results) and the
//! remaining keys as payload.
//!
//! ```json
//! {"type": "layout.moveElement", "toolId": "layout-editor", "id": "el-1", "x": 17, "y": 4}
//! {"success": true, "message": "Element moved", "x": 20, "y": 0}
//! ```

use crate::core::error::ToolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed request routed to the tool that can handle it.
///
/// Commands are transient: constructed by a caller and consumed once by
/// `execute_command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command type, e.g. `image.crop`
    #[serde(rename = "type")]
    pub command_type: String,
    /// Explicit target tool, bypassing active-tool resolution
    #[serde(rename = "toolId", default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Remaining command parameters
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Command {
    pub fn new(command_type: impl Into<String>) -> Self {
        Self {
            command_type: command_type.into(),
            tool_id: None,
            payload: Map::new(),
        }
    }

    /// Parse a command from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        match value.get("type") {
            Some(Value::String(t)) if !t.trim().is_empty() => {}
            _ => {
                return Err(ToolError::InvalidCommand(
                    "command must carry a non-empty string `type`".to_string(),
                ));
            }
        }
        serde_json::from_value(value).map_err(|e| ToolError::InvalidCommand(e.to_string()))
    }

    pub fn for_tool(mut self, tool_id: impl Into<String>) -> Self {
        self.tool_id = Some(tool_id.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// The part of the type before the first `.`, e.g. `image` for `image.crop`.
    pub fn prefix(&self) -> &str {
        self.command_type
            .split_once('.')
            .map(|(p, _)| p)
            .unwrap_or(&self.command_type)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ToolError> {
        self.get_str(key)
            .ok_or_else(|| ToolError::missing_argument(key))
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, ToolError> {
        self.get_f64(key)
            .ok_or_else(|| ToolError::missing_argument(key))
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, ToolError> {
        self.get_i64(key)
            .ok_or_else(|| ToolError::missing_argument(key))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Deserialize an optional structured argument.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ToolError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| ToolError::invalid_argument(format!("{}: {}", key, e))),
        }
    }

    pub fn require_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ToolError> {
        self.get_as(key)?
            .ok_or_else(|| ToolError::missing_argument(key))
    }
}

/// Outcome of a successfully dispatched command.
///
/// A dispatched command can still report `success: false` (e.g. "Nothing
/// to undo"); callers must check both the flag and the `Err` path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            fields: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            fields: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach a serializable value; unserializable values become `null`.
    pub fn with_json<T: Serialize>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.fields.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let cmd = Command::from_value(json!({
            "type": "layout.moveElement",
            "toolId": "layout-editor",
            "id": "el-1",
            "x": 17
        }))
        .unwrap();

        assert_eq!(cmd.command_type, "layout.moveElement");
        assert_eq!(cmd.tool_id.as_deref(), Some("layout-editor"));
        assert_eq!(cmd.get_str("id"), Some("el-1"));
        assert_eq!(cmd.get_f64("x"), Some(17.0));
        assert!(!cmd.payload.contains_key("type"));
        assert_eq!(cmd.prefix(), "layout");
    }

    #[test]
    fn test_command_without_type_is_invalid() {
        let err = Command::from_value(json!({"toolId": "x"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidCommand(_)));
    }

    #[test]
    fn test_require_reports_missing_key() {
        let cmd = Command::new("image.resize").with_arg("width", 10);
        assert_eq!(cmd.require_f64("width").unwrap(), 10.0);
        assert_eq!(
            cmd.require_f64("height").unwrap_err(),
            ToolError::missing_argument("height")
        );
    }

    #[test]
    fn test_null_arguments_are_absent() {
        let cmd = Command::new("text.insert").with_arg("position", Value::Null);
        assert!(!cmd.has("position"));
        assert_eq!(cmd.get_i64("position"), None);
    }

    #[test]
    fn test_get_as_structured() {
        let cmd = Command::new("layout.alignElements").with_arg("ids", json!(["a", "b"]));
        let ids: Vec<String> = cmd.require_as("ids").unwrap();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(cmd.get_as::<Vec<String>>("missing").unwrap().is_none());
    }

    #[test]
    fn test_result_flattens_fields() {
        let result = CommandResult::ok().with_message("done").with_field("width", 20);
        let json = result.to_value();
        assert_eq!(json, json!({"success": true, "message": "done", "width": 20}));
    }
}
