// inkwell-core/src/models/tools.rs
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

// --- Structs for AI Tool Interaction ---

/// Represents a tool call requested by the AI model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String, // Usually "function"
    pub function: ToolFunction,
}

/// Represents the function call details within a ToolCall.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolFunction {
    pub name: String,
    /// Arguments are expected to be a JSON string by the AI model
    pub arguments: String,
}

// --- Tool Definition and Input ---

/// Defines the schema for a tool that can be presented to the AI.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParametersDefinition,
}

/// Defines the parameters structure for a tool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParametersDefinition {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: HashMap<String, ToolParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Defines a single parameter within a tool's schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: String,
}

/// Represents the type of a tool parameter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// Represents the input arguments provided for a tool execution at runtime.
/// Uses a HashMap to store arguments generically.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ToolInput {
    pub arguments: HashMap<String, JsonValue>,
}

impl ToolInput {
    /// Parses the raw JSON argument string from a [`ToolCall`].
    /// An empty string is treated as an empty argument object.
    pub fn from_json_str(arguments: &str) -> Result<Self, serde_json::Error> {
        if arguments.trim().is_empty() {
            return Ok(Self::default());
        }
        let arguments: HashMap<String, JsonValue> = serde_json::from_str(arguments)?;
        Ok(Self { arguments })
    }

    /// Returns a string argument, treating JSON null as absent.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(JsonValue::as_str)
    }

    /// Returns an unsigned integer argument. Numeric strings are accepted
    /// since models occasionally quote numbers.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.arguments.get(name)? {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_input_from_empty_string() {
        let input = ToolInput::from_json_str("  ").unwrap();
        assert!(input.arguments.is_empty());
    }

    #[test]
    fn test_tool_input_accessors() {
        let input =
            ToolInput::from_json_str(r#"{"email_id": "abc", "max_results": "5", "n": null}"#)
                .unwrap();
        assert_eq!(input.get_str("email_id"), Some("abc"));
        assert_eq!(input.get_u64("max_results"), Some(5));
        assert_eq!(input.get_str("n"), None);
        assert_eq!(input.get_str("missing"), None);
    }

    #[test]
    fn test_tool_input_rejects_non_object() {
        assert!(ToolInput::from_json_str("[1, 2]").is_err());
    }
}
