// inkwell-core/src/tools.rs

//! The catalog of mail tools offered to the model.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::models::tools::ToolDefinition;

pub const LIST_EMAILS: &str = "list_emails";
pub const READ_EMAIL: &str = "read_email";
pub const WRITE_EMAIL: &str = "write_email";
pub const REPLY_EMAIL: &str = "reply_email";

/// Ordered, immutable set of tool definitions.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// The four mail tools, in the order they are offered to the model.
    pub fn mail_tools() -> Result<Self> {
        let definitions = [
            list_emails_definition(),
            read_email_definition(),
            write_email_definition(),
            reply_email_definition(),
        ]
        .into_iter()
        .map(|value| {
            serde_json::from_value::<ToolDefinition>(value)
                .context("Failed to load built-in tool definition")
        })
        .collect::<Result<Vec<_>>>()?;
        Self::from_definitions(definitions)
    }

    pub fn from_definitions(definitions: Vec<ToolDefinition>) -> Result<Self> {
        let registry = Self { definitions };
        registry.validate()?;
        Ok(registry)
    }

    /// Structural checks only; argument values are checked at dispatch time.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if definition.name.trim().is_empty() {
                return Err(anyhow!("Tool definition has an empty name."));
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(anyhow!("Duplicate tool name '{}'.", definition.name));
            }
            if definition.parameters.param_type != "object" {
                return Err(anyhow!(
                    "Tool '{}' parameters must have type 'object', found '{}'.",
                    definition.name,
                    definition.parameters.param_type
                ));
            }
            for required in &definition.parameters.required {
                if !definition.parameters.properties.contains_key(required) {
                    return Err(anyhow!(
                        "Tool '{}' requires '{}' which is not a declared property.",
                        definition.name,
                        required
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }
}

fn list_emails_definition() -> Value {
    json!({
        "name": LIST_EMAILS,
        "description": "Lists recent emails from the user's inbox.",
        "parameters": {
            "type": "object",
            "properties": {
                "max_results": {
                    "type": "integer",
                    "description": "The maximum number of emails to list. Defaults to 10."
                }
            }
        }
    })
}

fn read_email_definition() -> Value {
    json!({
        "name": READ_EMAIL,
        "description": "Reads and summarizes a specific email given its ID.",
        "parameters": {
            "type": "object",
            "properties": {
                "email_id": {
                    "type": "string",
                    "description": "The ID of the email to read."
                }
            },
            "required": ["email_id"]
        }
    })
}

fn write_email_definition() -> Value {
    json!({
        "name": WRITE_EMAIL,
        "description": "Composes and sends a new email to a recipient.",
        "parameters": {
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "The recipient's email address."
                },
                "subject": {
                    "type": "string",
                    "description": "The subject of the email."
                },
                "body_instruction": {
                    "type": "string",
                    "description": "Instructions for generating the body content of the email."
                }
            },
            "required": ["to", "subject", "body_instruction"]
        }
    })
}

fn reply_email_definition() -> Value {
    json!({
        "name": REPLY_EMAIL,
        "description": "Replies to a specific email with a given instruction for the reply content.",
        "parameters": {
            "type": "object",
            "properties": {
                "original_email_id": {
                    "type": "string",
                    "description": "The ID of the original email to reply to."
                },
                "reply_instruction": {
                    "type": "string",
                    "description": "Instructions for generating the reply text."
                }
            },
            "required": ["original_email_id", "reply_instruction"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tools::ToolParameterType;

    #[test]
    fn test_mail_tools_order_and_shape() {
        let registry = ToolRegistry::mail_tools().unwrap();
        let names: Vec<&str> = registry
            .definitions()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec![LIST_EMAILS, READ_EMAIL, WRITE_EMAIL, REPLY_EMAIL]);

        let list = &registry.definitions()[0];
        assert!(list.parameters.required.is_empty());
        assert_eq!(
            list.parameters.properties["max_results"].param_type,
            ToolParameterType::Integer
        );
        let write = &registry.definitions()[2];
        assert_eq!(write.parameters.required, vec!["to", "subject", "body_instruction"]);
        assert!(registry.contains(REPLY_EMAIL));
        assert!(!registry.contains("delete_email"));
    }

    #[test]
    fn test_validate_rejects_undeclared_required() {
        let mut definition: ToolDefinition =
            serde_json::from_value(read_email_definition()).unwrap();
        definition.parameters.required.push("folder".to_string());
        let err = ToolRegistry::from_definitions(vec![definition]).unwrap_err();
        assert!(err.to_string().contains("requires 'folder'"));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_types() {
        let read: ToolDefinition = serde_json::from_value(read_email_definition()).unwrap();
        let err = ToolRegistry::from_definitions(vec![read.clone(), read.clone()]).unwrap_err();
        assert!(err.to_string().contains("Duplicate tool name 'read_email'"));

        let mut bad = read;
        bad.parameters.param_type = "array".to_string();
        assert!(ToolRegistry::from_definitions(vec![bad]).is_err());
    }
}
