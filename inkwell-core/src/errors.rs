// inkwell-core/src/errors.rs
use thiserror::Error;

/// Errors that can end a conversation turn.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Startup problem: bad configuration, missing provider, invalid tool catalog.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error during interaction with the AI model API.
    #[error("API Error: {0}")]
    Api(#[source] anyhow::Error),

    /// Error during user interaction.
    #[error("User Interaction Error: {0}")]
    Ui(#[source] anyhow::Error),
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Config(msg.into())
    }
}

/// Failure of a single mail tool. Kept typed up to the point where the
/// result is written into the conversation history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Missing or malformed arguments, detected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The mail service rejected the request or could not be reached.
    #[error("{context}: {detail}")]
    Provider { context: String, detail: String },

    /// The language model failed to draft a body.
    #[error("Failed to generate email content: {0}")]
    Generation(String),

    /// The model asked for a tool outside the registry.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ToolError::Validation(msg.into())
    }

    /// Wraps a transport/provider failure, keeping the provider's detail text.
    pub fn provider(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ToolError::Provider {
            context: context.into(),
            detail: err.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation",
            ToolError::Provider { .. } => "provider",
            ToolError::Generation(_) => "generation",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }

    /// Flattens the error into the text inserted into history as the tool result.
    pub fn to_tool_output(&self, tool_name: &str) -> String {
        match self {
            ToolError::UnknownTool(_) => self.to_string(),
            _ => format!("Error executing tool '{}': {}", tool_name, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_output_is_not_prefixed() {
        let err = ToolError::UnknownTool("delete_everything".to_string());
        assert_eq!(
            err.to_tool_output("delete_everything"),
            "Unknown tool: delete_everything"
        );
        assert_eq!(err.kind(), "unknown_tool");
    }

    #[test]
    fn test_provider_output_carries_detail_and_tool_name() {
        let err = ToolError::provider("An error occurred while fetching email", "404 Not Found");
        let text = err.to_tool_output("read_email");
        assert_eq!(
            text,
            "Error executing tool 'read_email': An error occurred while fetching email: 404 Not Found"
        );
    }
}
