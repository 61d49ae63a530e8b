// inkwell-core/src/lib.rs

#![doc = include_str!("../../README.md")]

pub mod api;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod errors;
pub mod mail;
pub mod models;
pub mod providers;
pub mod session;
pub mod tools;


use anyhow::Result;

pub use composer::Composer;
pub use config::{InkwellConfig, ModelConfig, RuntimeSecrets};
pub use conversation::{Conversation, TurnReply, TurnState};
pub use dispatch::Dispatcher;
pub use errors::{AgentError, ToolError};
pub use mail::{gmail::GmailClient, MailService, Mailbox};
pub use models::chat::{ApiResponse, ChatMessage, Choice, CompletionOptions};
pub use models::tools::{
    ToolCall, ToolDefinition, ToolFunction, ToolInput, ToolParameter, ToolParameterType,
    ToolParametersDefinition,
};
pub use providers::{openai::OpenAIProvider, Provider, ProviderRegistry};
pub use session::run_session;
pub use tools::ToolRegistry;

pub use async_trait::async_trait;

/// Trait defining the interface for providing tools to a [`Conversation`].
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Returns the definitions of all tools available.
    fn get_tool_definitions(&self) -> Vec<ToolDefinition>;
    /// Executes the tool with the given name and input arguments.
    async fn execute_tool(&self, tool_name: &str, input: ToolInput) -> Result<String, ToolError>;
}

/// Terminal-side collaborator for [`run_session`].
#[async_trait]
pub trait UserInteraction: Send {
    /// Next line of input, or `None` once input is exhausted.
    async fn read_input(&mut self, prompt: &str) -> Result<Option<String>>;
    /// Called before a turn is sent to the model.
    fn turn_started(&mut self) {}
    fn show_reply(&mut self, reply: &TurnReply);
    fn show_error(&mut self, error: &AgentError);
    fn show_message(&mut self, message: &str);
}

/// Details the execution result of a single tool call within a [`TurnReply`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolExecutionResult {
    /// The unique ID associated with the AI's request to call this tool.
    pub tool_call_id: String,
    /// The name of the tool that was executed.
    pub tool_name: String,
    /// The input arguments passed to the tool (represented as a JSON value).
    pub input: serde_json::Value,
    /// The string output produced by the tool (or an error message if status is Failure).
    pub output: String,
    /// The status of the execution.
    pub status: ToolExecutionStatus,
}

/// Indicates whether a tool execution succeeded or failed.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum ToolExecutionStatus {
    /// The tool executed successfully.
    Success,
    /// The tool failed during execution or argument parsing.
    Failure,
}
