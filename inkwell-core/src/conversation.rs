// inkwell-core/src/conversation.rs

//! The running conversation: history plus the two-phase tool turn.

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, trace, warn};

use crate::errors::AgentError;
use crate::models::chat::{ApiResponse, ChatMessage};
use crate::models::tools::{ToolCall, ToolInput};
use crate::providers::Provider;
use crate::{ToolExecutionResult, ToolExecutionStatus, ToolProvider};

/// Where the current turn is. Returns to `Idle` once a turn completes or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingModel,
    DirectAnswer,
    ToolRequested,
    ToolExecuting,
    AwaitingFinalAnswer,
}

/// What one call to [`Conversation::handle_turn`] produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReply {
    /// The assistant's final text, if the model produced any.
    pub content: Option<String>,
    /// The executed tool call, if there was one.
    pub tool_results: Vec<ToolExecutionResult>,
    /// Names of tool calls the model asked for beyond the first.
    pub dropped_tool_calls: Vec<String>,
    /// Set when the tool ran but the follow-up model call failed.
    pub model_error: Option<String>,
}

pub struct Conversation {
    provider: Arc<dyn Provider>,
    tools: Arc<dyn ToolProvider>,
    history: Vec<ChatMessage>,
    state: TurnState,
}

impl Conversation {
    /// Starts a conversation, seeding history with `system_prompt` when given.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolProvider>,
        system_prompt: Option<&str>,
    ) -> Self {
        let history = system_prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| vec![ChatMessage::system(p)])
            .unwrap_or_default();
        Self {
            provider,
            tools,
            history,
            state: TurnState::Idle,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn transition(&mut self, next: TurnState) {
        debug!(from = ?self.state, to = ?next, "Turn state transition");
        self.state = next;
    }

    async fn request(&mut self, with_tools: bool) -> Result<ChatMessage, AgentError> {
        let definitions = if with_tools {
            Some(self.tools.get_tool_definitions())
        } else {
            None
        };
        debug!(
            model = %self.provider.name(),
            num_messages = self.history.len(),
            with_tools,
            "Sending request to AI model."
        );
        let result = self
            .provider
            .get_completion(self.history.clone(), definitions.as_deref())
            .await
            .and_then(first_message);

        match result {
            Ok(message) => {
                trace!(message = ?message, "Assistant message");
                Ok(message)
            }
            Err(e) => {
                error!(error = ?e, "Model request failed during turn.");
                self.transition(TurnState::Idle);
                Err(AgentError::Api(e))
            }
        }
    }

    /// Runs one user turn: at most two model calls and at most one tool call.
    pub async fn handle_turn(&mut self, input: &str) -> Result<TurnReply, AgentError> {
        info!("Handling user turn.");
        self.history.push(ChatMessage::user(input));
        self.transition(TurnState::AwaitingModel);

        let message = self.request(true).await?;

        let mut tool_calls = match message.tool_calls {
            Some(calls) if !calls.is_empty() => calls,
            _ => {
                self.transition(TurnState::DirectAnswer);
                let content = message.content.clone();
                self.history.push(answer_entry(message.role, message.content));
                self.transition(TurnState::Idle);
                return Ok(TurnReply {
                    content,
                    ..Default::default()
                });
            }
        };

        self.transition(TurnState::ToolRequested);
        let tool_call = tool_calls.remove(0);
        let dropped_tool_calls: Vec<String> =
            tool_calls.into_iter().map(|c| c.function.name).collect();
        if !dropped_tool_calls.is_empty() {
            warn!(
                executed = %tool_call.function.name,
                dropped = ?dropped_tool_calls,
                "Model requested several tool calls; only the first is executed."
            );
        }
        self.history.push(ChatMessage {
            role: message.role,
            content: message.content,
            tool_calls: Some(vec![tool_call.clone()]),
            tool_call_id: None,
        });

        self.transition(TurnState::ToolExecuting);
        let result = self.run_tool(&tool_call).await;
        self.history
            .push(ChatMessage::tool(tool_call.id.clone(), result.output.clone()));

        self.transition(TurnState::AwaitingFinalAnswer);
        let final_message = match self.request(false).await {
            Ok(message) => message,
            Err(e) => {
                // The tool already ran; its result stays in history and is reported.
                warn!(tool_name = %result.tool_name, error = %e, "Final answer request failed after tool execution.");
                return Ok(TurnReply {
                    content: None,
                    tool_results: vec![result],
                    dropped_tool_calls,
                    model_error: Some(e.to_string()),
                });
            }
        };
        if final_message.has_tool_calls() {
            warn!("Model requested tools in its final answer; ignoring them.");
        }
        let content = final_message.content.clone();
        self.history
            .push(answer_entry(final_message.role, final_message.content));
        self.transition(TurnState::Idle);

        Ok(TurnReply {
            content,
            tool_results: vec![result],
            dropped_tool_calls,
            model_error: None,
        })
    }

    async fn run_tool(&self, tool_call: &ToolCall) -> ToolExecutionResult {
        let tool_name = &tool_call.function.name;
        trace!(arguments = %tool_call.function.arguments, "Raw tool arguments for '{}'", tool_name);

        let input = match ToolInput::from_json_str(&tool_call.function.arguments) {
            Ok(input) => input,
            Err(e) => {
                error!(tool_call_id = %tool_call.id, tool_name = %tool_name, error = %e, "Failed to parse arguments for tool '{}'.", tool_name);
                return ToolExecutionResult {
                    tool_call_id: tool_call.id.clone(),
                    tool_name: tool_name.clone(),
                    input: JsonValue::String(tool_call.function.arguments.clone()),
                    output: format!(
                        "Error parsing arguments for tool '{}': {}. Arguments received: {}",
                        tool_name, e, tool_call.function.arguments
                    ),
                    status: ToolExecutionStatus::Failure,
                };
            }
        };

        let input_json = serde_json::to_value(&input.arguments).unwrap_or(JsonValue::Null);
        let (output, status) = match self.tools.execute_tool(tool_name, input).await {
            Ok(output) => {
                info!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Tool '{}' executed successfully.", tool_name);
                (output, ToolExecutionStatus::Success)
            }
            Err(e) => {
                warn!(tool_call_id = %tool_call.id, tool_name = %tool_name, kind = e.kind(), error = %e, "Tool '{}' failed.", tool_name);
                (e.to_tool_output(tool_name), ToolExecutionStatus::Failure)
            }
        };

        ToolExecutionResult {
            tool_call_id: tool_call.id.clone(),
            tool_name: tool_name.clone(),
            input: input_json,
            output,
            status,
        }
    }
}

/// Assistant message without tool calls. Content is always set; chat endpoints
/// reject an assistant message with neither field.
fn answer_entry(role: String, content: Option<String>) -> ChatMessage {
    ChatMessage {
        role,
        content: Some(content.unwrap_or_default()),
        tool_calls: None,
        tool_call_id: None,
    }
}

fn first_message(response: ApiResponse) -> anyhow::Result<ChatMessage> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| anyhow!("API response contained no choices"))
}
