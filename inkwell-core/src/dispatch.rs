// inkwell-core/src/dispatch.rs

//! Routes model tool calls to the mailbox and composer.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::composer::Composer;
use crate::errors::ToolError;
use crate::mail::mailbox::DEFAULT_MAX_RESULTS;
use crate::mail::{EmailDraft, Mailbox};
use crate::models::tools::{ToolDefinition, ToolInput};
use crate::tools::{ToolRegistry, LIST_EMAILS, READ_EMAIL, REPLY_EMAIL, WRITE_EMAIL};
use crate::ToolProvider;

pub struct Dispatcher {
    registry: ToolRegistry,
    mailbox: Mailbox,
    composer: Composer,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, mailbox: Mailbox, composer: Composer) -> Self {
        Self {
            registry,
            mailbox,
            composer,
        }
    }

    pub async fn execute(&self, tool_name: &str, input: &ToolInput) -> Result<String, ToolError> {
        if !self.registry.contains(tool_name) {
            return Err(ToolError::UnknownTool(tool_name.to_string()));
        }
        debug!(tool_name = %tool_name, "Dispatching tool call");

        match tool_name {
            LIST_EMAILS => {
                let max_results = input
                    .get_u64("max_results")
                    .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                    .unwrap_or(DEFAULT_MAX_RESULTS);
                self.mailbox.list_recent(Some(max_results)).await
            }
            READ_EMAIL => self.mailbox.read(input.get_str("email_id")).await,
            WRITE_EMAIL => {
                let to = required_arg(input, "to")?;
                let subject = required_arg(input, "subject")?;
                let instruction = required_arg(input, "body_instruction")?;
                let body = self.composer.generate(instruction, "").await?;
                let draft = EmailDraft {
                    to: to.to_string(),
                    subject: subject.to_string(),
                    body,
                    ..Default::default()
                };
                self.mailbox.send(&draft).await
            }
            REPLY_EMAIL => {
                let original_id = required_arg(input, "original_email_id")?;
                let instruction = required_arg(input, "reply_instruction")?;
                let context = match self.mailbox.fetch_original(original_id).await {
                    Ok(original) => original.as_context(),
                    Err(e) => {
                        warn!(original_email_id = %original_id, error = %e, "Could not fetch original email for context; drafting without it");
                        String::new()
                    }
                };
                let body = self.composer.generate(instruction, &context).await?;
                self.mailbox.reply(original_id, &body).await
            }
            // Registered but not routed; treat like any unknown name.
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn required_arg<'a>(input: &'a ToolInput, name: &str) -> Result<&'a str, ToolError> {
    input
        .get_str(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolError::validation(format!("Missing required argument '{}'.", name)))
}

#[async_trait]
impl ToolProvider for Dispatcher {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions().to_vec()
    }

    async fn execute_tool(&self, tool_name: &str, input: ToolInput) -> Result<String, ToolError> {
        self.execute(tool_name, &input).await
    }
}
