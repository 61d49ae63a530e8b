// inkwell-core/src/mail/mailbox.rs

//! Tool-facing mail operations. Every method returns the text handed back
//! to the model, or a typed [`ToolError`].

use std::sync::Arc;
use tracing::{debug, info};

use super::message::{self, extract_address, reply_subject};
use super::{EmailDraft, MailService, MessageFormat, OriginalMessage};
use crate::errors::ToolError;

pub const DEFAULT_MAX_RESULTS: u32 = 10;
const MAX_RESULTS_LIMIT: u32 = 100;

const MISSING_ID_MESSAGE: &str = "Email ID is missing or invalid. Please provide a valid email ID.";

#[derive(Clone)]
pub struct Mailbox {
    service: Arc<dyn MailService>,
    sender: String,
}

impl Mailbox {
    /// `sender` is the address written into the From header of outgoing mail.
    pub fn new(service: Arc<dyn MailService>, sender: impl Into<String>) -> Self {
        Self {
            service,
            sender: sender.into(),
        }
    }

    pub async fn list_recent(&self, max_results: Option<u32>) -> Result<String, ToolError> {
        let max_results = max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS_LIMIT);
        let summaries = self
            .service
            .list_messages(max_results)
            .await
            .map_err(|e| ToolError::provider("An error occurred while listing emails", e))?;

        if summaries.is_empty() {
            return Ok("No messages found.".to_string());
        }

        let mut digest = String::from("Recent emails:\n");
        for summary in &summaries {
            digest.push_str(&format!(
                "From: {} | Subject: {} | ID: {}\n",
                summary.from.as_deref().unwrap_or("Unknown Sender"),
                summary.subject.as_deref().unwrap_or("No Subject"),
                summary.id
            ));
        }
        debug!(count = summaries.len(), "Built recent mail digest");
        Ok(digest)
    }

    pub async fn read(&self, message_id: Option<&str>) -> Result<String, ToolError> {
        let message_id = match message_id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ToolError::validation(MISSING_ID_MESSAGE)),
        };

        let fetched = self
            .service
            .get_message(message_id, MessageFormat::Raw)
            .await
            .map_err(|e| ToolError::provider("An error occurred while fetching email", e))?;
        let headers = fetched
            .raw
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("message {} has no raw source", message_id))
            .and_then(message::decode_raw)
            .and_then(|bytes| message::parse_headers(&bytes))
            .map_err(|e| ToolError::provider("An error occurred while reading email", e))?;

        Ok(format!(
            "Subject: {}\nFrom: {}\nSnippet: {}",
            headers.subject.as_deref().unwrap_or("No Subject"),
            headers.from.as_deref().unwrap_or("Unknown Sender"),
            fetched.snippet
        ))
    }

    pub async fn send(&self, draft: &EmailDraft) -> Result<String, ToolError> {
        let sent_id = self.submit(draft).await?;
        info!(message_id = %sent_id, to = %draft.to, "Email sent");
        Ok(format!("Email sent successfully. Message ID: {}", sent_id))
    }

    async fn submit(&self, draft: &EmailDraft) -> Result<String, ToolError> {
        let bytes = message::build_rfc2822(&self.sender, draft)
            .map_err(|e| ToolError::validation(format!("{:#}", e)))?;
        let raw = message::encode_raw(&bytes);
        let sent = self
            .service
            .send_raw(&raw, draft.thread_id.as_deref())
            .await
            .map_err(|e| ToolError::provider("An error occurred while sending email", e))?;
        Ok(sent.id)
    }

    /// Metadata fetch of the message being answered.
    pub async fn fetch_original(&self, message_id: &str) -> Result<OriginalMessage, ToolError> {
        let fetched = self
            .service
            .get_message(message_id, MessageFormat::Metadata)
            .await
            .map_err(|e| {
                ToolError::provider("An error occurred while fetching the original email", e)
            })?;
        Ok(OriginalMessage {
            subject: fetched.header("Subject").unwrap_or("No Subject").to_string(),
            from: fetched.header("From").unwrap_or("Unknown Sender").to_string(),
            message_id: fetched.header("Message-ID").map(str::to_string),
            id: fetched.id,
            thread_id: fetched.thread_id,
            snippet: fetched.snippet,
        })
    }

    /// Answers `original_id` in its thread with `reply_text` as the body.
    pub async fn reply(&self, original_id: &str, reply_text: &str) -> Result<String, ToolError> {
        let fetched = self
            .service
            .get_message(original_id, MessageFormat::Raw)
            .await
            .map_err(|e| ToolError::provider("Error sending reply", e))?;
        let headers = fetched
            .raw
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("message {} has no raw source", original_id))
            .and_then(message::decode_raw)
            .and_then(|bytes| message::parse_headers(&bytes))
            .map_err(|e| ToolError::provider("Error sending reply", e))?;

        let from = headers
            .from
            .ok_or_else(|| ToolError::validation("The original email has no sender to reply to."))?;
        let to_address = extract_address(&from);
        let message_id = headers.message_id.map(|id| format!("<{}>", id));

        let draft = EmailDraft {
            to: to_address.clone(),
            subject: reply_subject(headers.subject.as_deref().unwrap_or_default()),
            body: reply_text.to_string(),
            in_reply_to: message_id.clone(),
            references: message_id,
            thread_id: fetched.thread_id,
        };
        let sent_id = self.submit(&draft).await?;
        info!(message_id = %sent_id, to = %to_address, "Reply sent");
        Ok(format!(
            "Reply sent successfully to {}. Message ID: {}",
            to_address, sent_id
        ))
    }
}
