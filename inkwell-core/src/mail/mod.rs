// inkwell-core/src/mail/mod.rs

//! Mail provider abstraction and the tool-facing mailbox adapter.

use anyhow::Result;
use async_trait::async_trait;

pub mod gmail;
pub mod mailbox;
pub mod message;

pub use mailbox::Mailbox;

/// How much of a message the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// Full RFC 2822 source, base64url encoded.
    Raw,
    /// Selected headers and the snippet only.
    Metadata,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Raw => "raw",
            MessageFormat::Metadata => "metadata",
        }
    }
}

/// One line of the recent-mail digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub id: String,
    pub from: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub snippet: String,
    /// Header name/value pairs; only populated for [`MessageFormat::Metadata`].
    pub headers: Vec<(String, String)>,
    /// base64url RFC 2822 source; only populated for [`MessageFormat::Raw`].
    pub raw: Option<String>,
}

impl FetchedMessage {
    /// Case-insensitive header lookup over the metadata headers.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: String,
    pub thread_id: Option<String>,
}

/// An outgoing message. Built per tool call and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
    pub thread_id: Option<String>,
}

/// The message being answered, used both as drafting context and as the
/// threading source for the reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub message_id: Option<String>,
    pub snippet: String,
}

impl OriginalMessage {
    pub fn as_context(&self) -> String {
        format!(
            "Original Email Subject: {}\nOriginal Email From: {}\nOriginal Email Snippet: {}",
            self.subject, self.from, self.snippet
        )
    }
}

/// Transport-level access to a mail account.
#[async_trait]
pub trait MailService: Send + Sync {
    async fn list_messages(&self, max_results: u32) -> Result<Vec<MessageSummary>>;

    async fn get_message(&self, id: &str, format: MessageFormat) -> Result<FetchedMessage>;

    /// Submits an already encoded message, optionally inside an existing thread.
    async fn send_raw(&self, raw: &str, thread_id: Option<&str>) -> Result<SentMessage>;
}
