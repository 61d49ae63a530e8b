// inkwell-core/src/mail/gmail.rs

//! Gmail REST implementation of [`MailService`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::{FetchedMessage, MailService, MessageFormat, MessageSummary, SentMessage};
use crate::config::MailConfig;

const METADATA_HEADERS: [&str; 3] = ["From", "Subject", "Message-ID"];

#[derive(Deserialize, Debug, Default)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize, Debug)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MessageResource {
    id: String,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Option<Payload>,
    #[serde(default)]
    raw: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Deserialize, Debug)]
struct Header {
    name: String,
    value: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    raw: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    id: String,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

impl From<MessageResource> for FetchedMessage {
    fn from(resource: MessageResource) -> Self {
        let headers = resource
            .payload
            .unwrap_or_default()
            .headers
            .into_iter()
            .map(|h| (h.name, h.value))
            .collect();
        FetchedMessage {
            id: resource.id,
            thread_id: resource.thread_id,
            snippet: resource.snippet,
            headers,
            raw: resource.raw,
        }
    }
}

/// Talks to `{endpoint}/users/{user_id}/...` with a bearer token.
#[derive(Clone)]
pub struct GmailClient {
    http_client: Client,
    base_url: String,
    user_id: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(http_client: Client, config: &MailConfig, access_token: String) -> Self {
        Self {
            http_client,
            base_url: config.endpoint().trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            access_token,
        }
    }

    fn user_url(&self, path: &str) -> String {
        format!("{}/users/{}/{}", self.base_url, self.user_id, path)
    }

    /// URL of a single message, with the id escaped as one path segment.
    fn message_url(&self, id: &str) -> Result<Url> {
        if id.is_empty() || id == "." || id == ".." {
            return Err(anyhow!("Invalid message id '{}'", id));
        }
        let mut url = Url::parse(&self.user_url("messages"))
            .with_context(|| format!("Invalid Gmail endpoint: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Gmail endpoint cannot carry a path: {}", self.base_url))?
            .push(id);
        Ok(url)
    }

    async fn send_request(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Gmail request failed: {}", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .context("Failed to read Gmail error response body")?;
            debug!(%status, body = %body, "Gmail request returned an error");
            return Err(anyhow!("Gmail API error: {} - {}", status, body.trim()));
        }
        Ok(response)
    }

    /// The account's own address, used for the From header.
    pub async fn profile_address(&self) -> Result<String> {
        let request = self.http_client.get(self.user_url("profile"));
        let profile: Profile = self
            .send_request(request, "get profile")
            .await?
            .json()
            .await
            .context("Failed to parse Gmail profile response")?;
        Ok(profile.email_address)
    }
}

#[async_trait]
impl MailService for GmailClient {
    async fn list_messages(&self, max_results: u32) -> Result<Vec<MessageSummary>> {
        debug!(max_results, "Listing messages");
        let request = self
            .http_client
            .get(self.user_url("messages"))
            .query(&[("maxResults", max_results.to_string())]);
        let listing: ListResponse = self
            .send_request(request, "list messages")
            .await?
            .json()
            .await
            .context("Failed to parse Gmail message list")?;

        let mut summaries = Vec::with_capacity(listing.messages.len());
        for message_ref in listing.messages {
            let fetched = self
                .get_message(&message_ref.id, MessageFormat::Metadata)
                .await?;
            summaries.push(MessageSummary {
                from: fetched.header("From").map(str::to_string),
                subject: fetched.header("Subject").map(str::to_string),
                id: fetched.id,
            });
        }
        Ok(summaries)
    }

    async fn get_message(&self, id: &str, format: MessageFormat) -> Result<FetchedMessage> {
        debug!(id = %id, format = format.as_str(), "Fetching message");
        let mut query: Vec<(&str, &str)> = vec![("format", format.as_str())];
        if format == MessageFormat::Metadata {
            query.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        }
        let request = self
            .http_client
            .get(self.message_url(id)?)
            .query(&query);
        let resource: MessageResource = self
            .send_request(request, "get message")
            .await?
            .json()
            .await
            .context("Failed to parse Gmail message")?;
        trace!(?resource, "Fetched message resource");
        Ok(resource.into())
    }

    async fn send_raw(&self, raw: &str, thread_id: Option<&str>) -> Result<SentMessage> {
        debug!(raw_len = raw.len(), thread_id = ?thread_id, "Sending message");
        let request = self
            .http_client
            .post(self.user_url("messages/send"))
            .json(&SendRequest { raw, thread_id });
        let sent: SendResponse = self
            .send_request(request, "send message")
            .await?
            .json()
            .await
            .context("Failed to parse Gmail send response")?;
        Ok(SentMessage {
            id: sent.id,
            thread_id: sent.thread_id,
        })
    }
}
