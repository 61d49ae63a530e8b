// inkwell-core/src/providers/openai.rs
use super::Provider;
use crate::api;
use crate::config::ModelConfig;
use crate::models::chat::{ApiResponse, ChatMessage, CompletionOptions};
use crate::models::tools::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAIProvider {
    config: ModelConfig,
    http_client: Client,
    api_key: String,
}

impl OpenAIProvider {
    pub fn new(config: ModelConfig, http_client: Client, api_key: String) -> Self {
        Self {
            config,
            http_client,
            api_key,
        }
    }

    fn endpoint(&self) -> &str {
        self.config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_ENDPOINT)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn get_completion_with(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
        options: &CompletionOptions,
    ) -> Result<ApiResponse> {
        let endpoint = self.endpoint();
        debug!(model = %self.config.model_name, endpoint = %endpoint, with_tools = tools.is_some(), "Requesting completion");

        api::call_chat_completion_api(
            &self.http_client,
            endpoint,
            &self.api_key,
            &self.config.model_name,
            messages,
            tools,
            self.config.parameters.as_ref(),
            options,
        )
        .await
    }
}
