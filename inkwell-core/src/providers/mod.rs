// inkwell-core/src/providers/mod.rs
use crate::models::chat::{ApiResponse, ChatMessage, CompletionOptions};
use crate::models::tools::ToolDefinition;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod openai;

#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_completion(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ApiResponse> {
        self.get_completion_with(messages, tools, &CompletionOptions::default())
            .await
    }

    /// Same as [`Provider::get_completion`] with per-request sampling overrides.
    async fn get_completion_with(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
        options: &CompletionOptions,
    ) -> Result<ApiResponse>;

    fn name(&self) -> &str;
}

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: String) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider,
        }
    }

    pub fn register(&mut self, id: String, provider: Arc<dyn Provider>) {
        self.providers.insert(id, provider);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Provider not found: {}", id))
    }

    pub fn default(&self) -> Result<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn default_provider_id(&self) -> &str {
        &self.default_provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Choice;

    struct NamedProvider(&'static str);

    #[async_trait]
    impl Provider for NamedProvider {
        async fn get_completion_with(
            &self,
            _messages: Vec<ChatMessage>,
            _tools: Option<&[ToolDefinition]>,
            _options: &CompletionOptions,
        ) -> Result<ApiResponse> {
            Ok(ApiResponse {
                id: "id".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: ChatMessage::assistant(self.0),
                    finish_reason: None,
                }],
            })
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new("main".to_string());
        registry.register("main".to_string(), Arc::new(NamedProvider("main-model")));
        registry.register("drafts".to_string(), Arc::new(NamedProvider("draft-model")));

        assert_eq!(registry.default_provider_id(), "main");
        assert_eq!(registry.default().unwrap().name(), "main-model");
        assert_eq!(registry.get("drafts").unwrap().name(), "draft-model");
        let err = registry.get("missing").err().unwrap();
        assert_eq!(err.to_string(), "Provider not found: missing");
    }

    #[tokio::test]
    async fn test_get_completion_defaults_to_no_overrides() {
        let provider = NamedProvider("m");
        let response = provider
            .get_completion(vec![ChatMessage::user("hi")], None)
            .await
            .unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("m"));
    }
}
