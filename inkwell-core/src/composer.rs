// inkwell-core/src/composer.rs

//! Drafts email bodies with the language model.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::ComposerConfig;
use crate::errors::ToolError;
use crate::models::chat::{ChatMessage, CompletionOptions};
use crate::providers::Provider;

#[derive(Clone)]
pub struct Composer {
    provider: Arc<dyn Provider>,
    config: ComposerConfig,
}

impl Composer {
    pub fn new(provider: Arc<dyn Provider>, config: ComposerConfig) -> Self {
        Self { provider, config }
    }

    /// Drafts a body for `instruction`. `context` is free text about the
    /// message being answered and may be empty.
    pub async fn generate(&self, instruction: &str, context: &str) -> Result<String, ToolError> {
        let prompt = self.with_format_policy(fill_placeholders(
            &self.config.template,
            &[
                ("context", context),
                ("instruction", instruction),
                ("signature", &self.config.signature),
            ],
        ));
        let options = CompletionOptions {
            max_tokens: Some(self.config.max_tokens),
            temperature: None,
        };
        self.draft(&self.config.persona, prompt, &options).await
    }

    /// Drafts a rejection letter for one applicant.
    pub async fn generate_rejection(
        &self,
        first_name: &str,
        feedback: &str,
    ) -> Result<String, ToolError> {
        let rejection = &self.config.rejection;
        let prompt = self.with_format_policy(fill_placeholders(
            &rejection.template,
            &[
                ("first_name", first_name),
                ("feedback", feedback),
                ("signature", &self.config.signature),
            ],
        ));
        let options = CompletionOptions {
            max_tokens: Some(rejection.max_tokens),
            temperature: Some(rejection.temperature),
        };
        self.draft(&rejection.persona, prompt, &options).await
    }

    fn with_format_policy(&self, prompt: String) -> String {
        let policy = self.config.format_policy.trim();
        if policy.is_empty() {
            prompt
        } else {
            format!("{} {}", prompt, policy)
        }
    }

    async fn draft(
        &self,
        persona: &str,
        prompt: String,
        options: &CompletionOptions,
    ) -> Result<String, ToolError> {
        trace!(prompt = %prompt, "Drafting email body");
        let messages = vec![ChatMessage::system(persona), ChatMessage::user(prompt)];
        let response = self
            .provider
            .get_completion_with(messages, None, options)
            .await
            .map_err(|e| ToolError::Generation(format!("{:#}", e)))?;

        let body = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        if body.is_empty() {
            return Err(ToolError::Generation(
                "the model returned an empty draft".to_string(),
            ));
        }
        debug!(len = body.len(), provider = %self.provider.name(), "Drafted email body");
        Ok(body)
    }
}

/// Replaces each `{key}` in one pass over `template`. Substituted text is
/// never scanned again, so values may contain braces verbatim.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find(|(key, _)| {
            tail.starts_with(key) && tail[key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
