// inkwell-core/src/config.rs

//! Configuration structures and parsing for the assistant.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
pub const DEFAULT_GMAIL_ENDPOINT: &str = "https://gmail.googleapis.com/gmail/v1";

const DEFAULT_PERSONA: &str =
    "You are an AI assistant that drafts professional and polite emails based on user instructions.";
const DEFAULT_SIGNATURE: &str = "DsCubed Recruitment Team";
const DEFAULT_FORMAT_POLICY: &str =
    "Please structure the email as a properly formatted email in HTML and remove the HTML tag.";
const DEFAULT_TEMPLATE: &str = "Given the following context and instruction, generate an email body:\n\
Context: {context}\nInstruction: {instruction}\n\nEmail Body:\n\
Sign off as '{signature}'.";

const DEFAULT_REJECTION_PERSONA: &str =
    "You are a professional and kind recruiter at a student club.";
const DEFAULT_REJECTION_TEMPLATE: &str = "Write a short, professional, and warm rejection email to an applicant named {first_name} \
for a university student club, based on the following bullet point feedback:\n- {feedback}\n\n\
Keep the tone kind and encouraging. Do NOT include a subject line.\n\
Start with 'Dear {first_name},'. Keep it concise, no more than 3 short paragraphs.\n\
End with a warm invitation to apply again next semester.\n\
Sign off as '{signature}'.";

#[derive(Deserialize, Debug, Clone)]
pub struct InkwellConfig {
    /// Optional preamble placed at the start of every conversation.
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub default_provider: String,
    #[serde(default)]
    pub providers: HashMap<String, ProviderInstanceConfig>,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProviderInstanceConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    pub api_key_env_var: String,
    pub model_config: ModelConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelConfig {
    pub model_name: String,
    #[serde(default)]
    pub parameters: Option<toml::Value>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MailConfig {
    pub user_id: String,
    pub access_token_env_var: String,
    pub endpoint: Option<String>,
    /// Address for the From header; looked up from the account profile when unset.
    pub from_address: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            user_id: "me".to_string(),
            access_token_env_var: "GMAIL_ACCESS_TOKEN".to_string(),
            endpoint: None,
            from_address: None,
        }
    }
}

impl MailConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_GMAIL_ENDPOINT)
    }
}

/// Drafting settings. `template` may reference `{context}`,
/// `{instruction}` and `{signature}`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ComposerConfig {
    /// Provider id used for drafting; falls back to `default_provider`.
    pub provider: Option<String>,
    pub persona: String,
    pub signature: String,
    pub format_policy: String,
    pub template: String,
    pub max_tokens: u32,
    pub rejection: RejectionConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            provider: None,
            persona: DEFAULT_PERSONA.to_string(),
            signature: DEFAULT_SIGNATURE.to_string(),
            format_policy: DEFAULT_FORMAT_POLICY.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            max_tokens: 500,
            rejection: RejectionConfig::default(),
        }
    }
}

/// Settings for batch rejection letters. `template` may reference
/// `{first_name}`, `{feedback}` and `{signature}`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RejectionConfig {
    pub persona: String,
    pub template: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for RejectionConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_REJECTION_PERSONA.to_string(),
            template: DEFAULT_REJECTION_TEMPLATE.to_string(),
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

impl InkwellConfig {
    /// Built-in configuration used when no config file exists. The model
    /// name comes from `OPENAI_MODEL` when set.
    pub fn from_env_defaults() -> Self {
        let model_name = std::env::var("OPENAI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        Self::with_model(model_name)
    }

    fn with_model(model_name: String) -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            DEFAULT_PROVIDER_ID.to_string(),
            ProviderInstanceConfig {
                provider_type: "openai".to_string(),
                api_key_env_var: "OPENAI_API_KEY".to_string(),
                model_config: ModelConfig {
                    model_name,
                    parameters: None,
                    endpoint: None,
                },
            },
        );
        Self {
            system_prompt: None,
            default_provider: DEFAULT_PROVIDER_ID.to_string(),
            providers,
            mail: MailConfig::default(),
            composer: ComposerConfig::default(),
        }
    }

    pub fn from_toml_str(config_toml_content: &str) -> Result<InkwellConfig> {
        let config: InkwellConfig = match toml::from_str(config_toml_content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML content");
                return Err(anyhow!(e))
                    .context("Failed to parse configuration TOML content. Check TOML syntax.");
            }
        };
        config.validate()?;
        tracing::info!("Successfully parsed and validated configuration.");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_provider.trim().is_empty() {
            return Err(anyhow!("'default_provider' key in config content is empty."));
        }
        if !self.providers.contains_key(&self.default_provider) {
            return Err(anyhow!(
                "Default provider '{}' not found in [providers] map.",
                self.default_provider
            ));
        }

        for (key, provider) in &self.providers {
            if provider.provider_type.trim().is_empty() {
                return Err(anyhow!("Provider '{}' is missing 'type'.", key));
            }
            if provider.model_config.model_name.trim().is_empty() {
                return Err(anyhow!(
                    "Provider '{}' is missing 'model_config.model_name'.",
                    key
                ));
            }
            if provider.api_key_env_var.trim().is_empty() {
                return Err(anyhow!("Provider '{}' is missing 'api_key_env_var'.", key));
            }
            if let Some(endpoint) = &provider.model_config.endpoint {
                Url::parse(endpoint).with_context(|| {
                    format!(
                        "Invalid URL format for endpoint ('{}') in provider '{}'.",
                        endpoint, key
                    )
                })?;
            }
            if let Some(params) = &provider.model_config.parameters {
                if !params.is_table() {
                    return Err(anyhow!(
                        "Provider '{}' has invalid 'model_config.parameters'. Expected a TOML table.",
                        key
                    ));
                }
            }
        }

        if self.mail.user_id.trim().is_empty() {
            return Err(anyhow!("'mail.user_id' is empty."));
        }
        if self.mail.access_token_env_var.trim().is_empty() {
            return Err(anyhow!("'mail.access_token_env_var' is empty."));
        }
        if let Some(endpoint) = &self.mail.endpoint {
            Url::parse(endpoint).with_context(|| {
                format!("Invalid URL format for mail endpoint ('{}').", endpoint)
            })?;
        }

        if let Some(provider) = &self.composer.provider {
            if !self.providers.contains_key(provider) {
                return Err(anyhow!(
                    "Composer provider '{}' not found in [providers] map.",
                    provider
                ));
            }
        }
        if !self.composer.template.contains("{instruction}") {
            return Err(anyhow!(
                "'composer.template' must contain the {{instruction}} placeholder."
            ));
        }
        if self.composer.max_tokens == 0 || self.composer.rejection.max_tokens == 0 {
            return Err(anyhow!("Composer 'max_tokens' values must be greater than zero."));
        }
        if !(0.0..=2.0).contains(&self.composer.rejection.temperature) {
            return Err(anyhow!(
                "'composer.rejection.temperature' must be between 0.0 and 2.0, got {}.",
                self.composer.rejection.temperature
            ));
        }
        Ok(())
    }

    pub fn composer_provider_id(&self) -> &str {
        self.composer
            .provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }
}

/// Secrets read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeSecrets {
    /// API keys keyed by provider id.
    pub api_keys: HashMap<String, String>,
    pub mail_access_token: String,
}

impl RuntimeSecrets {
    pub fn from_env(config: &InkwellConfig) -> Result<Self> {
        Self::from_lookup(config, env_lookup)
    }

    /// Resolves every secret the configuration names; any missing or empty
    /// variable is an error.
    pub fn from_lookup<F>(config: &InkwellConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_keys: Self::api_keys_from_lookup(config, &lookup)?,
            mail_access_token: Self::mail_token_from_lookup(config, &lookup)?,
        })
    }

    /// Model API keys only, for runs that never touch the mailbox.
    pub fn api_keys_from_env(config: &InkwellConfig) -> Result<HashMap<String, String>> {
        Self::api_keys_from_lookup(config, &env_lookup)
    }

    pub fn api_keys_from_lookup<F>(config: &InkwellConfig, lookup: &F) -> Result<HashMap<String, String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_keys = HashMap::new();
        for (id, provider) in &config.providers {
            let key = require_var(
                lookup,
                &provider.api_key_env_var,
                &format!("API key for provider '{}':", id),
            )?;
            api_keys.insert(id.clone(), key);
        }
        Ok(api_keys)
    }

    pub fn mail_token_from_env(config: &InkwellConfig) -> Result<String> {
        Self::mail_token_from_lookup(config, &env_lookup)
    }

    pub fn mail_token_from_lookup<F>(config: &InkwellConfig, lookup: &F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        require_var(lookup, &config.mail.access_token_env_var, "Mail access token:")
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn require_var<F>(lookup: &F, var: &str, what: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{} environment variable '{}' is not set.", what, var))
}
