//! LLM Client abstractions and provider selection
//!
//! Every supported provider speaks the OpenAI chat-completions protocol:
//! - **Gemini**: through Google's `/v1beta/openai` compatibility endpoint
//! - **OpenAI**: the public API or any compatible gateway
//! - **Ollama**: the local server's `/v1` endpoint

use crate::types::{
    AppError, ConversationMessage, Result, TokenUsage, ToolCall, ToolDefinition,
};
use crate::utils::toml_config::{LlmConfig, ProviderKind, Settings};
use async_trait::async_trait;

/// Default Gemini OpenAI-compatible endpoint
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
/// Default OpenAI endpoint
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Default local Ollama endpoint
pub const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .generate_with_tools_and_history(&[ConversationMessage::user(prompt)], &[])
            .await?;
        Ok(response.content)
    }

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = [
            ConversationMessage::system(system),
            ConversationMessage::user(prompt),
        ];
        let response = self.generate_with_tools_and_history(&messages, &[]).await?;
        Ok(response.content)
    }

    /// One turn of a tool-calling conversation. An empty `tools` slice sends
    /// no tool definitions at all.
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    /// Token counters, when the endpoint reports them
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// A plain text answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// Google Gemini via its OpenAI-compatible endpoint
    Gemini { api_key: String, model: String },

    /// OpenAI API provider (including compatible gateways)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Select the provider described by resolved settings
    pub fn from_settings(settings: &Settings) -> Self {
        let llm = &settings.config.llm;
        let model = settings.model.clone();
        let api_key = settings.llm_api_key.clone();

        match llm.provider {
            ProviderKind::Gemini => match &llm.api_base {
                Some(api_base) => Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model,
                },
                None => Provider::Gemini { api_key, model },
            },
            ProviderKind::OpenAI => Provider::OpenAI {
                api_key,
                api_base: llm
                    .api_base
                    .clone()
                    .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
                model,
            },
            ProviderKind::Ollama => Provider::Ollama {
                base_url: llm
                    .api_base
                    .clone()
                    .unwrap_or_else(|| OLLAMA_API_BASE.to_string()),
                model,
            },
        }
    }

    /// Create a client instance for this provider
    pub fn create_client(&self, llm: &LlmConfig) -> Result<Box<dyn LLMClient>> {
        let (api_key, api_base, model) = match self {
            Provider::Gemini { api_key, model } => {
                (api_key.clone(), GEMINI_API_BASE.to_string(), model.clone())
            }
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => (api_key.clone(), api_base.clone(), model.clone()),
            Provider::Ollama { base_url, model } => {
                (String::new(), base_url.clone(), model.clone())
            }
        };

        if model.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "{} provider needs a model name",
                self.name()
            )));
        }

        let client = super::openai::OpenAICompatClient::new(
            api_key,
            api_base,
            model,
            std::time::Duration::from_secs(llm.timeout_secs),
        )?
        .with_temperature(llm.temperature);

        Ok(Box::new(client))
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
