//! OpenAI-compatible chat-completions client
//!
//! Used for every provider: Gemini and Ollama both expose the same protocol.

use crate::llm::client::{LLMClient, LLMResponse};
use crate::types::{
    AppError, ConversationMessage, MessageRole, Result, TokenUsage, ToolCall, ToolDefinition,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAICompatClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAICompatClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            temperature: 0.0,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: self.temperature,
            tools: tools
                .iter()
                .map(|tool| ChatTool {
                    kind: "function".to_string(),
                    function: ChatFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let payload = self.build_request(messages, tools);

        tracing::debug!(
            model = %self.model,
            messages_count = payload.messages.len(),
            tools_count = payload.tools.len(),
            "sending chat completion request"
        );

        let mut request = self.client.post(self.completions_url()).json(&payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Request to {} failed: {}", self.api_base, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "LLM API error");
            return Err(AppError::LLM(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("Response contained no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{}", i)),
                arguments: parse_arguments(&call.function.arguments),
                name: call.function.name,
            })
            .collect();

        let usage = api_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        if let Some(usage) = &usage {
            tracing::debug!(tokens = usage.total_tokens, "chat completion received");
        }

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Tool arguments arrive as a JSON string; models occasionally send bare text
fn parse_arguments(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

// ============= API Types =============

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCallOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };

        let tool_calls: Vec<ChatToolCallOut> = message
            .tool_calls
            .iter()
            .map(|call| ChatToolCallOut {
                id: call.id.clone(),
                kind: "function",
                function: ChatFunctionCallOut {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect();

        // An assistant turn that only calls tools carries null content
        let content = if message.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role,
            content,
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatToolCallOut {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: ChatFunctionCallOut,
}

#[derive(Debug, Serialize)]
struct ChatFunctionCallOut {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    kind: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCallIn>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCallIn {
    id: Option<String>,
    function: ChatFunctionCallIn,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionCallIn {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u64,
    completion_tokens: u64,
}
