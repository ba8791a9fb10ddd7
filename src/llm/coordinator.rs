//! Tool Coordinator for Multi-Turn Tool Calling
//!
//! Provider-agnostic loop that works with any `LLMClient`:
//!
//! 1. Send the conversation with the step's tool definitions
//! 2. If the model requests tool calls, run them one after another
//! 3. Append the text results and go again
//! 4. Stop when the model answers without tool calls
//!
//! When the iteration ceiling is reached the coordinator makes one last
//! request without tools, asking the model for its best answer. If that is
//! empty too, the last non-empty assistant text is used.
//!
//! # Example
//!
//! ```rust,ignore
//! let coordinator = ToolCoordinator::new(client, registry, ToolCallingConfig::default());
//! let result = coordinator
//!     .execute(Some("You are a stock analyst."), "Price of ACME?", &["current_stock_price".into()])
//!     .await?;
//! println!("{} ({} tool calls)", result.content, result.tool_calls.len());
//! ```

use crate::llm::client::LLMClient;
use crate::tools::registry::{ToolRegistry, ERROR_MARKER};
use crate::types::{ConversationMessage, MessageRole, Result, TokenUsage, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Message appended when the model must answer without further tool use
pub const FORCED_FINAL_PROMPT: &str = "You have reached the maximum number of tool calls. \
Do not call any more tools. Using only the information gathered so far, give your best complete final answer now.";

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of tool-enabled LLM round-trips before the forced
    /// final answer.
    pub max_iterations: usize,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self { max_iterations: 5 }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRecord {
    /// Identifier assigned by the model.
    pub id: String,
    pub name: String,
    /// The single string argument passed to the tool.
    pub argument: String,
    /// Text returned by the tool wrapper.
    pub result: String,
    /// False when the result is an error text.
    pub success: bool,
}

/// Reason why a tool coordination session ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinishReason {
    /// Model answered without requesting tools.
    Stop,
    /// Hit the iteration ceiling and answered through the forced final request.
    MaxIterations,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxIterations => write!(f, "max_iterations"),
        }
    }
}

/// Result of a complete tool coordination session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// Final text response from the model.
    pub content: String,

    /// All tool calls made during the session.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Number of LLM requests performed, the forced final one included.
    pub iterations: usize,

    pub finish_reason: FinishReason,

    /// Accumulated token usage across all iterations.
    pub total_usage: TokenUsage,
}

pub struct ToolCoordinator {
    client: Arc<dyn LLMClient>,
    registry: Arc<ToolRegistry>,
    config: ToolCallingConfig,
}

impl ToolCoordinator {
    pub fn new(
        client: Arc<dyn LLMClient>,
        registry: Arc<ToolRegistry>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Create a new ToolCoordinator with default configuration.
    pub fn with_defaults(client: Arc<dyn LLMClient>, registry: Arc<ToolRegistry>) -> Self {
        Self::new(client, registry, ToolCallingConfig::default())
    }

    /// Run the tool-calling loop with only `allowed` tools advertised and
    /// callable. A call to any other name gets an error text as its result.
    pub async fn execute(
        &self,
        system: Option<&str>,
        prompt: &str,
        allowed: &[String],
    ) -> Result<CoordinatorResult> {
        let tools = self.registry.definitions_for(allowed);
        let mut messages: Vec<ConversationMessage> = Vec::new();
        let mut records: Vec<ToolCallRecord> = Vec::new();
        let mut total_usage = TokenUsage::default();

        if let Some(sys) = system {
            messages.push(ConversationMessage::system(sys));
        }
        messages.push(ConversationMessage::user(prompt));

        for iteration in 0..self.config.max_iterations {
            let response = self
                .client
                .generate_with_tools_and_history(&messages, &tools)
                .await?;

            if let Some(usage) = &response.usage {
                total_usage.accumulate(usage);
            }

            messages.push(ConversationMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                return Ok(CoordinatorResult {
                    content: response.content,
                    tool_calls: records,
                    iterations: iteration + 1,
                    finish_reason: FinishReason::Stop,
                    total_usage,
                });
            }

            for call in &response.tool_calls {
                let record = self.execute_single_tool(call, allowed).await;
                messages.push(ConversationMessage::tool_result(&record.id, &record.result));
                records.push(record);
            }
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "iteration ceiling reached, requesting final answer"
        );

        messages.push(ConversationMessage::user(FORCED_FINAL_PROMPT));
        let response = self
            .client
            .generate_with_tools_and_history(&messages, &[])
            .await?;

        if let Some(usage) = &response.usage {
            total_usage.accumulate(usage);
        }

        let content = if response.content.trim().is_empty() {
            last_assistant_text(&messages)
        } else {
            response.content.clone()
        };

        Ok(CoordinatorResult {
            content,
            tool_calls: records,
            iterations: self.config.max_iterations + 1,
            finish_reason: FinishReason::MaxIterations,
            total_usage,
        })
    }

    async fn execute_single_tool(&self, call: &ToolCall, allowed: &[String]) -> ToolCallRecord {
        let argument = self.extract_argument(call);

        let result = if allowed.iter().any(|name| name == &call.name) {
            let start = Instant::now();
            let output = self.registry.invoke(&call.name, &argument).await;
            tracing::debug!(
                tool = %call.name,
                argument = %argument,
                duration_ms = start.elapsed().as_millis() as u64,
                "tool call finished"
            );
            output
        } else {
            tracing::warn!(tool = %call.name, "model requested a tool not bound to this step");
            format!("{}: tool '{}' is not available", ERROR_MARKER, call.name)
        };

        ToolCallRecord {
            id: call.id.clone(),
            name: call.name.clone(),
            argument,
            success: !result.starts_with(ERROR_MARKER),
            result,
        }
    }

    /// Reduce the model's arguments to the tool's single string.
    fn extract_argument(&self, call: &ToolCall) -> String {
        match &call.arguments {
            Value::String(s) => s.clone(),
            Value::Object(map) => {
                let by_name = self
                    .registry
                    .argument_name(&call.name)
                    .and_then(|arg| map.get(arg));

                match by_name.or_else(|| map.values().next()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                }
            }
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &ToolCallingConfig {
        &self.config
    }
}

fn last_assistant_text(messages: &[ConversationMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant && !m.content.trim().is_empty())
        .map(|m| m.content.clone())
        .unwrap_or_default()
}
