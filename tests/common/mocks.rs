//! Mock implementations for testing.
//!
//! Shared doubles for the LLM client, the step agent, the market-data source
//! and the mailer, so integration tests never touch the network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Mutex;
use tickerwise::agents::{Agent, AgentOutput, AgentTask};
use tickerwise::llm::{LLMClient, LLMResponse};
use tickerwise::mail::{EmailRequest, MailError, Mailer};
use tickerwise::report::{DocumentRenderer, RenderError};
use tickerwise::tools::market::{
    Financials, MarketData, NewsItem, PriceBar, Quote, StatementPeriod,
};
use tickerwise::tools::registry::{Tool, ToolError};
use tickerwise::types::{
    AppError, ConversationMessage, MessageRole, Result, ToolCall, ToolDefinition,
};
use tickerwise::workflows::pipeline::CONTEXT_HEADER;

// ============= LLM =============

/// Mock LLM client with a fixed answer.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    tool_calls: Vec<ToolCall>,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            tool_calls: vec![],
            should_fail: false,
        }
    }

    /// Always answers with the same tool calls
    pub fn with_tool_calls(response: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            response: response.to_string(),
            tool_calls,
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            tool_calls: vec![],
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        _messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        // No tools advertised means the forced final request
        let tool_calls = if tools.is_empty() {
            vec![]
        } else {
            self.tool_calls.clone()
        };
        let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };

        Ok(LLMResponse {
            content: self.response.clone(),
            tool_calls,
            finish_reason: finish_reason.to_string(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// One recorded LLM request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<String>,
}

/// Replays queued responses in order and records every request.
/// Once the queue is empty it answers with a plain "done".
#[derive(Default)]
pub struct ScriptedLLMClient {
    responses: Mutex<VecDeque<LLMResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedLLMClient {
    pub fn new(responses: Vec<LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });

        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| LLMResponse::text("done")))
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Deterministic model for whole-pipeline runs. Without upstream context it
/// calls the first advertised tool on the company and answers with the
/// tool's result; with context it answers with a digest of the context.
#[derive(Default)]
pub struct ToolEchoLLMClient {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ToolEchoLLMClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// User prompt of the first request whose prompt contains `needle`
    pub fn prompt_containing(&self, needle: &str) -> String {
        self.requests()
            .into_iter()
            .filter_map(|r| user_prompt(&r.messages))
            .find(|prompt| prompt.contains(needle))
            .unwrap_or_else(|| panic!("no request mentions {}", needle))
    }
}

fn user_prompt(messages: &[ConversationMessage]) -> Option<String> {
    messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.clone())
}

#[async_trait]
impl LLMClient for ToolEchoLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });

        if let Some(last) = messages.last().filter(|m| m.role == MessageRole::Tool) {
            return Ok(LLMResponse::text(last.content.clone()));
        }

        let prompt = user_prompt(messages).unwrap_or_default();
        if let Some((_, context)) = prompt.split_once(CONTEXT_HEADER) {
            return Ok(LLMResponse::text(format!(
                "assessment of {} context chars",
                context.len()
            )));
        }

        match tools.first() {
            Some(tool) => {
                let company = prompt
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().last())
                    .unwrap_or_default();
                Ok(calls("", vec![tool_call("call_1", &tool.name, company)]))
            }
            None => Ok(LLMResponse::text("nothing to look up")),
        }
    }

    fn model_name(&self) -> &str {
        "tool-echo-model"
    }
}

pub fn tool_call(id: &str, name: &str, ticker: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::json!({ "ticker": ticker }),
    }
}

pub fn calls(content: &str, tool_calls: Vec<ToolCall>) -> LLMResponse {
    LLMResponse {
        content: content.to_string(),
        tool_calls,
        finish_reason: "tool_calls".to_string(),
        usage: None,
    }
}

// ============= Agent =============

/// Agent answering `<STEP>:<company>` and recording each task it receives.
/// Steps listed in `failing` return an LLM error instead.
#[derive(Default)]
pub struct RecordingAgent {
    failing: Vec<String>,
    tasks: Mutex<Vec<AgentTask>>,
}

impl RecordingAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(steps: &[&str]) -> Self {
        Self {
            failing: steps.iter().map(|s| s.to_string()).collect(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn tasks(&self) -> Vec<AgentTask> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn task(&self, step: &str) -> AgentTask {
        self.tasks()
            .into_iter()
            .find(|t| t.step == step)
            .unwrap_or_else(|| panic!("step {} never executed", step))
    }
}

/// Output the recording agent produces for `step` on `company`
pub fn tag(step: &str, company: &str) -> String {
    format!("{}:{}", step.to_uppercase(), company)
}

#[async_trait]
impl Agent for RecordingAgent {
    async fn execute(&self, task: &AgentTask) -> Result<AgentOutput> {
        self.tasks.lock().unwrap().push(task.clone());

        if self.failing.contains(&task.step) {
            return Err(AppError::LLM("endpoint unavailable".to_string()));
        }

        // The substituted company is the last word of every test template
        let company = task
            .instruction
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().last())
            .unwrap_or_default();

        Ok(AgentOutput::text(tag(&task.step, company)))
    }
}

// ============= Tools =============

/// Tool answering `<PREFIX>:<argument>`
pub struct StubTool {
    pub name: String,
    pub prefix: String,
}

impl StubTool {
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Stub tool"
    }

    async fn invoke(&self, argument: &str) -> std::result::Result<String, ToolError> {
        Ok(format!("{}:{}", self.prefix, argument))
    }
}

// ============= Market data =============

/// Fixed data for one ticker; any other ticker has no data
pub struct StubMarketData {
    pub ticker: String,
}

impl StubMarketData {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
        }
    }

    fn check(&self, ticker: &str) -> std::result::Result<(), ToolError> {
        if ticker == self.ticker {
            Ok(())
        } else {
            Err(ToolError::NoData(ticker.to_string()))
        }
    }
}

#[async_trait]
impl MarketData for StubMarketData {
    async fn quote(&self, ticker: &str) -> std::result::Result<Quote, ToolError> {
        self.check(ticker)?;
        Ok(Quote {
            current_price: Some(123.45),
            forward_pe: Some(18.2),
            ..Quote::default()
        })
    }

    async fn history(
        &self,
        ticker: &str,
        _range: &str,
    ) -> std::result::Result<Vec<PriceBar>, ToolError> {
        self.check(ticker)?;
        Ok(vec![PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 120.0,
            high: 125.0,
            low: 119.5,
            close: 123.45,
            volume: 10_000,
        }])
    }

    async fn financials(&self, ticker: &str) -> std::result::Result<Financials, ToolError> {
        self.check(ticker)?;
        Ok(Financials {
            income_statement: vec![StatementPeriod {
                end_date: "2023-12-31".to_string(),
                items: vec![("totalRevenue".to_string(), 1000.0)],
            }],
            ..Financials::default()
        })
    }

    async fn news(
        &self,
        ticker: &str,
        limit: usize,
    ) -> std::result::Result<Vec<NewsItem>, ToolError> {
        self.check(ticker)?;
        Ok((0..limit.min(2))
            .map(|i| NewsItem {
                title: Some(format!("Headline {}", i + 1)),
                publisher: Some("Wire".to_string()),
                link: None,
            })
            .collect())
    }
}

// ============= Mailer =============

/// Records sent requests; `failing()` rejects every send at the transport
#[derive(Default)]
pub struct MockMailer {
    should_fail: bool,
    sent: Mutex<Vec<EmailRequest>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EmailRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_report(&self, request: &EmailRequest) -> std::result::Result<(), MailError> {
        if self.should_fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

// ============= Renderer =============

/// "Renders" by copying the HTML file to the document path
pub struct CopyRenderer;

#[async_trait]
impl DocumentRenderer for CopyRenderer {
    async fn render(
        &self,
        html: &std::path::Path,
        output: &std::path::Path,
    ) -> std::result::Result<(), RenderError> {
        tokio::fs::copy(html, output).await?;
        Ok(())
    }
}
