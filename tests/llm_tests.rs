//! Tests for the OpenAI-compatible LLM client against a mock endpoint

mod common;

use chrono::NaiveDate;
use common::mocks::StubMarketData;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tickerwise::agents::{Agent, AgentTask, Persona, ToolCallingAgent};
use tickerwise::llm::{LLMClient, OpenAICompatClient, Provider};
use tickerwise::types::{AppError, ConversationMessage, ToolDefinition};
use tickerwise::{tools, TickerwiseConfig};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenAICompatClient {
    OpenAICompatClient::new(
        "test-key".to_string(),
        format!("{}/v1", server.uri()),
        "test-model".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn completion(message: serde_json::Value, finish_reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": finish_reason
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    })
}

fn price_tool() -> ToolDefinition {
    ToolDefinition {
        name: "current_stock_price".to_string(),
        description: "Get the current stock price for a given ticker.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"ticker": {"type": "string"}},
            "required": ["ticker"]
        }),
    }
}

#[tokio::test]
async fn test_text_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "test-model", "temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Hold."}),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .generate_with_tools_and_history(&[ConversationMessage::user("Advice?")], &[])
        .await
        .unwrap();

    assert_eq!(response.content, "Hold.");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.finish_reason, "stop");
    let usage = response.usage.unwrap();
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.total_tokens, 20);
}

#[tokio::test]
async fn test_tool_calls_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "current_stock_price"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "current_stock_price", "arguments": "{\"ticker\":\"ACME\"}"}
                }]
            }),
            "tool_calls",
        )))
        .mount(&server)
        .await;

    let response = client(&server)
        .generate_with_tools_and_history(&[ConversationMessage::user("Price?")], &[price_tool()])
        .await
        .unwrap();

    assert_eq!(response.content, "");
    assert_eq!(response.finish_reason, "tool_calls");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_abc");
    assert_eq!(response.tool_calls[0].name, "current_stock_price");
    assert_eq!(response.tool_calls[0].arguments, json!({"ticker": "ACME"}));
}

#[tokio::test]
async fn test_error_status_is_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let err = client(&server).generate("hello").await.unwrap_err();

    match err {
        AppError::LLM(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected LLM error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = client(&server).generate("hello").await;
    assert!(matches!(result, Err(AppError::LLM(_))));
}

#[tokio::test]
async fn test_system_prompt_sent_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Hello"}),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(&server)
        .generate_with_system("You are terse.", "Hi")
        .await
        .unwrap();
    assert_eq!(answer, "Hello");
}

#[tokio::test]
async fn test_agent_round_trip_over_http() {
    let server = MockServer::start().await;

    // Second turn: the tool result is in the history
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"role\":\"tool\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "ACME trades at 123.45. Hold."}),
            "stop",
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "current_stock_price", "arguments": "{\"ticker\":\"ACME\"}"}
                }]
            }),
            "tool_calls",
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let registry = Arc::new(tools::stock_tools(
        Arc::new(StubMarketData::new("ACME")),
        &TickerwiseConfig::default(),
    ));
    let agent = ToolCallingAgent::new(Arc::new(client(&server)), registry, 5);

    let output = agent
        .execute(&AgentTask {
            step: "advise".to_string(),
            persona: Persona::new("Financial Expert", "Advise", "Today is {today}"),
            instruction: "Recommend on ACME".to_string(),
            expected_output: "buy/hold/sell".to_string(),
            tools: vec!["current_stock_price".to_string()],
            as_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        })
        .await
        .unwrap();

    assert_eq!(output.content, "ACME trades at 123.45. Hold.");
    assert_eq!(output.tool_calls, 1);
    assert_eq!(output.usage.total_tokens, 40);
}

#[test]
fn test_provider_requires_model() {
    let provider = Provider::Ollama {
        base_url: "http://localhost:11434/v1".to_string(),
        model: "  ".to_string(),
    };
    let result = provider.create_client(&TickerwiseConfig::default().llm);
    assert!(matches!(result, Err(AppError::Configuration(_))));
}
