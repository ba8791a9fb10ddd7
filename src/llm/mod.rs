//! LLM Provider Clients and Abstractions
//!
//! All providers are reached through one OpenAI-compatible HTTP client, so
//! switching between Gemini, OpenAI and a local Ollama server is a
//! configuration change.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection from resolved settings
//! - [`ToolCoordinator`] - Multi-turn tool-calling loop over any client
//!
//! # Example
//!
//! ```ignore
//! use tickerwise::llm::Provider;
//!
//! let client = Provider::from_settings(&settings).create_client(&settings.config.llm)?;
//! let answer = client.generate("What is a P/E ratio?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Multi-turn tool calling loop.
pub mod coordinator;
/// OpenAI-compatible chat-completions client.
pub mod openai;

pub use client::{LLMClient, LLMResponse, Provider};
pub use coordinator::{CoordinatorResult, FinishReason, ToolCallingConfig, ToolCoordinator};
pub use openai::OpenAICompatClient;
