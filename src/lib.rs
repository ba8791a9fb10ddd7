//! # Tickerwise
//!
//! Stock analysis reports from a fixed, sequential pipeline of LLM-backed
//! agent steps. Each step gets a templated instruction for one company plus
//! the verbatim outputs of the earlier steps it names, may call market-data
//! and web-search tools, and produces one text artifact. The last step's text
//! becomes the report, which is written to disk, rendered to PDF and
//! optionally emailed.
//!
//! ## Overview
//!
//! Tickerwise can be used in two ways:
//!
//! 1. **As a CLI / server** - Run the `tickerwise` binary (`generate`, `serve`, ...)
//! 2. **As a library** - Build your own pipelines over the same runner
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickerwise::{ReportService, RunContext, Settings};
//! use std::path::Path;
//!
//! let settings = Settings::load(Path::new("tickerwise.toml"), false)?;
//! let service = ReportService::from_settings(&settings)?;
//!
//! let report = service.generate(&RunContext::new("RELIANCE.NS")?).await?;
//! println!("{}", report.result.report);
//! ```
//!
//! ## Modules
//!
//! - [`workflows`] - Pipeline definition, validation and the sequential runner
//! - [`agents`] - Step resolvers (`Agent` trait, tool-calling agent)
//! - [`llm`] - OpenAI-compatible LLM client and the tool-calling loop
//! - [`tools`] - Market-data and web-search tools behind a never-failing registry
//! - [`report`] - Text/HTML/PDF artifacts
//! - [`mail`] - SMTP delivery of the rendered report
//! - [`api`] - HTTP API handlers and routes
//! - [`types`] - Common types and error handling
//!
//! ## Configuration
//!
//! - **TOML** (`tickerwise.toml`): provider, pipeline, data source, report,
//!   email and server settings; every field has a default.
//! - **Environment** (`.env` supported): API key, model name and SMTP
//!   credentials, referenced from the TOML by variable name.

#![warn(rustdoc::missing_crate_level_docs)]

/// Step resolvers.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Report email dispatch.
pub mod mail;
/// Report artifact writing and document rendering.
pub mod report;
/// Report generation service shared by the CLI and the API.
pub mod service;
/// Built-in tools (market data, web search).
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// Sequential task pipeline.
pub mod workflows;

use std::sync::Arc;

// Re-export commonly used types
pub use llm::{LLMClient, LLMResponse, Provider};
pub use service::{GeneratedReport, ReportService};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::{Settings, TickerwiseConfig};
pub use workflows::{Pipeline, PipelineRunner, RunContext, RunResult, Step, StepResult};

/// Shared state of the HTTP API
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
}

impl AppState {
    pub fn new(service: ReportService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
