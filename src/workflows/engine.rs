//! Pipeline Runner
//!
//! Executes a [`Pipeline`] once for one company: every step in declared
//! order, exactly once, each handed to the [`Agent`] with its context
//! already rendered. A step whose agent fails is recorded as `Failed` with an
//! `Error: ...` output, and the run goes on.

use crate::agents::{Agent, AgentTask};
use crate::types::{AppError, Result, TokenUsage};
use crate::workflows::pipeline::{substitute, Pipeline};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Request-scoped identity of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: Uuid,
    pub company: String,
    pub as_of: NaiveDate,
}

impl RunContext {
    /// Fresh run for `company` dated today (local time). The company is
    /// trimmed and must not be empty.
    pub fn new(company: &str) -> Result<Self> {
        Self::with_date(company, Local::now().date_naive())
    }

    pub fn with_date(company: &str, as_of: NaiveDate) -> Result<Self> {
        let company = company.trim();
        if company.is_empty() {
            return Err(AppError::InvalidInput(
                "company identifier must not be empty".to_string(),
            ));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            company: company.to_string(),
            as_of,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub status: StepStatus,
    /// Final text, or `Error: ...` when the step failed
    pub output: String,
    /// Present when the endpoint reported token counts
    pub usage: Option<TokenUsage>,
    pub tool_calls: usize,
    pub iterations: usize,
}

/// Outcome of one run. Holds no timing or run id, so equal inputs against
/// deterministic collaborators compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub company: String,
    pub steps: Vec<StepResult>,
    /// Output of the last step
    pub report: String,
    pub usage: TokenUsage,
}

impl RunResult {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.status == StepStatus::Failed)
    }
}

pub struct PipelineRunner {
    agent: Arc<dyn Agent>,
    context_warn_chars: usize,
}

impl PipelineRunner {
    pub fn new(agent: Arc<dyn Agent>, context_warn_chars: usize) -> Self {
        Self {
            agent,
            context_warn_chars,
        }
    }

    pub async fn run(&self, pipeline: &Pipeline, ctx: &RunContext) -> Result<RunResult> {
        let company = ctx.company.trim();
        if company.is_empty() {
            return Err(AppError::InvalidInput(
                "company identifier must not be empty".to_string(),
            ));
        }

        tracing::info!(
            run_id = %ctx.run_id,
            pipeline = pipeline.name(),
            company,
            steps = pipeline.len(),
            "pipeline run started"
        );

        let mut results: Vec<StepResult> = Vec::with_capacity(pipeline.len());
        let mut usage = TokenUsage::default();

        for (index, step) in pipeline.steps().iter().enumerate() {
            let instruction = pipeline.render_instruction(index, company, &results);

            let template_len = substitute(&step.instruction, company).len();
            let context_len = instruction.len() - template_len;
            if context_len > self.context_warn_chars {
                tracing::warn!(
                    step = %step.name,
                    context_chars = context_len,
                    threshold = self.context_warn_chars,
                    "injected context is large"
                );
            }

            let task = AgentTask {
                step: step.name.clone(),
                persona: step.persona.clone(),
                instruction,
                expected_output: substitute(&step.expected_output, company),
                tools: step.tools.clone(),
                as_of: ctx.as_of,
            };

            tracing::info!(run_id = %ctx.run_id, step = %step.name, "step started");
            let start = Instant::now();

            let result = match self.agent.execute(&task).await {
                Ok(output) => {
                    usage.accumulate(&output.usage);
                    StepResult {
                        step: step.name.clone(),
                        status: StepStatus::Completed,
                        output: output.content,
                        usage: (output.usage != TokenUsage::default()).then_some(output.usage),
                        tool_calls: output.tool_calls,
                        iterations: output.iterations,
                    }
                }
                Err(e) => {
                    tracing::warn!(step = %step.name, error = %e, "step failed");
                    StepResult {
                        step: step.name.clone(),
                        status: StepStatus::Failed,
                        output: format!("Error: {}", e),
                        usage: None,
                        tool_calls: 0,
                        iterations: 0,
                    }
                }
            };

            tracing::info!(
                run_id = %ctx.run_id,
                step = %step.name,
                status = ?result.status,
                duration_ms = start.elapsed().as_millis() as u64,
                output_chars = result.output.len(),
                "step finished"
            );

            results.push(result);
        }

        let report = results
            .last()
            .map(|r| r.output.clone())
            .unwrap_or_default();

        tracing::info!(run_id = %ctx.run_id, tokens = usage.total_tokens, "pipeline run finished");

        Ok(RunResult {
            company: company.to_string(),
            steps: results,
            report,
            usage,
        })
    }
}
