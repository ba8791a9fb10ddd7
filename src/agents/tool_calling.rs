//! LLM-backed agent that may call the step's bound tools

use crate::agents::{Agent, AgentOutput, AgentTask};
use crate::llm::{LLMClient, ToolCallingConfig, ToolCoordinator};
use crate::tools::registry::ToolRegistry;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Agent that runs every task through a [`ToolCoordinator`]
pub struct ToolCallingAgent {
    coordinator: ToolCoordinator,
}

impl ToolCallingAgent {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        tool_registry: Arc<ToolRegistry>,
        max_tool_iterations: usize,
    ) -> Self {
        let config = ToolCallingConfig {
            max_iterations: max_tool_iterations,
        };

        Self {
            coordinator: ToolCoordinator::new(llm, tool_registry, config),
        }
    }

    pub fn max_tool_iterations(&self) -> usize {
        self.coordinator.config().max_iterations
    }

    /// User message: the instruction followed by the answer criteria
    pub fn task_prompt(task: &AgentTask) -> String {
        format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            task.instruction, task.expected_output
        )
    }
}

#[async_trait]
impl Agent for ToolCallingAgent {
    async fn execute(&self, task: &AgentTask) -> Result<AgentOutput> {
        let system = task.persona.system_prompt(task.as_of);
        let prompt = Self::task_prompt(task);

        let result = self
            .coordinator
            .execute(Some(&system), &prompt, &task.tools)
            .await?;

        tracing::debug!(
            step = %task.step,
            iterations = result.iterations,
            tool_calls = result.tool_calls.len(),
            finish_reason = %result.finish_reason,
            "agent finished"
        );

        Ok(AgentOutput {
            content: result.content,
            tool_calls: result.tool_calls.len(),
            iterations: result.iterations,
            usage: result.total_usage,
            finish_reason: result.finish_reason,
        })
    }
}
