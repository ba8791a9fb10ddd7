//! Agents that resolve one pipeline step into one text artifact
//!
//! An agent receives an [`AgentTask`] with the fully rendered instruction
//! (context already appended) and answers with an [`AgentOutput`]. The
//! pipeline does not know how the answer was produced.

pub mod tool_calling;

use crate::llm::FinishReason;
use crate::types::{Result, TokenUsage};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use tool_calling::ToolCallingAgent;

/// Placeholder in persona text replaced by the run's as-of date
pub const TODAY_PLACEHOLDER: &str = "{today}";

/// Who the agent is while executing a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Persona {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// System prompt with `{today}` rendered as `YYYY-MM-DD`
    pub fn system_prompt(&self, as_of: NaiveDate) -> String {
        let today = as_of.format("%Y-%m-%d").to_string();
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role,
            self.backstory.replace(TODAY_PLACEHOLDER, &today),
            self.goal.replace(TODAY_PLACEHOLDER, &today),
        )
    }
}

/// Everything an agent needs to execute one step
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTask {
    pub step: String,
    pub persona: Persona,
    /// Substituted template plus any upstream context
    pub instruction: String,
    pub expected_output: String,
    /// Names of the tools the agent may call
    pub tools: Vec<String>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub content: String,
    pub tool_calls: usize,
    pub iterations: usize,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

impl AgentOutput {
    /// An answer produced in one request without tools
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: 0,
            iterations: 1,
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Base trait for step resolvers
#[async_trait]
pub trait Agent: Send + Sync {
    async fn execute(&self, task: &AgentTask) -> Result<AgentOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_renders_today() {
        let persona = Persona::new(
            "News and Info Researcher",
            "Gather news",
            "Consider you are on: {today}",
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let prompt = persona.system_prompt(date);
        assert!(prompt.starts_with("You are News and Info Researcher."));
        assert!(prompt.contains("Consider you are on: 2024-03-01"));
        assert!(prompt.ends_with("Your personal goal is: Gather news"));
    }
}
