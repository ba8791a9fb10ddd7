//! Pipeline definition
//!
//! A [`Pipeline`] is an ordered list of [`Step`]s. Each step may name earlier
//! steps as context; their outputs are appended verbatim to its instruction.
//! Definitions are validated once when the pipeline is built and never change
//! afterwards.

use crate::agents::Persona;
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result};
use crate::workflows::engine::StepResult;
use serde::Serialize;
use std::collections::HashSet;

/// Placeholder in instruction templates replaced by the company identifier
pub const COMPANY_PLACEHOLDER: &str = "{company}";

/// Line placed between a step's instruction and its upstream outputs
pub const CONTEXT_HEADER: &str = "This is the context you're working with:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub name: String,
    pub persona: Persona,
    /// Template containing `{company}`
    pub instruction: String,
    /// Describes the answer; shown to the resolver, never checked
    pub expected_output: String,
    pub tools: Vec<String>,
    /// Upstream step names, in the order their outputs are injected
    pub context: Vec<String>,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        persona: Persona,
        instruction: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            persona,
            instruction: instruction.into(),
            expected_output: expected_output.into(),
            tools: Vec::new(),
            context: Vec::new(),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context<I, S>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = context.into_iter().map(Into::into).collect();
        self
    }
}

/// Replace every `{company}` in `template`
pub fn substitute(template: &str, company: &str) -> String {
    template.replace(COMPANY_PLACEHOLDER, company)
}

#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    name: String,
    steps: Vec<Step>,
    /// For each step, indices of its context steps in declaration order
    #[serde(skip)]
    upstream: Vec<Vec<usize>>,
}

impl Pipeline {
    /// Build a pipeline, rejecting duplicate names and any context reference
    /// that is not to an earlier step.
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Result<Self> {
        let name = name.into();
        if steps.is_empty() {
            return Err(AppError::Configuration(format!(
                "pipeline '{}' has no steps",
                name
            )));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut upstream = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "step {} of pipeline '{}' has an empty name",
                    index, name
                )));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "duplicate step name '{}'",
                    step.name
                )));
            }

            let mut indices = Vec::with_capacity(step.context.len());
            for reference in &step.context {
                let position = steps[..index]
                    .iter()
                    .position(|earlier| &earlier.name == reference);

                match position {
                    Some(i) => indices.push(i),
                    None if reference == &step.name => {
                        return Err(AppError::Configuration(format!(
                            "step '{}' lists itself as context",
                            step.name
                        )));
                    }
                    None => {
                        return Err(AppError::Configuration(format!(
                            "step '{}' references '{}', which is not an earlier step",
                            step.name, reference
                        )));
                    }
                }
            }
            upstream.push(indices);
        }

        Ok(Self {
            name,
            steps,
            upstream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every tool bound to a step must be registered
    pub fn validate_tools(&self, registry: &ToolRegistry) -> Result<()> {
        for step in &self.steps {
            if let Some(missing) = step.tools.iter().find(|tool| !registry.has_tool(tool)) {
                return Err(AppError::Configuration(format!(
                    "step '{}' binds unknown tool '{}'",
                    step.name, missing
                )));
            }
        }
        Ok(())
    }

    /// Instruction for step `index` given the results of the steps before it.
    ///
    /// Without context this is exactly the substituted template.
    pub fn render_instruction(&self, index: usize, company: &str, results: &[StepResult]) -> String {
        let mut instruction = substitute(&self.steps[index].instruction, company);

        let outputs: Vec<&str> = self.upstream[index]
            .iter()
            .filter_map(|&i| results.get(i))
            .map(|result| result.output.as_str())
            .collect();

        if !outputs.is_empty() {
            instruction.push_str("\n\n");
            instruction.push_str(CONTEXT_HEADER);
            instruction.push('\n');
            instruction.push_str(&outputs.join("\n\n"));
        }

        instruction
    }
}
