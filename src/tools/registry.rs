use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Prefix of every text a tool wrapper returns in place of data
pub const ERROR_MARKER: &str = "Error";

/// Failure raised inside a tool before the registry converts it to text
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("no data for {0}")]
    NoData(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Request(e.to_string())
    }
}

/// A named capability a step may invoke: one string in, one string out.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Name of the single string parameter advertised to the model
    fn argument_name(&self) -> &str {
        "ticker"
    }

    /// What the wrapper says it was doing when the tool failed on `argument`
    fn failure_context(&self, _argument: &str) -> String {
        format!("running {}", self.name())
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError>;

    fn parameters_schema(&self) -> Value {
        let arg = self.argument_name();
        let mut properties = serde_json::Map::new();
        properties.insert(
            arg.to_string(),
            json!({
                "type": "string",
                "description": format!("The {} to look up", arg)
            }),
        );

        json!({
            "type": "object",
            "properties": properties,
            "required": [arg]
        })
    }
}

pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Definitions for the named tools only, in the order given
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| definition(tool.as_ref()))
            .collect()
    }

    /// Get the advertised argument name of a tool
    pub fn argument_name(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|tool| tool.argument_name())
    }

    /// Invoke a tool by name. Never fails: an unknown tool or a tool error
    /// comes back as a text starting with [`ERROR_MARKER`].
    pub async fn invoke(&self, name: &str, argument: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "requested tool is not registered");
            return format!("{}: tool '{}' is not available", ERROR_MARKER, name);
        };

        match tool.invoke(argument).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = name, argument, error = %e, "tool invocation failed");
                format!("{} {}: {}", ERROR_MARKER, tool.failure_context(argument), e)
            }
        }
    }

    /// Get a list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

fn definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }
        fn description(&self) -> &str {
            "Uppercases the input"
        }
        fn argument_name(&self) -> &str {
            "text"
        }
        async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
            Ok(argument.to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn failure_context(&self, _argument: &str) -> String {
            "fetching stock data".to_string()
        }
        async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
            Err(ToolError::NoData(argument.to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Broken));
        registry
    }

    #[test]
    fn test_registry_creation() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.tool_names().len(), 0);
    }

    #[test]
    fn test_definitions_for_filters_and_keeps_order() {
        let registry = registry();
        let defs = registry.definitions_for(&[
            "upper".to_string(),
            "missing".to_string(),
            "broken".to_string(),
        ]);
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["upper", "broken"]);
    }

    #[test]
    fn test_parameters_schema_uses_argument_name() {
        let schema = Upper.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["text"].is_object());
        assert_eq!(schema["required"][0], "text");
    }

    #[tokio::test]
    async fn test_invoke_success() {
        assert_eq!(registry().invoke("upper", "acme").await, "ACME");
    }

    #[tokio::test]
    async fn test_invoke_error_becomes_text() {
        let output = registry().invoke("broken", "ACME").await;
        assert!(output.starts_with(ERROR_MARKER));
        assert_eq!(output, "Error fetching stock data: no data for ACME");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let output = registry().invoke("nonexistent_tool", "x").await;
        assert!(output.starts_with(ERROR_MARKER));
        assert!(output.contains("nonexistent_tool"));
    }
}
