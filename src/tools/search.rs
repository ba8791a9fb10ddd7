//! Web search tool using daedra
//!
//! DuckDuckGo results are flattened into a numbered text block so the model
//! sees the same shape whatever the backend returns.

use crate::tools::registry::{Tool, ToolError};
use async_trait::async_trait;

/// Web search tool powered by daedra
pub struct SearchTool {
    num_results: usize,
}

impl SearchTool {
    pub fn new(num_results: usize) -> Self {
        Self { num_results }
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new(5)
    }
}

/// One search hit as shown to the model
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Render hits as text, or a fixed notice when there are none
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{}'", query);
    }

    let mut output = format!("Search results for '{}':\n", query);
    for (i, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "\n{}. {}\n   {}\n   {}\n",
            i + 1,
            hit.title,
            hit.url,
            hit.description
        ));
    }
    output
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information on a given topic using DuckDuckGo."
    }

    fn argument_name(&self) -> &str {
        "query"
    }

    fn failure_context(&self, _argument: &str) -> String {
        "searching the web".to_string()
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
        let query = argument.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument("query must not be empty".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.num_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| ToolError::Request(format!("search failed: {}", e)))?;

        let hits: Vec<SearchHit> = response
            .data
            .iter()
            .take(self.num_results)
            .map(|r| SearchHit {
                title: r.title.to_string(),
                url: r.url.to_string(),
                description: r.description.to_string(),
            })
            .collect();

        tracing::debug!(query, hits = hits.len(), "web search complete");
        Ok(format_hits(query, &hits))
    }
}
