//! Web Search Tool
//!
//! Lets the model request fresh search results mid-loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolDefinition, ToolResult};

use crate::client::SearchClient;
use crate::format::format_observation;
use crate::model::{SearchRequest, SearchResponse, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};

pub const WEB_SEARCH_TOOL: &str = "web_search";

const DESCRIPTION: &str = r#"Search the web for current/fresh information. Use this whenever the user asks for:
- Latest news, updates, or recent events ("What's the latest news about X?")
- Current information that changes over time (weather, prices, scores)
- Facts that may have changed since my training data ("Is X still true?")
- How to do something with current methods
- Product comparisons or recommendations ("Best laptop for coding")
- Trending topics or viral content
- Verifying current facts ("What's the population of X?")
- Any question where my knowledge might be outdated

After getting search results, provide a clear answer based on the actual results."#;

#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    #[serde(default)]
    query: String,
    #[serde(default)]
    max_results: Option<i64>,
}

impl WebSearchArgs {
    fn max_results(&self) -> usize {
        self.max_results.map_or(DEFAULT_MAX_RESULTS, |n| {
            usize::try_from(n.max(1)).map_or(DEFAULT_MAX_RESULTS, |n| n.min(MAX_RESULTS_LIMIT))
        })
    }
}

/// Tool for searching the web
pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
}

impl WebSearchTool {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: WEB_SEARCH_TOOL.into(),
            description: DESCRIPTION.into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "A detailed search query. Include context like date, location, or specific aspects to find."
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Number of search results (default 6, max 10). Use 6-8 for most queries, 10 for comprehensive research.",
                        "default": DEFAULT_MAX_RESULTS,
                        "maximum": MAX_RESULTS_LIMIT
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: WebSearchArgs = call.parse_arguments()?;
        let query = args.query.trim();

        if query.is_empty() {
            return Ok(ToolResult::failure(WEB_SEARCH_TOOL, "No query provided for web_search"));
        }

        let request = SearchRequest::new(query, args.max_results());
        tracing::info!(query = %query, max_results = request.max_results, client = self.client.name(), "Executing web_search");

        let response = match self.client.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Search failed, returning empty results");
                SearchResponse::empty()
            }
        };

        Ok(ToolResult::success(
            WEB_SEARCH_TOOL,
            format_observation(query, &response.results, request.max_results),
        ))
    }
}
