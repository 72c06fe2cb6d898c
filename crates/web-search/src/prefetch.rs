//! Eager Search Prefetch
//!
//! When the trigger heuristic fires, search before the first provider call
//! and hand the results to the orchestrator for injection.

use std::sync::Arc;

use agent_core::InjectedSearch;

use crate::client::SearchClient;
use crate::format::format_context;
use crate::model::{SearchRequest, DEFAULT_MAX_RESULTS};
use crate::trigger::needs_search;

pub struct SearchPrefetcher {
    client: Arc<dyn SearchClient>,
    max_results: usize,
}

impl SearchPrefetcher {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Search only when [`needs_search`] fires for `query`
    pub async fn prefetch_if_needed(&self, query: &str) -> Option<InjectedSearch> {
        if !needs_search(query) {
            return None;
        }
        tracing::info!(query = %truncate(query, 100), "Query needs current information, searching eagerly");
        self.prefetch(query).await
    }

    /// Search unconditionally; failures and empty result sets yield `None`
    pub async fn prefetch(&self, query: &str) -> Option<InjectedSearch> {
        let request = SearchRequest::new(query, self.max_results);

        let response = match self.client.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(client = self.client.name(), error = %e, "Eager search failed");
                return None;
            }
        };

        let results = format_context(&response.results, request.max_results)?;
        tracing::debug!(chars = results.len(), "Injecting search results");

        Some(InjectedSearch {
            query: query.to_string(),
            results,
        })
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
