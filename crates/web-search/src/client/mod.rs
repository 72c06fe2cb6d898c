//! Search Provider Clients
//!
//! Abstractions and implementations for the web search provider.

mod mock;
mod raw;
mod tavily;

pub use mock::StaticSearchClient;
pub use raw::RawHttpSearchClient;
pub use tavily::TavilyClient;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{SearchRequest, SearchResponse};

/// Public search endpoint
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";

/// Per-request timeout for search calls
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Search client trait (Strategy pattern)
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;

    /// Client name for logs
    fn name(&self) -> &str;
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
