//! Search Request and Result Types

use serde::{Deserialize, Serialize};

/// Default number of hits requested
pub const DEFAULT_MAX_RESULTS: usize = 6;

/// Upper bound on hits per search
pub const MAX_RESULTS_LIMIT: usize = 10;

/// Parameters sent to the search provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub include_answer: bool,
    pub include_images: bool,
    pub include_raw_content: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
            include_answer: true,
            include_images: false,
            include_raw_content: false,
        }
    }
}

/// Provider response; a body without `results` is an empty result set
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,

    /// Provider-synthesized short answer, when requested
    #[serde(default)]
    pub answer: Option<String>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A single search hit
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl SearchHit {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("No URL")
    }

    /// Content (or snippet) cut to at most `limit` characters
    pub fn excerpt(&self, limit: usize) -> String {
        self.content
            .as_deref()
            .or(self.snippet.as_deref())
            .unwrap_or_default()
            .chars()
            .take(limit)
            .collect()
    }
}
