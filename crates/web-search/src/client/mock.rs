//! Static Search Client
//!
//! For tests and offline demos. Returns a fixed set of hits and records every
//! request it receives.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::SearchClient;
use crate::error::{Result, SearchError};
use crate::model::{SearchHit, SearchRequest, SearchResponse};

pub struct StaticSearchClient {
    hits: Vec<SearchHit>,
    fail: bool,
    requests: Mutex<Vec<SearchRequest>>,
}

impl StaticSearchClient {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every search fails at the transport level
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    /// Convenience hit builder
    pub fn hit(title: &str, url: &str, content: &str) -> SearchHit {
        SearchHit {
            title: Some(title.into()),
            url: Some(url.into()),
            content: Some(content.into()),
            snippet: None,
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SearchClient for StaticSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if self.fail {
            return Err(SearchError::Config("static client configured to fail".into()));
        }

        Ok(SearchResponse {
            results: self.hits.iter().take(request.max_results).cloned().collect(),
            answer: None,
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}
