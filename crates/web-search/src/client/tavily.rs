//! Dedicated Search Client
//!
//! Authenticates with a bearer header and treats any non-2xx status as an
//! error.

use std::time::Duration;

use async_trait::async_trait;

use super::{http_client, SearchClient};
use crate::error::{Result, SearchError};
use crate::model::{SearchRequest, SearchResponse};

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SearchError::Config("search API key is empty".into()));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default().chars().take(200).collect();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SearchResponse>().await?)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}
