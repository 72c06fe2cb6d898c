//! Raw HTTP Search Client
//!
//! Posts the credential inside the JSON body. A non-200 status yields an
//! empty result set instead of an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{http_client, SearchClient};
use crate::error::Result;
use crate::model::{SearchRequest, SearchResponse};

#[derive(Serialize)]
struct RawBody<'a> {
    api_key: &'a str,
    #[serde(flatten)]
    request: &'a SearchRequest,
}

pub struct RawHttpSearchClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl RawHttpSearchClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchClient for RawHttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = RawBody {
            api_key: &self.api_key,
            request,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(status = %response.status(), "Search endpoint returned non-200, using empty results");
            return Ok(SearchResponse::empty());
        }

        Ok(response.json::<SearchResponse>().await?)
    }

    fn name(&self) -> &str {
        "raw-http"
    }
}
