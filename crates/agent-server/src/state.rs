//! Application State

use std::sync::Arc;

use agent_core::{AgentConfig, Backend, FallbackOrchestrator, ToolRegistry};
use agent_runtime::{BackendConfig, OpenAiCompatProvider};
use web_search::{
    tools::WebSearchTool, RawHttpSearchClient, SearchClient, SearchPrefetcher, TavilyClient,
};

use crate::config::{AppConfig, BackendSettings, SearchSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backend sequencing for every chat turn
    pub orchestrator: Arc<FallbackOrchestrator>,

    /// Eager search (None if search is not configured)
    pub prefetcher: Option<Arc<SearchPrefetcher>>,
}

impl AppState {
    pub fn new(orchestrator: FallbackOrchestrator, prefetcher: Option<SearchPrefetcher>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            prefetcher: prefetcher.map(Arc::new),
        }
    }

    /// Wire providers, search and tools from configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let primary = config
            .primary
            .as_ref()
            .map(|settings| backend("primary", settings, true))
            .transpose()?;
        let secondary = config
            .secondary
            .as_ref()
            .map(|settings| backend("secondary", settings, false))
            .transpose()?;

        let search = config.search.as_ref().map(search_client).transpose()?;

        let mut tools = ToolRegistry::new();
        if let Some(client) = &search {
            tools.register(WebSearchTool::new(client.clone()));
        }

        let agent = AgentConfig {
            max_iterations: config.max_iterations,
            tool_pause: config.tool_pause,
            ..AgentConfig::default()
        };

        let orchestrator = FallbackOrchestrator::new(primary, secondary, Arc::new(tools), agent);
        Ok(Self::new(orchestrator, search.map(SearchPrefetcher::new)))
    }
}

fn backend(name: &str, settings: &BackendSettings, supports_tools: bool) -> anyhow::Result<Backend> {
    let config = BackendConfig::new(name, settings.api_key.clone(), settings.endpoints.clone())
        .with_tools(supports_tools)
        .with_timeout(settings.timeout);
    let provider = OpenAiCompatProvider::from_config(config)?;
    Ok(Backend::new(Arc::new(provider), settings.generation.clone()))
}

fn search_client(settings: &SearchSettings) -> anyhow::Result<Arc<dyn SearchClient>> {
    let client: Arc<dyn SearchClient> = if settings.raw_http {
        Arc::new(RawHttpSearchClient::new(
            settings.api_key.clone(),
            settings.endpoint.clone(),
            settings.timeout,
        )?)
    } else {
        Arc::new(TavilyClient::new(
            settings.api_key.clone(),
            settings.endpoint.clone(),
            settings.timeout,
        )?)
    };
    Ok(client)
}
