//! Application Configuration
//!
//! Built once at startup from the environment and passed by reference to
//! everything that needs it.

use std::time::Duration;

use anyhow::Context;

use agent_core::GenerationOptions;

pub const DEFAULT_PRIMARY_ENDPOINTS: &[&str] = &[
    "https://api.siliconflow.cn/v1/chat/completions",
    "https://api.siliconflow.com/v1/chat/completions",
];
pub const DEFAULT_PRIMARY_MODEL: &str = "MiniMaxAI/MiniMax-M2.1";

pub const DEFAULT_SECONDARY_ENDPOINTS: &[&str] = &["https://api.groq.com/openai/v1/chat/completions"];
pub const DEFAULT_SECONDARY_MODEL: &str = "llama-3.3-70b-versatile";

/// One chat backend's settings
#[derive(Clone)]
pub struct BackendSettings {
    pub api_key: String,
    pub endpoints: Vec<String>,
    pub generation: GenerationOptions,
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("api_key", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .field("generation", &self.generation)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Search provider settings
#[derive(Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub endpoint: String,
    /// Skip the dedicated client and always post the raw request
    pub raw_http: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("raw_http", &self.raw_http)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tool-capable backend
    pub primary: Option<BackendSettings>,
    /// Plain-chat backend
    pub secondary: Option<BackendSettings>,
    pub search: Option<SearchSettings>,
    pub max_iterations: usize,
    pub tool_pause: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let primary = credential(&lookup, "SILICONFLOW_API_KEY").map(|api_key| BackendSettings {
            api_key,
            endpoints: endpoints(&lookup, "PRIMARY_ENDPOINTS", DEFAULT_PRIMARY_ENDPOINTS),
            generation: GenerationOptions {
                model: text(&lookup, "PRIMARY_MODEL").unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.into()),
                temperature: 0.7,
                max_tokens: 2048,
            },
            timeout: Duration::from_secs(180),
        });

        let secondary = credential(&lookup, "GROQ_API_KEY").map(|api_key| BackendSettings {
            api_key,
            endpoints: endpoints(&lookup, "SECONDARY_ENDPOINTS", DEFAULT_SECONDARY_ENDPOINTS),
            generation: GenerationOptions {
                model: text(&lookup, "SECONDARY_MODEL").unwrap_or_else(|| DEFAULT_SECONDARY_MODEL.into()),
                temperature: 0.7,
                max_tokens: 4000,
            },
            timeout: Duration::from_secs(60),
        });

        let search = credential(&lookup, "TAVILY_API_KEY").map(|api_key| SearchSettings {
            api_key,
            endpoint: text(&lookup, "SEARCH_ENDPOINT")
                .unwrap_or_else(|| web_search::client::DEFAULT_SEARCH_ENDPOINT.into()),
            raw_http: text(&lookup, "SEARCH_RAW_HTTP").is_some_and(|v| flag(&v)),
            timeout: web_search::client::DEFAULT_SEARCH_TIMEOUT,
        });

        let max_iterations = number(&lookup, "AGENT_MAX_ITERATIONS", 5)?;
        let tool_pause = Duration::from_millis(number(&lookup, "AGENT_TOOL_PAUSE_MS", 300)?);
        let bind_addr = text(&lookup, "BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());

        Ok(Self {
            primary,
            secondary,
            search,
            max_iterations,
            tool_pause,
            bind_addr,
        })
    }
}

fn text(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn credential(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = text(lookup, key)?;
    if value.len() <= 10 || value.contains(' ') {
        tracing::warn!(variable = key, "Credential does not look like an API key");
    }
    Some(value)
}

fn endpoints(lookup: &impl Fn(&str) -> Option<String>, key: &str, defaults: &[&str]) -> Vec<String> {
    let configured: Vec<String> = text(lookup, key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if configured.is_empty() {
        defaults.iter().map(|s| (*s).to_string()).collect()
    } else {
        configured
    }
}

fn number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text(lookup, key).map_or(Ok(default), |v| {
        v.parse().with_context(|| format!("{key} must be a non-negative integer, got {v:?}"))
    })
}

fn flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
