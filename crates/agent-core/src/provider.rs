//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for chat-completion backends so the agent loop
//! and the fallback orchestrator work with any of them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider, ProviderResponse};
//!
//! let response = provider.send(&messages, &tools, &options).await?;
//! match response {
//!     ProviderResponse::Completion(c) => println!("{}", c.message.content),
//!     ProviderResponse::Error { error } => eprintln!("{error}"),
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Message, Role};
use crate::tool::ToolDefinition;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier sent to the backend
    pub model: String,

    /// Temperature for sampling, within [0, 2]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    2048
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "MiniMaxAI/MiniMax-M2.1".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationOptions {
    /// Check temperature and token bounds
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::InvalidOptions(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::InvalidOptions("max_tokens must be positive".into()));
        }
        Ok(())
    }

    /// Apply per-request overrides, ignoring `None`
    #[must_use]
    pub fn with_overrides(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        if let Some(t) = temperature {
            self.temperature = t;
        }
        if let Some(m) = max_tokens {
            self.max_tokens = m;
        }
        self
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(other)]
    Other,
}

/// Successful response from one provider call
#[derive(Clone, Debug)]
pub struct Completion {
    /// Assistant message, including any tool calls
    pub message: Message,

    /// Model that generated this response
    pub model: String,

    /// Finish reason reported by the backend
    pub finish_reason: Option<FinishReason>,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
}

/// Canonical result of one provider call
#[derive(Clone, Debug)]
pub enum ProviderResponse {
    Completion(Completion),
    /// Error answered by the backend itself, described as text
    Error { error: String },
}

impl ProviderResponse {
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Pre-formatted apology used as the answer when the loop stops on this error
    pub fn fallback_content(&self) -> Option<String> {
        match self {
            Self::Error { error } => Some(format!(
                "API error: {error}. Falling back to internal knowledge."
            )),
            Self::Completion(_) => None,
        }
    }
}

/// Check the preconditions every provider call relies on
pub fn validate_request(messages: &[Message], options: &GenerationOptions) -> Result<()> {
    match messages.first() {
        None => return Err(AgentError::InvalidConversation("no messages to send".into())),
        Some(m) if m.role != Role::System => {
            return Err(AgentError::InvalidConversation(
                "first message must be the system prompt".into(),
            ));
        }
        Some(_) => {}
    }
    options.validate()
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new chat-completion backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name used in logs and failure reports
    fn name(&self) -> &str;

    /// Whether tool definitions may be sent to this backend
    fn supports_tools(&self) -> bool;

    /// Send one chat-completion request.
    ///
    /// An error answered by the backend becomes [`ProviderResponse::Error`].
    /// `Err` means the backend could not be used at all: violated
    /// preconditions, or `ProviderUnavailable` once every endpoint has failed.
    async fn send(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<ProviderResponse>;
}
