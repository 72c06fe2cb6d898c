//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern: the model is called with the
//! conversation and the tool definitions, requested tools are executed, their
//! observations appended, and the cycle repeats until the model answers
//! without tool calls or the iteration budget is spent.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider, ProviderResponse};
use crate::session::{AgentOutcome, AgentSession, LoopState};
use crate::tool::{ToolDefinition, ToolRegistry};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt placed first in every conversation
    pub system_prompt: String,

    /// Maximum provider calls per run
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Pause after each batch of tool calls
    pub tool_pause: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 5,
            generation: GenerationOptions::default(),
            tool_pause: Duration::from_millis(300),
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = r"You are a helpful AI assistant with real-time web access.

## Real-time capabilities
- When you have search results, use them to provide CURRENT information
- Call the web_search tool whenever the answer depends on fresh information
- Provide accurate, up-to-date answers based on search results

## Important
- If search results are provided, base your answer on them
- Cite sources from search results when relevant
- Be helpful, accurate, and professional
- If no search results are available, use your knowledge but note it's not real-time";

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Answer a single user message in a fresh conversation
    pub async fn ask(&self, question: &str) -> Result<AgentOutcome> {
        let conversation =
            Conversation::from_history(&self.config.system_prompt, vec![Message::user(question)]);
        self.run(conversation).await
    }

    /// Continue a multi-turn dialogue given its prior turns
    pub async fn continue_dialogue(&self, history: Vec<Message>) -> Result<AgentOutcome> {
        let conversation = Conversation::from_history(&self.config.system_prompt, history);
        self.run(conversation).await
    }

    /// Drive the loop over a conversation whose first message is the system prompt.
    ///
    /// Terminal states are `Done`, `MaxIterationsReached` and `ProviderError`;
    /// all of them yield an answer. `Err` escapes when the provider is
    /// unavailable or the request breaks its preconditions.
    pub async fn run(&self, conversation: Conversation) -> Result<AgentOutcome> {
        if conversation.messages().first().map(|m| m.role) != Some(Role::System) {
            return Err(AgentError::InvalidConversation(
                "first message must be the system prompt".into(),
            ));
        }
        self.config.generation.validate()?;

        let tools = if self.provider.supports_tools() {
            self.tools.definitions()
        } else {
            Vec::new()
        };

        let session = AgentSession::new(conversation, self.config.max_iterations);
        let span = tracing::info_span!("agent", session = %session.id(), backend = self.provider.name());
        self.drive(session, &tools).instrument(span).await
    }

    async fn drive(&self, mut session: AgentSession, tools: &[ToolDefinition]) -> Result<AgentOutcome> {
        while session.begin_iteration() {
            tracing::debug!(iteration = session.iteration(), "Calling provider");

            let response = self
                .provider
                .send(session.messages(), tools, &self.config.generation)
                .await?;

            let completion = match response {
                ProviderResponse::Completion(completion) => completion,
                error @ ProviderResponse::Error { .. } => {
                    tracing::warn!(?error, "Provider returned an error, ending loop");
                    let answer = error.fallback_content().unwrap_or_default();
                    session.finish(LoopState::ProviderError(answer));
                    break;
                }
            };

            if let Some(usage) = &completion.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "Token usage"
                );
            }

            let message = completion.message;
            let calls = message.tool_calls.clone();
            let content = message.content.clone();
            session.record(message);

            if calls.is_empty() {
                session.finish(LoopState::Done(content));
                break;
            }

            // Declared-parallel calls run in order; all observations land
            // before the next provider call.
            for call in &calls {
                let observation = self.tools.execute(call).await;
                session.record(observation);
            }
            tracing::debug!(count = calls.len(), "Executed tool calls");

            if !self.config.tool_pause.is_zero() {
                tokio::time::sleep(self.config.tool_pause).await;
            }
        }

        Ok(session.into_outcome())
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: Arc::new(ToolRegistry::new()),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn tool_pause(mut self, pause: Duration) -> Self {
        self.config.tool_pause = pause;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, self.tools, self.config))
    }
}
