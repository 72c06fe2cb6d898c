//! Fallback Orchestrator
//!
//! Sequences the configured backends for one chat turn. The tool-capable
//! primary runs the full agent loop; if that raises, the conversation is sent
//! flattened to the secondary as a plain chat completion. Backends are always
//! tried in that order.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, OrchestratorError};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider, ProviderResponse};
use crate::reasoning::{Agent, AgentConfig};
use crate::session::AgentOutcome;
use crate::tool::ToolRegistry;

/// A configured upstream provider with its generation options
#[derive(Clone)]
pub struct Backend {
    pub provider: Arc<dyn LlmProvider>,
    pub generation: GenerationOptions,
}

impl Backend {
    pub fn new(provider: Arc<dyn LlmProvider>, generation: GenerationOptions) -> Self {
        Self {
            provider,
            generation,
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Search results fetched eagerly before the first provider call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectedSearch {
    pub query: String,
    /// Pre-formatted result list
    pub results: String,
}

impl InjectedSearch {
    /// Text that replaces the user's last turn
    pub fn render(&self) -> String {
        format!(
            "Based on a web search for \"{}\", here are the current results:\n\n{}\n\n---\nPlease provide a clear, accurate answer based on these search results.",
            self.query, self.results
        )
    }
}

/// One inbound chat turn
#[derive(Clone, Debug, Default)]
pub struct ChatTurn {
    /// Prior turns ending with the user's latest message; no system prompt
    pub history: Vec<Message>,
    pub search: Option<InjectedSearch>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatTurn {
    pub fn new(history: Vec<Message>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<InjectedSearch>) -> Self {
        self.search = search;
        self
    }

    /// History with the search context swapped into the last user turn
    fn prepared_history(&self) -> Vec<Message> {
        let mut history = self.history.clone();
        if let Some(search) = &self.search {
            let context = search.render();
            match history.iter_mut().rev().find(|m| m.role == Role::User) {
                Some(last_user) => last_user.content = context,
                None => history.push(Message::user(context)),
            }
        }
        history
    }
}

/// OpenAI-style chat completion envelope returned to callers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChoiceMessage,
    pub finish_reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    pub content: String,
}

impl ChatCompletion {
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            object: "chat.completion".into(),
            created: Utc::now().timestamp(),
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: content.into(),
                },
                finish_reason: "stop".into(),
            }],
        }
    }

    /// Content of the first choice
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }
}

/// Multi-backend orchestrator with ordered failover
pub struct FallbackOrchestrator {
    primary: Option<Backend>,
    secondary: Option<Backend>,
    tools: Arc<ToolRegistry>,
    agent: AgentConfig,
}

impl FallbackOrchestrator {
    pub fn new(
        primary: Option<Backend>,
        secondary: Option<Backend>,
        tools: Arc<ToolRegistry>,
        agent: AgentConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            tools,
            agent,
        }
    }

    pub const fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub const fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Produce an answer for one turn.
    ///
    /// A `ProviderError` answer from the primary loop is a completed result;
    /// only a raised fault moves on to the secondary.
    pub async fn handle(&self, turn: ChatTurn) -> Result<ChatCompletion, OrchestratorError> {
        if self.primary.is_none() && self.secondary.is_none() {
            tracing::error!("No chat backend configured");
            return Err(OrchestratorError::NotConfigured);
        }

        let history = turn.prepared_history();
        let mut primary_failure = None;

        if let Some(primary) = &self.primary {
            match self.run_primary(primary, &turn, history.clone()).await {
                Ok(outcome) => {
                    tracing::info!(
                        backend = primary.name(),
                        status = ?outcome.status,
                        iterations = outcome.iterations,
                        "Primary backend answered"
                    );
                    return Ok(ChatCompletion::new(&primary.generation.model, outcome.answer));
                }
                Err(e) => {
                    tracing::warn!(backend = primary.name(), error = %e, "Primary backend failed, falling back");
                    primary_failure = Some(e.to_string());
                }
            }
        }

        let Some(secondary) = &self.secondary else {
            return Err(OrchestratorError::Exhausted {
                primary: primary_failure,
                secondary: None,
            });
        };

        match self.run_secondary(secondary, &turn, history).await {
            Ok(content) => {
                tracing::info!(backend = secondary.name(), "Secondary backend answered");
                Ok(ChatCompletion::new(&secondary.generation.model, content))
            }
            Err(e) => {
                tracing::error!(backend = secondary.name(), error = %e, "Secondary backend failed");
                Err(OrchestratorError::Exhausted {
                    primary: primary_failure,
                    secondary: Some(e.to_string()),
                })
            }
        }
    }

    async fn run_primary(
        &self,
        backend: &Backend,
        turn: &ChatTurn,
        history: Vec<Message>,
    ) -> Result<AgentOutcome, AgentError> {
        let config = AgentConfig {
            generation: backend
                .generation
                .clone()
                .with_overrides(turn.temperature, turn.max_tokens),
            ..self.agent.clone()
        };
        let agent = Agent::new(backend.provider.clone(), self.tools.clone(), config);

        match history.as_slice() {
            [only] if only.role == Role::User => agent.ask(&only.content).await,
            _ => agent.continue_dialogue(history).await,
        }
    }

    async fn run_secondary(
        &self,
        backend: &Backend,
        turn: &ChatTurn,
        history: Vec<Message>,
    ) -> Result<String, AgentError> {
        let options = backend
            .generation
            .clone()
            .with_overrides(turn.temperature, turn.max_tokens);
        let conversation = Conversation::from_history(&self.agent.system_prompt, history).flattened();

        match backend.provider.send(conversation.messages(), &[], &options).await? {
            ProviderResponse::Completion(completion) => Ok(completion.message.content),
            ProviderResponse::Error { error } => Err(AgentError::Provider(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, Step};
    use std::time::Duration;

    fn backend(provider: &Arc<ScriptedProvider>, model: &str) -> Backend {
        Backend::new(
            provider.clone(),
            GenerationOptions {
                model: model.into(),
                ..GenerationOptions::default()
            },
        )
    }

    fn orchestrator(
        primary: Option<&Arc<ScriptedProvider>>,
        secondary: Option<&Arc<ScriptedProvider>>,
    ) -> FallbackOrchestrator {
        FallbackOrchestrator::new(
            primary.map(|p| backend(p, "primary-model")),
            secondary.map(|s| backend(s, "secondary-model")),
            Arc::new(ToolRegistry::new()),
            AgentConfig {
                tool_pause: Duration::ZERO,
                ..AgentConfig::default()
            },
        )
    }

    fn turn(text: &str) -> ChatTurn {
        ChatTurn::new(vec![Message::user(text)])
    }

    #[tokio::test]
    async fn test_no_backends_is_config_error() {
        let result = orchestrator(None, None).handle(turn("hi")).await;
        assert_eq!(result.unwrap_err(), OrchestratorError::NotConfigured);
    }

    #[tokio::test]
    async fn test_primary_answers() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::answer("from primary")]));
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::answer("unused")]));

        let completion = orchestrator(Some(&primary), Some(&secondary))
            .handle(turn("hi"))
            .await
            .unwrap();

        assert_eq!(completion.content(), "from primary");
        assert_eq!(completion.model, "primary-model");
        assert_eq!(completion.object, "chat.completion");
        assert_eq!(completion.choices[0].finish_reason, "stop");
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_raised_primary_falls_back_to_secondary() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::Raise("connection refused".into())]));
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::answer("from secondary")]));

        let completion = orchestrator(Some(&primary), Some(&secondary))
            .handle(turn("hi"))
            .await
            .unwrap();

        assert_eq!(completion.content(), "from secondary");
        assert_eq!(completion.model, "secondary-model");
        assert!(!completion.content().contains("connection refused"));
        assert_eq!(secondary.tool_counts(), vec![0]);
    }

    #[tokio::test]
    async fn test_provider_error_answer_is_not_a_failure() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::Error("HTTP 500".into())]));
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::answer("unused")]));

        let completion = orchestrator(Some(&primary), Some(&secondary))
            .handle(turn("hi"))
            .await
            .unwrap();

        assert!(completion.content().starts_with("API error: HTTP 500."));
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_both_failing_reports_both_reasons() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::Raise("timeout".into())]));
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::Error("HTTP 429".into())]));

        let err = orchestrator(Some(&primary), Some(&secondary))
            .handle(turn("hi"))
            .await
            .unwrap_err();

        match err {
            OrchestratorError::Exhausted { primary, secondary } => {
                assert!(primary.unwrap().contains("timeout"));
                assert!(secondary.unwrap().contains("HTTP 429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_secondary_only() {
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::answer("solo")]));
        let completion = orchestrator(None, Some(&secondary)).handle(turn("hi")).await.unwrap();
        assert_eq!(completion.content(), "solo");
    }

    #[tokio::test]
    async fn test_secondary_receives_flattened_conversation() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::Raise("down".into())]));
        let secondary = Arc::new(ScriptedProvider::without_tools(vec![Step::answer("ok")]));
        let history = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];

        orchestrator(Some(&primary), Some(&secondary))
            .handle(ChatTurn::new(history))
            .await
            .unwrap();

        let sent = &secondary.requests()[0];
        let roles: Vec<Role> = sent.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(sent[3].content, "second");
    }

    #[tokio::test]
    async fn test_injected_search_replaces_last_user_turn() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::answer("sunny")]));
        let search = InjectedSearch {
            query: "weather in Tokyo".into(),
            results: "[1] Tokyo forecast".into(),
        };
        let turn = turn("weather in Tokyo").with_search(Some(search));

        orchestrator(Some(&primary), None).handle(turn).await.unwrap();

        let sent = &primary.requests()[0];
        assert_eq!(sent.len(), 2);
        assert!(sent[1].content.starts_with("Based on a web search for \"weather in Tokyo\""));
        assert!(sent[1].content.contains("[1] Tokyo forecast"));
    }

    #[tokio::test]
    async fn test_overrides_reach_backend() {
        let primary = Arc::new(ScriptedProvider::new(vec![Step::Raise("down".into())]));
        let mut turn = turn("hi");
        turn.temperature = Some(5.0);

        let err = orchestrator(Some(&primary), None).handle(turn).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Exhausted { secondary: None, .. }));
        assert_eq!(primary.calls(), 0);
    }
}
