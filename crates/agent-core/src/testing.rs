//! Scripted Provider
//!
//! In-memory [`LlmProvider`] that replays a fixed script. Used by tests across
//! the workspace to drive the loop and the fallback orchestrator without a
//! network.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ProviderResponse};
use crate::tool::{ToolCall, ToolDefinition};

/// One scripted provider reaction
#[derive(Clone, Debug)]
pub enum Step {
    /// Assistant message, with optional tool calls
    Reply(Message),
    /// Error answered by the backend
    Error(String),
    /// Raised fault
    Raise(String),
}

impl Step {
    pub fn answer(content: impl Into<String>) -> Self {
        Self::Reply(Message::assistant(content))
    }

    pub fn tools(calls: Vec<ToolCall>) -> Self {
        Self::Reply(Message::assistant("").with_tool_calls(calls))
    }
}

#[derive(Default)]
struct Recorded {
    requests: Vec<Vec<Message>>,
    tool_counts: Vec<usize>,
    instants: Vec<Instant>,
}

/// Provider that replays [`Step`]s in order
pub struct ScriptedProvider {
    name: String,
    supports_tools: bool,
    steps: Mutex<VecDeque<Step>>,
    recorded: Mutex<Recorded>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            name: "scripted".into(),
            supports_tools: true,
            steps: Mutex::new(steps.into()),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn without_tools(steps: Vec<Step>) -> Self {
        Self {
            supports_tools: false,
            ..Self::new(steps)
        }
    }

    /// Number of `send` calls so far
    pub fn calls(&self) -> usize {
        self.recorded().requests.len()
    }

    /// Messages passed to each `send` call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.recorded().requests.clone()
    }

    /// Number of tool definitions passed to each `send` call
    pub fn tool_counts(&self) -> Vec<usize> {
        self.recorded().tool_counts.clone()
    }

    /// Clock reading at each `send` call
    pub fn call_instants(&self) -> Vec<Instant> {
        self.recorded().instants.clone()
    }

    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_tools(&self) -> bool {
        self.supports_tools
    }

    async fn send(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<ProviderResponse> {
        {
            let mut recorded = self.recorded();
            recorded.requests.push(messages.to_vec());
            recorded.tool_counts.push(tools.len());
            recorded.instants.push(Instant::now());
        }

        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match step {
            Some(Step::Reply(message)) => {
                let finish_reason = if message.has_tool_calls() {
                    FinishReason::ToolCalls
                } else {
                    FinishReason::Stop
                };
                Ok(ProviderResponse::Completion(Completion {
                    message,
                    model: options.model.clone(),
                    finish_reason: Some(finish_reason),
                    usage: None,
                }))
            }
            Some(Step::Error(error)) => Ok(ProviderResponse::error(error)),
            Some(Step::Raise(error)) => Err(AgentError::ProviderUnavailable(error)),
            None => Ok(ProviderResponse::error("script exhausted")),
        }
    }
}
