//! Session Management
//!
//! An [`AgentSession`] is the transient state of one loop invocation: the
//! growing conversation, the iteration counter and the terminal state. It is
//! created at loop entry and consumed at loop exit; nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Conversation, Message};

/// Prefix of the answer synthesized when the iteration budget runs out
pub const MAX_ITERATIONS_PREFIX: &str = "Max iterations reached. Here's what I found:";

/// Appended when the answer suggests real-time retrieval went wrong
pub const RETRIEVAL_DISCLAIMER: &str = "(Note: real-time retrieval had issues, so this answer may rely partly on background knowledge.)";

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loop state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Running, with the number of iterations started so far
    Running(usize),
    Done(String),
    MaxIterationsReached(String),
    ProviderError(String),
}

impl LoopState {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running(_))
    }
}

/// Which terminal state produced an answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Done,
    MaxIterationsReached,
    ProviderError,
}

/// Result of a finished loop run
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    /// Final answer text, disclaimer included
    pub answer: String,

    pub status: TerminalStatus,

    /// Provider calls made
    pub iterations: usize,

    /// Full transcript, usable to resume the dialogue
    pub conversation: Conversation,
}

/// State of one agent loop invocation
#[derive(Debug)]
pub struct AgentSession {
    id: SessionId,
    conversation: Conversation,
    iterations: usize,
    max_iterations: usize,
    state: LoopState,
    started_at: DateTime<Utc>,
}

impl AgentSession {
    pub fn new(conversation: Conversation, max_iterations: usize) -> Self {
        Self {
            id: SessionId::new(),
            conversation,
            iterations: 0,
            max_iterations,
            state: LoopState::Running(0),
            started_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Iterations started so far
    pub const fn iteration(&self) -> usize {
        self.iterations
    }

    /// Start the next iteration.
    ///
    /// Returns `false` and moves to `MaxIterationsReached` when the budget is
    /// spent; the partial answer is the content of the last message.
    pub fn begin_iteration(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if self.iterations >= self.max_iterations {
            let last = self
                .conversation
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            self.state =
                LoopState::MaxIterationsReached(format!("{MAX_ITERATIONS_PREFIX}\n\n{last}"));
            return false;
        }
        self.iterations += 1;
        self.state = LoopState::Running(self.iterations);
        true
    }

    /// Append a message to the conversation
    pub fn record(&mut self, message: Message) {
        self.conversation.push(message);
    }

    /// Move to a terminal state
    pub fn finish(&mut self, state: LoopState) {
        debug_assert!(state.is_terminal());
        self.state = state;
    }

    /// Consume the session, producing the answer.
    ///
    /// Whatever the terminal state, an answer mentioning "error" or "failed"
    /// gets the retrieval disclaimer appended.
    pub fn into_outcome(self) -> AgentOutcome {
        let (answer, status) = match self.state {
            LoopState::Done(a) => (a, TerminalStatus::Done),
            LoopState::MaxIterationsReached(a) => (a, TerminalStatus::MaxIterationsReached),
            LoopState::ProviderError(a) => (a, TerminalStatus::ProviderError),
            LoopState::Running(_) => (String::new(), TerminalStatus::Done),
        };

        tracing::debug!(
            session = %self.id,
            ?status,
            iterations = self.iterations,
            elapsed_ms = (Utc::now() - self.started_at).num_milliseconds(),
            "Agent session finished"
        );

        AgentOutcome {
            answer: with_disclaimer(answer),
            status,
            iterations: self.iterations,
            conversation: self.conversation,
        }
    }
}

/// Append [`RETRIEVAL_DISCLAIMER`] when the text mentions an error or failure
pub fn with_disclaimer(answer: String) -> String {
    let lower = answer.to_lowercase();
    if lower.contains("error") || lower.contains("failed") {
        format!("{answer}\n\n{RETRIEVAL_DISCLAIMER}")
    } else {
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max: usize) -> AgentSession {
        let conv = Conversation::from_history("sys", vec![Message::user("question")]);
        AgentSession::new(conv, max)
    }

    #[test]
    fn test_session_creation() {
        let session = session(5);
        assert_eq!(session.state(), &LoopState::Running(0));
        assert_eq!(session.messages().len(), 2);
        assert!(!session.id().as_str().is_empty());
    }

    #[test]
    fn test_budget_exhaustion_uses_last_message() {
        let mut session = session(1);
        assert!(session.begin_iteration());
        assert_eq!(session.iteration(), 1);
        session.record(Message::assistant("thinking"));
        assert!(!session.begin_iteration());
        assert_eq!(
            session.state(),
            &LoopState::MaxIterationsReached(format!("{MAX_ITERATIONS_PREFIX}\n\nthinking"))
        );
    }

    #[test]
    fn test_zero_budget_still_answers() {
        let mut session = session(0);
        assert!(!session.begin_iteration());
        let outcome = session.into_outcome();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.status, TerminalStatus::MaxIterationsReached);
        assert!(outcome.answer.starts_with(MAX_ITERATIONS_PREFIX));
        assert!(outcome.answer.ends_with("question"));
    }

    #[test]
    fn test_disclaimer_is_case_insensitive() {
        assert!(with_disclaimer("Search FAILED".into()).ends_with(RETRIEVAL_DISCLAIMER));
        assert!(with_disclaimer("An Error occurred".into()).ends_with(RETRIEVAL_DISCLAIMER));
        assert_eq!(with_disclaimer("All good".into()), "All good");
    }
}
