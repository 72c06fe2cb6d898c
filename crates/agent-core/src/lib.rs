//! # agent-core
//!
//! Core agent logic: provider-agnostic LLM abstraction, tool execution, the
//! reason/act/observe loop and backend fallback.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   FallbackOrchestrator                        │
//! │  primary (tools) ──────────────▶ secondary (plain chat)       │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐   │
//! │  │  Reasoning  │  │    Tools    │  │   LlmProvider       │   │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)        │   │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of any particular
//! chat-completions backend.

pub mod error;
pub mod fallback;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod testing;
pub mod tool;

pub use error::{AgentError, OrchestratorError, Result};
pub use fallback::{Backend, ChatCompletion, ChatTurn, FallbackOrchestrator, InjectedSearch};
pub use message::{Conversation, Message, Role};
pub use provider::{GenerationOptions, LlmProvider, ProviderResponse};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::{AgentOutcome, TerminalStatus};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
