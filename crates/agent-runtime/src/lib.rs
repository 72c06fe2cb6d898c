//! # agent-runtime
//!
//! Runtime providers for the chat orchestrator.
//!
//! ## Providers
//!
//! - **OpenAI-compatible**: any `/chat/completions` backend, with an ordered
//!   list of equivalent endpoints tried until one answers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{BackendConfig, OpenAiCompatProvider};
//!
//! let config = BackendConfig::new("primary", api_key, endpoints).with_tools(true);
//! let provider = OpenAiCompatProvider::from_config(config)?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod openai;

pub use openai::{BackendConfig, OpenAiCompatProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
