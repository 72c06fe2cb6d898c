//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Tool problems never reach this type; they become observation messages.
/// `ProviderUnavailable` (every endpoint of a backend failed) aborts a loop
/// run and sends the turn to the next backend.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool arguments could not be decoded
    #[error("Invalid tool arguments: {0}")]
    ToolArguments(String),

    /// Conversation violates the loop preconditions
    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    /// Generation options out of range
    #[error("Invalid generation options: {0}")]
    InvalidOptions(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure surfaced by the fallback orchestrator
///
/// This is the only error that crosses the system boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// No backend credential is configured
    #[error("Chat API not configured")]
    NotConfigured,

    /// Every configured backend failed
    #[error("All chat services failed")]
    Exhausted {
        primary: Option<String>,
        secondary: Option<String>,
    },
}

impl OrchestratorError {
    /// HTTP status code for this failure
    pub const fn status_code(&self) -> u16 {
        503
    }

    /// Stable machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::Exhausted { .. } => "ALL_BACKENDS_FAILED",
        }
    }

    /// Human-readable detail naming each backend's failure reason
    pub fn detail(&self) -> String {
        match self {
            Self::NotConfigured => {
                "Add SILICONFLOW_API_KEY or GROQ_API_KEY to the environment".into()
            }
            Self::Exhausted { primary, secondary } => format!(
                "primary: {}; secondary: {}",
                primary.as_deref().unwrap_or("not configured"),
                secondary.as_deref().unwrap_or("not configured"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_detail_names_both_backends() {
        let err = OrchestratorError::Exhausted {
            primary: Some("connection refused".into()),
            secondary: Some("HTTP 500".into()),
        };
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.detail(), "primary: connection refused; secondary: HTTP 500");
    }

    #[test]
    fn test_provider_unavailable_display() {
        let err = AgentError::ProviderUnavailable("HTTP 502 from https://a.example".into());
        assert_eq!(err.to_string(), "Provider unavailable: HTTP 502 from https://a.example");
    }
}
