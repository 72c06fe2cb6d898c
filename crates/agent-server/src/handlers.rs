//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use agent_core::{ChatCompletion, ChatTurn, GenerationOptions, Message, OrchestratorError, Role};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub apis: ApiStatus,
}

#[derive(Serialize)]
pub struct ApiStatus {
    pub primary: bool,
    pub secondary: bool,
    pub search: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// One inbound turn; fields stay untyped so foreign shapes are dropped, not rejected
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub role: Value,
    #[serde(default)]
    pub content: Value,
}

impl InboundMessage {
    fn to_message(&self) -> Option<Message> {
        let content = self.content.as_str()?;
        match self.role.as_str()? {
            "user" => Some(Message::user(content)),
            "assistant" => Some(Message::assistant(content)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl ChatRequest {
    /// Inbound turns as messages; only user and assistant turns with text content survive
    fn history(&self) -> Vec<Message> {
        let mut history: Vec<Message> = self
            .messages
            .iter()
            .filter_map(InboundMessage::to_message)
            .collect();

        if let Some(message) = self.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            history.push(Message::user(message));
        }

        history
    }

    /// Overrides that pass validation; anything else is ignored
    fn overrides(&self) -> (Option<f32>, Option<u32>) {
        let temperature = self.temperature.filter(|t| {
            GenerationOptions {
                temperature: *t,
                ..GenerationOptions::default()
            }
            .validate()
            .is_ok()
        });
        let max_tokens = self.max_tokens.filter(|n| *n > 0);

        if temperature != self.temperature || max_tokens != self.max_tokens {
            tracing::warn!(
                temperature = ?self.temperature,
                max_tokens = ?self.max_tokens,
                "Ignoring out-of-range generation overrides"
            );
        }

        (temperature, max_tokens)
    }
}

fn orchestrator_error(err: &OrchestratorError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().into()),
            detail: Some(err.detail()),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        apis: ApiStatus {
            primary: state.orchestrator.has_primary(),
            secondary: state.orchestrator.has_secondary(),
            search: state.prefetcher.is_some(),
        },
    })
}

/// Main chat endpoint
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatCompletion>, ApiError> {
    let history = payload.history();

    if history.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No message provided".into(),
                code: None,
                detail: None,
            }),
        ));
    }

    // Eager search keys off the latest user turn, if there is one.
    let query = history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str());

    let search = match (&state.prefetcher, query) {
        (Some(prefetcher), Some(query)) => prefetcher.prefetch_if_needed(query).await,
        _ => None,
    };

    let (temperature, max_tokens) = payload.overrides();
    let turn = ChatTurn {
        history,
        search,
        temperature,
        max_tokens,
    };

    let completion = state
        .orchestrator
        .handle(turn)
        .await
        .map_err(|e| orchestrator_error(&e))?;

    Ok(Json(completion))
}
