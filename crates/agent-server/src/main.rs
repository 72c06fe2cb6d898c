//! Chat orchestrator HTTP server
//!
//! Axum-based server exposing the chat endpoint in front of the fallback
//! orchestrator, with eager web search for time-sensitive questions.

mod config;
mod handlers;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::handlers::{chat_handler, health_check};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    match (&config.primary, &config.secondary) {
        (None, None) => {
            tracing::warn!("⚠ No chat backend configured - every chat request will return 503");
            tracing::warn!("  Set SILICONFLOW_API_KEY and/or GROQ_API_KEY in .env");
        }
        (primary, secondary) => {
            if let Some(primary) = primary {
                tracing::info!(model = %primary.generation.model, endpoints = primary.endpoints.len(), "✓ Primary backend configured");
            }
            if let Some(secondary) = secondary {
                tracing::info!(model = %secondary.generation.model, "✓ Secondary backend configured");
            }
        }
    }

    match &config.search {
        Some(search) => tracing::info!(raw_http = search.raw_http, "✓ Web search configured"),
        None => tracing::warn!("⚠ TAVILY_API_KEY not set - web search disabled"),
    }

    let state = AppState::from_config(&config)?;
    let app = app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("🚀 chat orchestrator running on http://{}", config.bind_addr);
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  POST /api/chat  - Send message");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Router with CORS and request tracing
fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
