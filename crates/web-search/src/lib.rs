//! # web-search
//!
//! Web search for the chat orchestrator: the `web_search` tool the model can
//! call mid-loop, the keyword heuristic that decides when to search eagerly,
//! and the formatting shared by both paths.
//!
//! ```text
//! user query ──▶ needs_search? ──yes──▶ SearchPrefetcher ──▶ InjectedSearch
//!                                                               │
//! model tool call ──▶ WebSearchTool ──▶ SearchClient ◀───────────┘
//!                                        ├─ TavilyClient (bearer)
//!                                        └─ RawHttpSearchClient (key in body)
//! ```

pub mod client;
pub mod error;
pub mod format;
pub mod model;
pub mod prefetch;
pub mod svckit;
pub mod trigger;

pub use client::{RawHttpSearchClient, SearchClient, StaticSearchClient, TavilyClient};
pub use error::{Result, SearchError};
pub use model::{SearchHit, SearchRequest, SearchResponse};
pub use prefetch::SearchPrefetcher;
pub use trigger::needs_search;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::WebSearchTool;
}
