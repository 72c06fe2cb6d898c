//! Service Kit - Agent Tools
//!
//! Tools that implement `agent_core::Tool` on top of the search clients.

mod web_search;

pub use web_search::WebSearchTool;
