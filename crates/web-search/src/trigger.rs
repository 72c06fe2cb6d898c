//! Search Trigger Heuristic
//!
//! Keyword pre-filter deciding whether a query likely needs real-time
//! information, independent of the model's own tool-calling decision.

/// Phrases that suggest the answer depends on current information
pub const SEARCH_TRIGGERS: &[&str] = &[
    // temporal
    "latest",
    "current",
    "today",
    "now",
    "recent",
    // topical
    "weather",
    "temperature",
    "forecast",
    "news",
    "happening",
    "trending",
    "trends",
    "price",
    "cost",
    "how much",
    "who won",
    "score",
    "game",
    "match",
    "population",
    "population of",
    "best",
    "top",
    "recommend",
    "reviews",
    // verification
    "is it true",
    "is this true",
    "is x still",
    // interrogative
    "how do i",
    "how to",
    "what's the",
    "whats the",
    "what is the",
    "compare",
    "comparison",
];

/// Case-insensitive substring match against [`SEARCH_TRIGGERS`]
pub fn needs_search(query: &str) -> bool {
    let lowered = query.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|trigger| lowered.contains(trigger))
}
