//! Result Formatting
//!
//! Renders search hits for the two consumers: tool observations fed back into
//! the agent loop, and the eager context injected before the first call.

use crate::model::SearchHit;

/// Excerpt length in tool observations
pub const OBSERVATION_EXCERPT_CHARS: usize = 500;

/// Excerpt length in injected context
pub const CONTEXT_EXCERPT_CHARS: usize = 300;

/// Trailing instruction on every search observation
pub const OBSERVATION_INSTRUCTION: &str = "Use these fresh results to answer accurately.";

/// Observation content for a `web_search` call
pub fn format_observation(query: &str, hits: &[SearchHit], max_results: usize) -> String {
    let summary = if hits.is_empty() {
        "No results found.".to_string()
    } else {
        hits.iter()
            .take(max_results)
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "[{}] {}\nURL: {}\n{}...",
                    i + 1,
                    hit.title(),
                    hit.url(),
                    hit.excerpt(OBSERVATION_EXCERPT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!("Search results for '{query}':\n{summary}\n\n{OBSERVATION_INSTRUCTION}")
}

/// Result list for eager injection; `None` when there is nothing to inject
pub fn format_context(hits: &[SearchHit], max_results: usize) -> Option<String> {
    if hits.is_empty() {
        return None;
    }

    let formatted = hits
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[{}] {}\nURL: {}\n{}",
                i + 1,
                hit.title(),
                hit.url(),
                hit.excerpt(CONTEXT_EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: Option<&str>, url: Option<&str>, content: &str) -> SearchHit {
        SearchHit {
            title: title.map(Into::into),
            url: url.map(Into::into),
            content: Some(content.into()),
            snippet: None,
        }
    }

    #[test]
    fn test_observation_layout() {
        let hits = vec![
            hit(Some("Tokyo weather"), Some("https://weather.example/tokyo"), "Sunny, 22C"),
            hit(None, None, "Rain later"),
        ];

        let text = format_observation("tokyo weather", &hits, 6);
        assert_eq!(
            text,
            "Search results for 'tokyo weather':\n\
             [1] Tokyo weather\nURL: https://weather.example/tokyo\nSunny, 22C...\n\n\
             [2] No title\nURL: No URL\nRain later...\n\n\
             Use these fresh results to answer accurately."
        );
    }

    #[test]
    fn test_observation_truncates_and_limits() {
        let long = "x".repeat(800);
        let hits: Vec<_> = (0..5).map(|_| hit(Some("t"), Some("u"), &long)).collect();

        let text = format_observation("q", &hits, 2);
        assert!(text.contains("[2] t"));
        assert!(!text.contains("[3]"));
        assert!(text.contains(&format!("{}...", "x".repeat(500))));
        assert!(!text.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_empty_observation_still_well_formed() {
        let text = format_observation("nothing", &[], 6);
        assert!(text.starts_with("Search results for 'nothing':\nNo results found."));
        assert!(text.ends_with(OBSERVATION_INSTRUCTION));
    }

    #[test]
    fn test_context_uses_shorter_excerpt() {
        let hits = vec![hit(Some("t"), Some("u"), &"y".repeat(400))];
        let context = format_context(&hits, 6).unwrap();
        assert_eq!(context, format!("[1] t\nURL: u\n{}", "y".repeat(300)));
    }

    #[test]
    fn test_context_none_when_empty() {
        assert!(format_context(&[], 6).is_none());
    }
}
