//! Source discovery for the completion variant.
//!
//! The retrieval variant gets its sources as citation URLs on the content
//! response and never calls this.

use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::provider::{SharedProvider, generate_json};
use crate::article::prompts;
use crate::types::{Source, json_string, json_string_or};

pub struct SourceFinder {
    provider: SharedProvider,
}

impl SourceFinder {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    /// Reference list for `topic`; empty when the provider fails
    pub async fn find(&self, topic: &str) -> Vec<Source> {
        match generate_json(self.provider.as_ref(), prompts::source_discovery(topic)).await {
            Ok((value, _)) => {
                let sources = parse_sources(&value);
                debug!(topic, count = sources.len(), "Discovered sources");
                sources
            }
            Err(e) => {
                warn!(topic, "Source discovery failed, continuing without sources: {}", e);
                Vec::new()
            }
        }
    }
}

fn parse_sources(value: &Value) -> Vec<Source> {
    let Some(items) = value.get("sources").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let url = json_string(item, "url")?;
            Some(Source {
                title: json_string(item, "title").unwrap_or_else(|| url.clone()),
                publisher: json_string_or(item, "publisher", ""),
                source_type: json_string_or(item, "type", "web"),
                year: parse_year(item.get("year")),
                url,
            })
        })
        .collect()
}

fn parse_year(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::types::ErrorCategory;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_sources_skips_entries_without_url() {
        let value = json!({"sources": [
            {"url": "https://a.org/coffee", "title": "Coffee", "publisher": "A", "type": "book", "year": 2001},
            {"title": "No link"},
            {"url": "https://b.org", "year": "1999"}
        ]});

        let sources = parse_sources(&value);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_type, "book");
        assert_eq!(sources[0].year, Some(2001));
        assert_eq!(sources[1].title, "https://b.org");
        assert_eq!(sources[1].source_type, "web");
        assert_eq!(sources[1].year, Some(1999));
    }

    #[tokio::test]
    async fn test_failure_yields_no_sources() {
        let provider = Arc::new(
            ScriptedProvider::new().fail(CallKind::SourceDiscovery, ErrorCategory::RateLimit),
        );
        assert!(SourceFinder::new(provider).find("Coffee").await.is_empty());
    }
}
