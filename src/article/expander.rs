//! Topic expansion: one broad topic into specific article subjects.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::ai::provider::{SharedProvider, generate_json};
use crate::article::prompts;
use crate::types::json_string_array;

pub struct TopicExpander {
    provider: SharedProvider,
}

impl TopicExpander {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    /// At most `desired` distinct subtopics. Failures yield an empty list.
    pub async fn expand(&self, topic: &str, desired: usize) -> Vec<String> {
        if desired == 0 {
            return Vec::new();
        }

        let request = prompts::topic_expansion(topic, desired);
        let value = match generate_json(self.provider.as_ref(), request).await {
            Ok((value, _)) => value,
            Err(e) => {
                warn!(topic, "Topic expansion failed: {}", e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let subtopics: Vec<String> = json_string_array(&value, "subtopics")
            .into_iter()
            .filter(|s| seen.insert(s.to_lowercase()))
            .take(desired)
            .collect();

        debug!(topic, desired, returned = subtopics.len(), "Expanded topic");
        subtopics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_expansion_truncates_to_desired() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::TopicExpansion,
            r#"{"subtopics": ["A", "B", "C", "D", "E", "F", "G", "H"]}"#,
        ));
        let subtopics = TopicExpander::new(provider).expand("Letters", 5).await;
        assert_eq!(subtopics, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_expansion_drops_case_insensitive_repeats() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::TopicExpansion,
            r#"{"subtopics": ["Coffee roasting", " coffee roasting ", "", "Espresso", 7]}"#,
        ));
        let subtopics = TopicExpander::new(provider).expand("Coffee", 10).await;
        assert_eq!(subtopics, vec!["Coffee roasting", "Espresso"]);
    }

    #[tokio::test]
    async fn test_zero_desired_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let subtopics = TopicExpander::new(provider.clone()).expand("Coffee", 0).await;
        assert!(subtopics.is_empty());
        assert!(!provider.called(CallKind::TopicExpansion));
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_empty() {
        let provider =
            Arc::new(ScriptedProvider::new().respond(CallKind::TopicExpansion, "no idea"));
        assert!(TopicExpander::new(provider).expand("Coffee", 5).await.is_empty());
    }
}
