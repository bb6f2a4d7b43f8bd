//! Category and tag assignment.
//!
//! The completion variant asks for a four-level hierarchy (main,
//! intermediate, specific, administrative) and flattens it in that order;
//! the retrieval variant asks for a flat list. Both cap categories and tags
//! at ten and degrade to an empty result on failure.

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::ai::provider::{SharedProvider, generate_json};
use crate::article::prompts;
use crate::constants::article::{MAX_CATEGORIES, MAX_TAGS};
use crate::types::{Categorization, CategoryLevel, CategoryName, json_string_array};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScheme {
    Hierarchical,
    Flat,
}

const LEVELS: [(&str, CategoryLevel); 4] = [
    ("main", CategoryLevel::Main),
    ("intermediate", CategoryLevel::Intermediate),
    ("specific", CategoryLevel::Specific),
    ("administrative", CategoryLevel::Administrative),
];

pub struct Categorizer {
    provider: SharedProvider,
    scheme: CategoryScheme,
}

impl Categorizer {
    pub fn new(provider: SharedProvider, scheme: CategoryScheme) -> Self {
        Self { provider, scheme }
    }

    pub async fn categorize(&self, title: &str, content: &str) -> Categorization {
        let request = match self.scheme {
            CategoryScheme::Hierarchical => prompts::categorize_hierarchical(title, content),
            CategoryScheme::Flat => prompts::categorize_flat(title, content),
        };

        match generate_json(self.provider.as_ref(), request).await {
            Ok((value, _)) => {
                let result = self.parse(&value);
                debug!(
                    title,
                    categories = result.categories.len(),
                    tags = result.tags.len(),
                    "Categorized article"
                );
                result
            }
            Err(e) => {
                warn!(title, "Categorization failed, continuing uncategorized: {}", e);
                Categorization::default()
            }
        }
    }

    fn parse(&self, value: &Value) -> Categorization {
        let named: Vec<(String, Option<CategoryLevel>)> = match self.scheme {
            CategoryScheme::Hierarchical => LEVELS
                .iter()
                .flat_map(|(key, level)| {
                    json_string_array(value, key)
                        .into_iter()
                        .map(move |name| (name, Some(*level)))
                })
                .collect(),
            CategoryScheme::Flat => json_string_array(value, "categories")
                .into_iter()
                .map(|name| (name, None))
                .collect(),
        };

        // the first (highest) level wins when a name repeats
        let mut seen = HashSet::new();
        let categories = named
            .into_iter()
            .filter(|(name, _)| seen.insert(name.to_lowercase()))
            .take(MAX_CATEGORIES)
            .map(|(name, level)| CategoryName { name, level })
            .collect();

        let mut seen_tags = HashSet::new();
        let tags = json_string_array(value, "tags")
            .into_iter()
            .filter(|tag| seen_tags.insert(tag.to_lowercase()))
            .take(MAX_TAGS)
            .collect();

        Categorization { categories, tags }
    }
}
