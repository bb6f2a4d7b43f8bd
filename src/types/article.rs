//! Article Data Model
//!
//! Records produced by the generation pipeline and the inputs it consumes.
//! Field names serialize in camelCase to match the external article store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Result, ValidationError};

// =============================================================================
// Request
// =============================================================================

/// One generation request for one topic
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    /// Articles the new one must not duplicate
    pub existing_articles: Vec<ArticleRef>,
    pub min_word_count: usize,
    pub max_word_count: usize,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, min_word_count: usize, max_word_count: usize) -> Self {
        Self {
            topic: topic.into(),
            existing_articles: Vec::new(),
            min_word_count,
            max_word_count,
        }
    }

    pub fn with_existing(mut self, existing: Vec<ArticleRef>) -> Self {
        self.existing_articles = existing;
        self
    }

    /// Enforce `0 < min_word_count <= max_word_count` and a non-blank topic
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::new("topic must not be empty")
                .with_field("topic")
                .into());
        }
        if self.min_word_count == 0 {
            return Err(ValidationError::new("must be positive")
                .with_field("min_word_count")
                .into());
        }
        if self.min_word_count > self.max_word_count {
            return Err(ValidationError::new(format!(
                "min_word_count ({}) exceeds max_word_count ({})",
                self.min_word_count, self.max_word_count
            ))
            .with_field("max_word_count")
            .into());
        }
        Ok(())
    }

    pub fn word_band(&self) -> WordBand {
        WordBand {
            min: self.min_word_count,
            max: self.max_word_count,
        }
    }
}

/// Requested article length in words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBand {
    pub min: usize,
    pub max: usize,
}

impl WordBand {
    /// Whether `count` falls inside the band widened by `tolerance` (fraction of each bound)
    pub fn contains_with_tolerance(&self, count: usize, tolerance: f32) -> bool {
        let low = (self.min as f32 * (1.0 - tolerance)).floor() as usize;
        let high = (self.max as f32 * (1.0 + tolerance)).ceil() as usize;
        (low..=high).contains(&count)
    }
}

/// Minimal view of an article used by duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl From<&Article> for ArticleRef {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
        }
    }
}

// =============================================================================
// Produced Article
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

/// Attributable author of a generated article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLevel {
    Main,
    Intermediate,
    Specific,
    Administrative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<CategoryLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleImage {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Numbered citation rendered in the references block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: u32,
    pub url: String,
    pub title: String,
}

/// Label → value fact table
pub type Infobox = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleVersion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub changes: String,
    pub created_at: DateTime<Utc>,
}

/// Article record produced by a successful generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub author: Author,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub images: Vec<ArticleImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infobox: Option<Infobox>,
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,
    #[serde(rename = "categoriesLockedByAI")]
    pub categories_locked_by_ai: bool,
    pub versions: Vec<ArticleVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Gate Inputs / Outputs
// =============================================================================

/// Reference material handed to the fact-verification gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Source {
    /// Build a web source from a bare citation URL
    pub fn from_citation_url(url: &str) -> Self {
        let publisher = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_default();
        Self {
            url: url.to_string(),
            title: url.to_string(),
            publisher,
            source_type: "web".to_string(),
            year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarArticle {
    pub id: String,
    pub title: String,
    /// 0-100
    pub similarity: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    #[serde(default)]
    pub similar_articles: Vec<SimilarArticle>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl DuplicateCheckResult {
    pub fn unique() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    /// 0-100, diagnostic only
    pub score: u8,
    pub analysis: String,
}

impl VerificationResult {
    pub fn unverified(analysis: impl Into<String>) -> Self {
        Self {
            verified: false,
            score: 0,
            analysis: analysis.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub appropriate: bool,
    pub flagged_categories: Vec<String>,
    pub reason: Option<String>,
}

impl ModerationResult {
    pub fn clean() -> Self {
        Self {
            appropriate: true,
            flagged_categories: Vec::new(),
            reason: None,
        }
    }

    /// Build a decision from flagged category names; the joined names become the reason
    pub fn from_flags(flagged: Vec<String>) -> Self {
        if flagged.is_empty() {
            return Self::clean();
        }
        Self {
            appropriate: false,
            reason: Some(flagged.join(", ")),
            flagged_categories: flagged,
        }
    }

    /// Fail-closed decision when the classifier could not be consulted
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            appropriate: false,
            flagged_categories: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

/// Category name before an identifier is assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryName {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<CategoryLevel>,
}

/// Flattened category/tag names produced by categorization
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Categorization {
    pub categories: Vec<CategoryName>,
    pub tags: Vec<String>,
}

impl Categorization {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tags.is_empty()
    }
}

/// Proposed revision of an existing article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSuggestion {
    pub content: String,
    pub summary: String,
    #[serde(default)]
    pub references: Vec<Citation>,
}
