//! Duplicate Detection Gate
//!
//! Two policies, one per generator variant:
//! - `SimilarityDuplicateDetector`: provider-scored title (40%) and content
//!   (60%) similarity against every existing article
//! - `TitleMatchDuplicateDetector`: exact title match after trimming and
//!   lowercasing, no provider call
//!
//! Both fail open: a provider or parse failure means "not a duplicate".

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::provider::{SharedProvider, generate_json};
use crate::article::prompts;
use crate::constants::gates;
use crate::types::{
    ArticleRef, DuplicateCheckResult, SimilarArticle, json_bool, json_percent, json_string,
};

#[async_trait]
pub trait DuplicateDetector: Send + Sync {
    /// `content` is empty for the title-only early check
    async fn check(&self, title: &str, content: &str, existing: &[ArticleRef])
    -> DuplicateCheckResult;
}

// =============================================================================
// Provider-scored similarity
// =============================================================================

pub struct SimilarityDuplicateDetector {
    provider: SharedProvider,
}

impl SimilarityDuplicateDetector {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    fn parse(value: &Value, existing: &[ArticleRef]) -> DuplicateCheckResult {
        let mut similar_articles: Vec<SimilarArticle> = value
            .get("similarArticles")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let id = json_string(item, "id").unwrap_or_default();
                        let title = json_string(item, "title")
                            .or_else(|| {
                                existing
                                    .iter()
                                    .find(|a| a.id == id)
                                    .map(|a| a.title.clone())
                            })
                            .unwrap_or_default();
                        if id.is_empty() && title.is_empty() {
                            return None;
                        }
                        Some(SimilarArticle {
                            id,
                            title,
                            similarity: json_percent(item, "similarity"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        similar_articles.sort_by(|a, b| b.similarity.cmp(&a.similarity));
        similar_articles.truncate(gates::MAX_SIMILAR_ARTICLES);

        DuplicateCheckResult {
            is_duplicate: json_bool(value, "isDuplicate", false),
            similar_articles,
            reason: json_string(value, "reason"),
        }
    }

    /// One provider call over at most `MAX_DUPLICATE_CANDIDATES` articles
    async fn check_chunk(
        &self,
        title: &str,
        content: &str,
        chunk: &[ArticleRef],
    ) -> DuplicateCheckResult {
        let request = prompts::duplicate_check(title, content, chunk);
        match generate_json(self.provider.as_ref(), request).await {
            Ok((value, _)) => Self::parse(&value, chunk),
            Err(e) => {
                warn!(title, "Duplicate check failed, assuming unique: {}", e);
                DuplicateCheckResult::unique()
            }
        }
    }
}

#[async_trait]
impl DuplicateDetector for SimilarityDuplicateDetector {
    async fn check(
        &self,
        title: &str,
        content: &str,
        existing: &[ArticleRef],
    ) -> DuplicateCheckResult {
        if existing.is_empty() {
            return DuplicateCheckResult::unique();
        }

        // newest entries sit at the end (batch output is appended), so they go first
        let mut similar_articles: Vec<SimilarArticle> = Vec::new();
        let mut verdict = DuplicateCheckResult::unique();
        for chunk in existing.rchunks(gates::MAX_DUPLICATE_CANDIDATES) {
            let result = self.check_chunk(title, content, chunk).await;
            similar_articles.extend(result.similar_articles);
            if result.is_duplicate {
                verdict.is_duplicate = true;
                verdict.reason = result.reason;
                break;
            }
        }

        similar_articles.sort_by(|a, b| b.similarity.cmp(&a.similarity));
        similar_articles.truncate(gates::MAX_SIMILAR_ARTICLES);
        verdict.similar_articles = similar_articles;

        debug!(
            title,
            is_duplicate = verdict.is_duplicate,
            similar = verdict.similar_articles.len(),
            "Duplicate check complete"
        );
        verdict
    }
}

// =============================================================================
// Exact title match
// =============================================================================

#[derive(Debug, Default)]
pub struct TitleMatchDuplicateDetector;

impl TitleMatchDuplicateDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DuplicateDetector for TitleMatchDuplicateDetector {
    async fn check(
        &self,
        title: &str,
        _content: &str,
        existing: &[ArticleRef],
    ) -> DuplicateCheckResult {
        let wanted = title.trim().to_lowercase();
        let matches: Vec<SimilarArticle> = existing
            .iter()
            .filter(|a| a.title.trim().to_lowercase() == wanted)
            .take(gates::MAX_SIMILAR_ARTICLES)
            .map(|a| SimilarArticle {
                id: a.id.clone(),
                title: a.title.clone(),
                similarity: 100,
            })
            .collect();

        if matches.is_empty() {
            return DuplicateCheckResult::unique();
        }
        DuplicateCheckResult {
            is_duplicate: true,
            reason: Some(format!("An article titled '{}' already exists", matches[0].title)),
            similar_articles: matches,
        }
    }
}
