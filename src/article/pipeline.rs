//! Single-Article Pipeline
//!
//! Runs one topic through a fixed sequence of stages:
//!
//! ```text
//! AuthCheck → EarlyDuplicate → Sources → Images → Content
//!     → FinalDuplicate → Facts → Moderation → Categorize → Assemble
//! ```
//!
//! Only AuthCheck is fatal. Every gate after it either passes or ends the
//! attempt with `GenerationOutcome::Aborted`; no partial article escapes.
//! Stages run one after another with no provider calls in parallel.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::provider::{GeneratorVariant, SharedProvider, generate_json};
use crate::article::categorize::{CategoryScheme, Categorizer};
use crate::article::gates::{
    DuplicateDetector, FactVerifier, SharedModerator, SimilarityDuplicateDetector,
    TitleMatchDuplicateDetector,
};
use crate::article::normalizer::{citations_from_urls, normalize};
use crate::article::prompts;
use crate::article::sources::SourceFinder;
use crate::constants::article::GENERATION_CHANGE_NOTE;
use crate::images::SharedImageSearch;
use crate::session::SharedSession;
use crate::types::{
    Article, ArticleImage, ArticleStatus, ArticleVersion, Author, Categorization, Category,
    Citation, GenerationRequest, Infobox, Result, Source, Tag, json_string, word_count,
};

// =============================================================================
// Outcome Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AuthCheck,
    EarlyDuplicateCheck,
    SourceDiscovery,
    ImageDiscovery,
    ContentGeneration,
    FinalDuplicateCheck,
    FactVerification,
    Moderation,
    Categorization,
    Assembly,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AuthCheck => "auth check",
            Self::EarlyDuplicateCheck => "early duplicate check",
            Self::SourceDiscovery => "source discovery",
            Self::ImageDiscovery => "image discovery",
            Self::ContentGeneration => "content generation",
            Self::FinalDuplicateCheck => "final duplicate check",
            Self::FactVerification => "fact verification",
            Self::Moderation => "moderation",
            Self::Categorization => "categorization",
            Self::Assembly => "assembly",
        })
    }
}

/// Why a gate ended the attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    Duplicate { reason: Option<String> },
    NoSources,
    NoContent(String),
    Unverified { score: u8, analysis: String },
    Flagged { reason: Option<String> },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate { reason } => {
                write!(f, "duplicate of an existing article")?;
                if let Some(reason) = reason {
                    write!(f, ": {}", reason)?;
                }
                Ok(())
            }
            Self::NoSources => f.write_str("no sources found"),
            Self::NoContent(detail) => write!(f, "no usable content: {}", detail),
            Self::Unverified { score, analysis } => {
                write!(f, "facts not verified (score {}): {}", score, analysis)
            }
            Self::Flagged { reason } => write!(
                f,
                "flagged by moderation: {}",
                reason.as_deref().unwrap_or("unspecified")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Generated(Box<Article>),
    Aborted { stage: Stage, reason: AbortReason },
}

impl GenerationOutcome {
    fn aborted(stage: Stage, reason: AbortReason) -> Self {
        info!(%stage, %reason, "Generation aborted");
        Self::Aborted { stage, reason }
    }

    pub fn into_article(self) -> Option<Article> {
        match self {
            Self::Generated(article) => Some(*article),
            Self::Aborted { .. } => None,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

/// Generated text before gating
#[derive(Debug, Clone)]
struct Draft {
    title: String,
    content: String,
    infobox: Option<Infobox>,
    citations: Vec<Citation>,
    /// What fact verification checks against
    sources: Vec<Source>,
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct ArticlePipeline {
    provider: SharedProvider,
    variant: GeneratorVariant,
    session: SharedSession,
    duplicates: Arc<dyn DuplicateDetector>,
    sources: Option<SourceFinder>,
    images: Option<SharedImageSearch>,
    images_per_article: usize,
    facts: FactVerifier,
    moderator: SharedModerator,
    categorizer: Categorizer,
    word_tolerance: f32,
}

impl ArticlePipeline {
    /// Stage wiring for `variant`: the completion variant discovers sources
    /// and scores similarity; the retrieval variant relies on citations and
    /// exact title matches.
    pub fn new(
        provider: SharedProvider,
        variant: GeneratorVariant,
        session: SharedSession,
        moderator: SharedModerator,
    ) -> Self {
        let (duplicates, sources, scheme): (Arc<dyn DuplicateDetector>, _, _) = match variant {
            GeneratorVariant::Completion => (
                Arc::new(SimilarityDuplicateDetector::new(provider.clone())),
                Some(SourceFinder::new(provider.clone())),
                CategoryScheme::Hierarchical,
            ),
            GeneratorVariant::Retrieval => (
                Arc::new(TitleMatchDuplicateDetector::new()),
                None,
                CategoryScheme::Flat,
            ),
        };

        Self {
            facts: FactVerifier::new(provider.clone()),
            categorizer: Categorizer::new(provider.clone(), scheme),
            provider,
            variant,
            session,
            duplicates,
            sources,
            images: None,
            images_per_article: 0,
            moderator,
            word_tolerance: 0.25,
        }
    }

    pub fn with_images(mut self, search: Option<SharedImageSearch>, per_article: usize) -> Self {
        self.images = search;
        self.images_per_article = per_article;
        self
    }

    pub fn with_word_tolerance(mut self, tolerance: f32) -> Self {
        self.word_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_duplicate_detector(mut self, detector: Arc<dyn DuplicateDetector>) -> Self {
        self.duplicates = detector;
        self
    }

    pub fn variant(&self) -> GeneratorVariant {
        self.variant
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Current author or `NotAuthenticated`
    pub fn require_author(&self) -> Result<Author> {
        self.session.require_author()
    }

    /// Run every stage for one request. `Err` only for a missing author or
    /// an invalid request; gate failures come back as `Aborted`.
    #[instrument(skip(self, request), fields(topic = %request.topic, variant = ?self.variant))]
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let author = self.require_author()?;
        request.validate()?;

        let topic = request.topic.trim();
        let existing = &request.existing_articles;

        let early = self.duplicates.check(topic, "", existing).await;
        if early.is_duplicate {
            return Ok(GenerationOutcome::aborted(
                Stage::EarlyDuplicateCheck,
                AbortReason::Duplicate {
                    reason: early.reason,
                },
            ));
        }

        let sources = match &self.sources {
            Some(finder) => {
                let sources = finder.find(topic).await;
                if sources.is_empty() {
                    return Ok(GenerationOutcome::aborted(
                        Stage::SourceDiscovery,
                        AbortReason::NoSources,
                    ));
                }
                sources
            }
            None => Vec::new(),
        };

        let images = self.discover_images(topic).await;

        let draft = match self.write(topic, &sources, request).await {
            Ok(draft) => draft,
            Err(reason) => {
                return Ok(GenerationOutcome::aborted(Stage::ContentGeneration, reason));
            }
        };

        let band = request.word_band();
        let words = word_count(&draft.content);
        if !band.contains_with_tolerance(words, self.word_tolerance) {
            warn!(
                words,
                min = band.min,
                max = band.max,
                "Generated length outside requested band"
            );
        }

        let final_check = self
            .duplicates
            .check(&draft.title, &draft.content, existing)
            .await;
        if final_check.is_duplicate {
            return Ok(GenerationOutcome::aborted(
                Stage::FinalDuplicateCheck,
                AbortReason::Duplicate {
                    reason: final_check.reason,
                },
            ));
        }

        let verification = self.facts.verify(&draft.content, &draft.sources).await;
        if !verification.verified {
            return Ok(GenerationOutcome::aborted(
                Stage::FactVerification,
                AbortReason::Unverified {
                    score: verification.score,
                    analysis: verification.analysis,
                },
            ));
        }

        let moderation = self.moderator.moderate(&draft.content).await;
        if !moderation.appropriate {
            return Ok(GenerationOutcome::aborted(
                Stage::Moderation,
                AbortReason::Flagged {
                    reason: moderation.reason,
                },
            ));
        }

        let categorization = self
            .categorizer
            .categorize(&draft.title, &draft.content)
            .await;

        let article = assemble(draft, author, images, categorization);
        info!(id = %article.id, title = %article.title, words, "Article generated");
        Ok(GenerationOutcome::Generated(Box::new(article)))
    }

    async fn discover_images(&self, topic: &str) -> Vec<ArticleImage> {
        let Some(search) = &self.images else {
            return Vec::new();
        };
        if self.images_per_article == 0 {
            return Vec::new();
        }

        match search.search(topic, self.images_per_article).await {
            Ok(images) => {
                debug!(count = images.len(), "Discovered images");
                images
            }
            Err(e) => {
                warn!(topic, "Image discovery failed, continuing without images: {}", e);
                Vec::new()
            }
        }
    }

    async fn write(
        &self,
        topic: &str,
        sources: &[Source],
        request: &GenerationRequest,
    ) -> std::result::Result<Draft, AbortReason> {
        match self.variant {
            GeneratorVariant::Completion => {
                let prompt = prompts::article_json(topic, sources, request.word_band());
                let (value, _) = generate_json(self.provider.as_ref(), prompt)
                    .await
                    .map_err(|e| AbortReason::NoContent(e.to_string()))?;
                draft_from_json(topic, &value, sources)
            }
            GeneratorVariant::Retrieval => {
                let prompt = prompts::article_markdown(topic, request.word_band());
                let response = self
                    .provider
                    .generate(&prompt)
                    .await
                    .map_err(|e| AbortReason::NoContent(e.to_string()))?;

                let citations = citations_from_urls(&response.citations);
                let normalized = normalize(&response.text, &citations)
                    .ok_or_else(|| AbortReason::NoContent("empty response".to_string()))?;
                if normalized.content.trim().is_empty() {
                    return Err(AbortReason::NoContent("article body is empty".to_string()));
                }

                Ok(Draft {
                    title: normalized.title,
                    content: normalized.content,
                    infobox: None,
                    sources: normalized
                        .references
                        .iter()
                        .map(|c| Source::from_citation_url(&c.url))
                        .collect(),
                    citations: normalized.references,
                })
            }
        }
    }
}

fn draft_from_json(
    topic: &str,
    value: &Value,
    sources: &[Source],
) -> std::result::Result<Draft, AbortReason> {
    let content = json_string(value, "content")
        .ok_or_else(|| AbortReason::NoContent("response has no content".to_string()))?;

    let citations = sources
        .iter()
        .enumerate()
        .map(|(i, source)| Citation {
            id: i as u32 + 1,
            url: source.url.clone(),
            title: source.title.clone(),
        })
        .collect();

    Ok(Draft {
        title: json_string(value, "title").unwrap_or_else(|| topic.to_string()),
        content,
        infobox: parse_infobox(value.get("infobox")),
        citations,
        sources: sources.to_vec(),
    })
}

/// Scalar entries only; nested values are dropped
fn parse_infobox(value: Option<&Value>) -> Option<Infobox> {
    let object = value?.as_object()?;
    let infobox: Infobox = object
        .iter()
        .filter_map(|(label, v)| {
            let text = match v {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!label.trim().is_empty() && !text.is_empty()).then(|| (label.trim().to_string(), text))
        })
        .collect();
    (!infobox.is_empty()).then_some(infobox)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn assemble(
    draft: Draft,
    author: Author,
    images: Vec<ArticleImage>,
    categorization: Categorization,
) -> Article {
    let now = Utc::now();

    let categories = categorization
        .categories
        .into_iter()
        .map(|c| Category {
            id: new_id(),
            name: c.name,
            level: c.level,
        })
        .collect();
    let tags = categorization
        .tags
        .into_iter()
        .map(|name| Tag { id: new_id(), name })
        .collect();

    let version = ArticleVersion {
        id: new_id(),
        title: draft.title.clone(),
        content: draft.content.clone(),
        author_id: author.id.clone(),
        changes: GENERATION_CHANGE_NOTE.to_string(),
        created_at: now,
    };

    Article {
        id: new_id(),
        title: draft.title,
        content: draft.content,
        status: ArticleStatus::Draft,
        author,
        categories,
        tags,
        images,
        infobox: draft.infobox,
        is_ai_generated: true,
        categories_locked_by_ai: true,
        versions: vec![version],
        citations: (!draft.citations.is_empty()).then_some(draft.citations),
        created_at: now,
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::article::gates::LlmModerator;
    use crate::session::StaticSession;

    pub fn author() -> Author {
        Author {
            id: "u1".to_string(),
            name: "Ada".to_string(),
        }
    }

    pub fn signed_in() -> SharedSession {
        Arc::new(StaticSession::new(author()))
    }

    /// Provider that passes every gate of the completion variant
    pub fn passing_completion() -> ScriptedProvider {
        ScriptedProvider::new()
            .respond(CallKind::DuplicateCheck, r#"{"isDuplicate": false}"#)
            .respond(
                CallKind::SourceDiscovery,
                r#"{"sources": [{"url": "https://a.org/coffee", "title": "Coffee history", "publisher": "A", "type": "book", "year": 2001}]}"#,
            )
            .respond(
                CallKind::ContentGeneration,
                r#"{"title": "Coffee", "content": "Coffee is a brewed drink.\n\n## History\n\nFirst cultivated in Yemen.", "infobox": {"Origin": "Ethiopia", "Caffeine": 1.5}}"#,
            )
            .respond(CallKind::FactCheck, r#"{"verified": true, "score": 88, "analysis": "ok"}"#)
            .respond(CallKind::Moderation, r#"{"flagged": false, "categories": {"hate": false}}"#)
            .respond(
                CallKind::Categorization,
                r#"{"main": ["Food and drink"], "specific": ["Coffee"], "tags": ["caffeine"]}"#,
            )
    }

    pub fn pipeline(
        provider: Arc<ScriptedProvider>,
        variant: GeneratorVariant,
        session: SharedSession,
    ) -> ArticlePipeline {
        let moderator: SharedModerator = Arc::new(LlmModerator::new(provider.clone()));
        ArticlePipeline::new(provider, variant, session, moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::images::ImageSearch;
    use crate::session::StaticSession;
    use crate::types::{ArticleRef, ErrorCategory, PediaError};
    use async_trait::async_trait;

    fn request(topic: &str) -> GenerationRequest {
        GenerationRequest::new(topic, 5, 500)
    }

    fn coffee_exists() -> Vec<ArticleRef> {
        vec![ArticleRef {
            id: "a1".to_string(),
            title: "Coffee".to_string(),
            content: String::new(),
        }]
    }

    #[tokio::test]
    async fn test_completion_happy_path_assembles_article() {
        let provider = Arc::new(passing_completion());
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        let article = pipeline
            .run(&request("Coffee"))
            .await
            .unwrap()
            .into_article()
            .unwrap();

        assert_eq!(article.title, "Coffee");
        assert_eq!(article.status, ArticleStatus::Draft);
        assert!(article.is_ai_generated);
        assert!(article.categories_locked_by_ai);
        assert_eq!(article.author, author());
        assert_eq!(article.versions.len(), 1);
        assert_eq!(article.versions[0].changes, GENERATION_CHANGE_NOTE);
        assert_eq!(article.versions[0].author_id, "u1");
        assert_eq!(article.categories.len(), 2);
        assert_eq!(article.tags[0].name, "caffeine");
        assert_ne!(article.categories[0].id, article.categories[1].id);

        let infobox = article.infobox.unwrap();
        assert_eq!(infobox.get("Origin").map(String::as_str), Some("Ethiopia"));
        assert_eq!(infobox.get("Caffeine").map(String::as_str), Some("1.5"));

        let citations = article.citations.unwrap();
        assert_eq!(citations[0].id, 1);
        assert_eq!(citations[0].url, "https://a.org/coffee");

        // no existing articles: the similarity gate never calls out
        assert!(!provider.called(CallKind::DuplicateCheck));
    }

    #[tokio::test]
    async fn test_early_duplicate_exits_before_sources() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond(CallKind::DuplicateCheck, r#"{"isDuplicate": true, "reason": "same"}"#),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        let outcome = pipeline
            .run(&request("Coffee").with_existing(coffee_exists()))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            GenerationOutcome::Aborted {
                stage: Stage::EarlyDuplicateCheck,
                ..
            }
        ));
        assert!(!provider.called(CallKind::SourceDiscovery));
        assert!(!provider.called(CallKind::ContentGeneration));
    }

    #[tokio::test]
    async fn test_retrieval_title_match_exits_without_any_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Retrieval, signed_in());

        let outcome = pipeline
            .run(&request("coffee").with_existing(coffee_exists()))
            .await
            .unwrap();

        assert!(outcome.into_article().is_none());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_author_is_fatal() {
        let provider = Arc::new(passing_completion());
        let pipeline = pipeline(
            provider.clone(),
            GeneratorVariant::Completion,
            Arc::new(StaticSession::anonymous()),
        );

        let err = pipeline.run(&request("Coffee")).await.unwrap_err();
        assert!(matches!(err, PediaError::NotAuthenticated));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_word_band_is_rejected() {
        let provider = Arc::new(passing_completion());
        let pipeline = pipeline(provider, GeneratorVariant::Completion, signed_in());

        let err = pipeline
            .run(&GenerationRequest::new("Coffee", 900, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, PediaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_sources_aborts_before_content() {
        let provider = Arc::new(
            ScriptedProvider::new().respond(CallKind::SourceDiscovery, r#"{"sources": []}"#),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        let outcome = pipeline.run(&request("Coffee")).await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Aborted {
                reason: AbortReason::NoSources,
                ..
            }
        ));
        assert!(!provider.called(CallKind::ContentGeneration));
    }

    #[tokio::test]
    async fn test_unverified_never_reaches_moderation() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond(
                    CallKind::SourceDiscovery,
                    r#"{"sources": [{"url": "https://a.org", "title": "A"}]}"#,
                )
                .respond(
                    CallKind::ContentGeneration,
                    r#"{"title": "Coffee", "content": "Coffee was invented in 1990."}"#,
                )
                .respond(CallKind::FactCheck, r#"{"verified": false, "score": 20, "analysis": "wrong date"}"#)
                .respond(CallKind::Moderation, r#"{"flagged": false}"#),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        let outcome = pipeline.run(&request("Coffee")).await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Aborted {
                stage: Stage::FactVerification,
                ..
            }
        ));
        assert!(!provider.called(CallKind::Moderation));
        assert!(!provider.called(CallKind::Categorization));
    }

    #[tokio::test]
    async fn test_content_failure_aborts() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond(
                    CallKind::SourceDiscovery,
                    r#"{"sources": [{"url": "https://a.org", "title": "A"}]}"#,
                )
                .fail(CallKind::ContentGeneration, ErrorCategory::Network),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        let outcome = pipeline.run(&request("Coffee")).await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Aborted {
                stage: Stage::ContentGeneration,
                reason: AbortReason::NoContent(_),
            }
        ));
        assert!(!provider.called(CallKind::FactCheck));
    }

    #[tokio::test]
    async fn test_flagged_content_is_blocked() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond(
                    CallKind::SourceDiscovery,
                    r#"{"sources": [{"url": "https://a.org", "title": "A"}]}"#,
                )
                .respond(CallKind::ContentGeneration, r#"{"title": "T", "content": "Body"}"#)
                .respond(CallKind::FactCheck, r#"{"verified": true, "score": 90}"#)
                .respond(CallKind::Moderation, r#"{"flagged": true, "categories": {"violence": true}}"#),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());

        match pipeline.run(&request("Coffee")).await.unwrap() {
            GenerationOutcome::Aborted {
                stage: Stage::Moderation,
                reason: AbortReason::Flagged { reason },
            } => assert_eq!(reason.as_deref(), Some("violence")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!provider.called(CallKind::Categorization));
    }

    #[tokio::test]
    async fn test_categorization_failure_still_generates() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond(
                    CallKind::SourceDiscovery,
                    r#"{"sources": [{"url": "https://a.org", "title": "A"}]}"#,
                )
                .respond(CallKind::ContentGeneration, r#"{"title": "T", "content": "Body"}"#)
                .respond(CallKind::FactCheck, r#"{"verified": true, "score": 90}"#)
                .respond(CallKind::Moderation, r#"{"flagged": false}"#)
                .fail(CallKind::Categorization, ErrorCategory::ParseError),
        );
        let pipeline = pipeline(provider, GeneratorVariant::Completion, signed_in());

        let article = pipeline
            .run(&request("Coffee"))
            .await
            .unwrap()
            .into_article()
            .unwrap();
        assert!(article.categories.is_empty());
        assert!(article.tags.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_variant_uses_citations() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .respond_with_citations(
                    CallKind::ContentGeneration,
                    "# Espresso\n\nEspresso is concentrated coffee [1].\n## Preparation\nPressure brewing [2].",
                    &["https://a.com/x", "https://b.com/y"],
                )
                .respond(CallKind::FactCheck, r#"{"verified": true, "score": 80}"#)
                .respond(CallKind::Moderation, r#"{"flagged": false}"#)
                .respond(CallKind::Categorization, r#"{"categories": ["Coffee drinks"], "tags": ["espresso"]}"#),
        );
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Retrieval, signed_in());

        let article = pipeline
            .run(&request("Espresso"))
            .await
            .unwrap()
            .into_article()
            .unwrap();

        assert_eq!(article.title, "Espresso");
        assert!(article.content.contains("[1] a.com/x"));
        assert_eq!(article.citations.map(|c| c.len()), Some(2));
        assert_eq!(article.categories[0].level, None);
        assert!(!provider.called(CallKind::SourceDiscovery));

        let fact_prompt = provider
            .requests()
            .into_iter()
            .find(|r| r.kind == CallKind::FactCheck)
            .unwrap();
        assert!(fact_prompt.user.contains("https://b.com/y"));
    }

    struct BrokenImages;

    #[async_trait]
    impl ImageSearch for BrokenImages {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<ArticleImage>> {
            Err(crate::types::PediaError::ImageSearch("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_image_failure_is_not_an_abort() {
        let provider = Arc::new(passing_completion());
        let pipeline = pipeline(provider, GeneratorVariant::Completion, signed_in())
            .with_images(Some(Arc::new(BrokenImages)), 3);

        let article = pipeline
            .run(&request("Coffee"))
            .await
            .unwrap()
            .into_article()
            .unwrap();
        assert!(article.images.is_empty());
    }

    #[test]
    fn test_infobox_keeps_scalars_only() {
        let value = serde_json::json!({"A": "x", "B": 2, "C": {"nested": 1}, "D": "", "E": null});
        let infobox = parse_infobox(Some(&value)).unwrap();
        assert_eq!(infobox.len(), 2);
        assert!(parse_infobox(Some(&serde_json::json!({}))).is_none());
        assert!(parse_infobox(None).is_none());
    }
}
