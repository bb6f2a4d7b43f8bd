//! Article Generators
//!
//! `ArticleGenerator` is the capability surface callers use. Two variants
//! implement it and configuration picks one:
//! - `CompletionGenerator`: JSON completions, discovered sources, similarity
//!   duplicate scoring, hierarchical categories
//! - `RetrievalGenerator`: markdown with inline citations, title-match
//!   duplicates, flat categories

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ai::provider::{GeneratorVariant, ProviderKind, SharedProvider, generate_json};
use crate::article::batch::{BatchReport, BatchRunner};
use crate::article::expander::TopicExpander;
use crate::article::gates::create_moderator;
use crate::article::normalizer::{citations_from_urls, normalize};
use crate::article::pipeline::ArticlePipeline;
use crate::article::prompts::{self, EDIT_SUMMARY_PREFIX};
use crate::config::Config;
use crate::images::SharedImageSearch;
use crate::session::SharedSession;
use crate::types::{
    Article, Categorization, EditSuggestion, ErrorCategory, GenerationRequest, LlmError,
    PediaError, Result, json_string, json_string_or,
};

const DEFAULT_EDIT_SUMMARY: &str = "Revised with AI assistance";

#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    /// One article, or `None` when any gate rejects the attempt
    async fn generate_article(&self, request: &GenerationRequest) -> Result<Option<Article>>;

    /// Up to `count` articles about subtopics of `request.topic`
    async fn generate_articles(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<Article>> {
        Ok(self.generate_batch(request, count).await?.articles)
    }

    /// Like `generate_articles`, with attempt and failure details
    async fn generate_batch(&self, request: &GenerationRequest, count: usize)
    -> Result<BatchReport>;

    async fn suggest_edits(
        &self,
        title: &str,
        content: &str,
        instructions: &str,
    ) -> Result<EditSuggestion>;

    async fn generate_categories(&self, title: &str, content: &str) -> Result<Categorization>;

    fn variant(&self) -> GeneratorVariant;
}

pub type SharedGenerator = Arc<dyn ArticleGenerator>;

/// Generator for the configured provider
pub fn create_generator(
    config: &Config,
    provider: SharedProvider,
    session: SharedSession,
    images: Option<SharedImageSearch>,
) -> Result<SharedGenerator> {
    let kind: ProviderKind = config.llm.provider.parse().map_err(PediaError::Config)?;
    let moderator = create_moderator(config, provider.clone())?;

    let pipeline = ArticlePipeline::new(provider.clone(), kind.variant(), session, moderator)
        .with_images(images, config.generation.images_per_article)
        .with_word_tolerance(config.generation.word_tolerance);

    debug!(provider = %kind, variant = ?kind.variant(), "Creating article generator");
    Ok(match kind.variant() {
        GeneratorVariant::Completion => Arc::new(CompletionGenerator::new(provider, pipeline)),
        GeneratorVariant::Retrieval => Arc::new(RetrievalGenerator::new(provider, pipeline)),
    })
}

// =============================================================================
// Shared Engine
// =============================================================================

/// Pipeline plus expander; both variants run generation the same way
struct Engine {
    pipeline: ArticlePipeline,
    expander: TopicExpander,
}

impl Engine {
    fn new(provider: SharedProvider, pipeline: ArticlePipeline) -> Self {
        Self {
            expander: TopicExpander::new(provider),
            pipeline,
        }
    }

    async fn article(&self, request: &GenerationRequest) -> Result<Option<Article>> {
        Ok(self.pipeline.run(request).await?.into_article())
    }

    async fn batch(&self, request: &GenerationRequest, count: usize) -> Result<BatchReport> {
        let mut rng = StdRng::from_os_rng();
        BatchRunner::new(&self.pipeline, &self.expander)
            .run(request, count, &mut rng)
            .await
    }

    async fn categories(&self, title: &str, content: &str) -> Result<Categorization> {
        Ok(self.pipeline.categorizer().categorize(title, content).await)
    }
}

// =============================================================================
// Completion Variant
// =============================================================================

pub struct CompletionGenerator {
    provider: SharedProvider,
    engine: Engine,
}

impl CompletionGenerator {
    pub fn new(provider: SharedProvider, pipeline: ArticlePipeline) -> Self {
        Self {
            engine: Engine::new(provider.clone(), pipeline),
            provider,
        }
    }
}

#[async_trait]
impl ArticleGenerator for CompletionGenerator {
    async fn generate_article(&self, request: &GenerationRequest) -> Result<Option<Article>> {
        self.engine.article(request).await
    }

    async fn generate_batch(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<BatchReport> {
        self.engine.batch(request, count).await
    }

    #[instrument(skip(self, content, instructions))]
    async fn suggest_edits(
        &self,
        title: &str,
        content: &str,
        instructions: &str,
    ) -> Result<EditSuggestion> {
        let request = prompts::edit_json(title, content, instructions);
        let (value, _) = generate_json(self.provider.as_ref(), request).await?;

        let revised = json_string(&value, "content").ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                "edit response has no content",
                self.provider.name(),
            )
        })?;

        Ok(EditSuggestion {
            content: revised,
            summary: json_string_or(&value, "summary", DEFAULT_EDIT_SUMMARY),
            references: Vec::new(),
        })
    }

    async fn generate_categories(&self, title: &str, content: &str) -> Result<Categorization> {
        self.engine.categories(title, content).await
    }

    fn variant(&self) -> GeneratorVariant {
        GeneratorVariant::Completion
    }
}

// =============================================================================
// Retrieval Variant
// =============================================================================

pub struct RetrievalGenerator {
    provider: SharedProvider,
    engine: Engine,
}

impl RetrievalGenerator {
    pub fn new(provider: SharedProvider, pipeline: ArticlePipeline) -> Self {
        Self {
            engine: Engine::new(provider.clone(), pipeline),
            provider,
        }
    }
}

/// Split a leading `SUMMARY:` line from the revised article
fn split_edit_summary(text: &str) -> (Option<String>, &str) {
    let text = text.trim_start();
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    match first.trim().strip_prefix(EDIT_SUMMARY_PREFIX) {
        Some(summary) if !summary.trim().is_empty() => (Some(summary.trim().to_string()), rest),
        Some(_) => (None, rest),
        None => (None, text),
    }
}

#[async_trait]
impl ArticleGenerator for RetrievalGenerator {
    async fn generate_article(&self, request: &GenerationRequest) -> Result<Option<Article>> {
        self.engine.article(request).await
    }

    async fn generate_batch(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<BatchReport> {
        self.engine.batch(request, count).await
    }

    #[instrument(skip(self, content, instructions))]
    async fn suggest_edits(
        &self,
        title: &str,
        content: &str,
        instructions: &str,
    ) -> Result<EditSuggestion> {
        let request = prompts::edit_markdown(title, content, instructions);
        let response = self.provider.generate(&request).await?;

        let (summary, article) = split_edit_summary(&response.text);
        let citations = citations_from_urls(&response.citations);
        let normalized = normalize(article, &citations).ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                "edit response is empty",
                self.provider.name(),
            )
        })?;

        Ok(EditSuggestion {
            content: normalized.content,
            summary: summary.unwrap_or_else(|| DEFAULT_EDIT_SUMMARY.to_string()),
            references: normalized.references,
        })
    }

    async fn generate_categories(&self, title: &str, content: &str) -> Result<Categorization> {
        self.engine.categories(title, content).await
    }

    fn variant(&self) -> GeneratorVariant {
        GeneratorVariant::Retrieval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::article::pipeline::fixtures::{passing_completion, pipeline, signed_in};
    use crate::session::StaticSession;

    fn completion(provider: Arc<ScriptedProvider>) -> CompletionGenerator {
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Completion, signed_in());
        CompletionGenerator::new(provider, pipeline)
    }

    fn retrieval(provider: Arc<ScriptedProvider>) -> RetrievalGenerator {
        let pipeline = pipeline(provider.clone(), GeneratorVariant::Retrieval, signed_in());
        RetrievalGenerator::new(provider, pipeline)
    }

    #[tokio::test]
    async fn test_generate_article_maps_outcome() {
        let generator = completion(Arc::new(passing_completion()));
        let article = generator
            .generate_article(&GenerationRequest::new("Coffee", 5, 500))
            .await
            .unwrap();
        assert_eq!(article.map(|a| a.title), Some("Coffee".to_string()));
    }

    #[tokio::test]
    async fn test_generate_articles_returns_batch_articles() {
        let provider = Arc::new(
            passing_completion()
                .respond(CallKind::TopicExpansion, r#"{"subtopics": ["Arabica", "Robusta", "Latte"]}"#),
        );
        let generator = completion(provider);
        let articles = generator
            .generate_articles(&GenerationRequest::new("Coffee", 5, 500), 2)
            .await
            .unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_completion_edit_suggestion() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::EditSuggestion,
            r#"{"content": "Revised body", "summary": "Fixed the founding date"}"#,
        ));
        let suggestion = completion(provider)
            .suggest_edits("Coffee", "Body", "fix the date")
            .await
            .unwrap();
        assert_eq!(suggestion.content, "Revised body");
        assert_eq!(suggestion.summary, "Fixed the founding date");
        assert!(suggestion.references.is_empty());
    }

    #[tokio::test]
    async fn test_completion_edit_without_content_is_error() {
        let provider = Arc::new(
            ScriptedProvider::new().respond(CallKind::EditSuggestion, r#"{"summary": "nothing"}"#),
        );
        assert!(completion(provider).suggest_edits("Coffee", "Body", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_retrieval_edit_suggestion_keeps_citations() {
        let provider = Arc::new(ScriptedProvider::new().respond_with_citations(
            CallKind::EditSuggestion,
            "SUMMARY: Added production figures\n# Coffee\n\nBrazil leads production [1].",
            &["https://stats.org/coffee/2024"],
        ));
        let suggestion = retrieval(provider)
            .suggest_edits("Coffee", "Body", "add production data")
            .await
            .unwrap();

        assert_eq!(suggestion.summary, "Added production figures");
        assert!(suggestion.content.starts_with("Brazil leads production [1]."));
        assert!(suggestion.content.contains("[1] stats.org/coffee"));
        assert_eq!(suggestion.references.len(), 1);
    }

    #[test]
    fn test_split_edit_summary() {
        assert_eq!(
            split_edit_summary("SUMMARY: tidy\n# T\nbody"),
            (Some("tidy".to_string()), "# T\nbody")
        );
        assert_eq!(split_edit_summary("# T\nbody"), (None, "# T\nbody"));
    }

    #[tokio::test]
    async fn test_generate_categories_by_variant() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::Categorization,
            r#"{"categories": ["Beverages"], "main": ["Food"], "tags": ["drink"]}"#,
        ));
        let flat = retrieval(provider.clone())
            .generate_categories("Coffee", "Body")
            .await
            .unwrap();
        assert_eq!(flat.categories[0].name, "Beverages");

        let tree = completion(provider).generate_categories("Coffee", "Body").await.unwrap();
        assert_eq!(tree.categories[0].name, "Food");
    }

    #[tokio::test]
    async fn test_generation_requires_author() {
        let provider = Arc::new(passing_completion());
        let pipeline = pipeline(
            provider.clone(),
            GeneratorVariant::Completion,
            Arc::new(StaticSession::anonymous()),
        );
        let generator = CompletionGenerator::new(provider, pipeline);

        let err = generator
            .generate_article(&GenerationRequest::new("Coffee", 5, 500))
            .await
            .unwrap_err();
        assert!(matches!(err, PediaError::NotAuthenticated));
    }

    #[test]
    fn test_create_generator_picks_variant() {
        let mut config = Config::default();
        config.llm.provider = "perplexity".to_string();
        let provider: SharedProvider = Arc::new(ScriptedProvider::new());

        let generator = create_generator(&config, provider.clone(), signed_in(), None).unwrap();
        assert_eq!(generator.variant(), GeneratorVariant::Retrieval);

        config.llm.provider = "ollama".to_string();
        let generator = create_generator(&config, provider, signed_in(), None).unwrap();
        assert_eq!(generator.variant(), GeneratorVariant::Completion);
    }
}
