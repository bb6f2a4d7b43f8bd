//! Weavepedia - AI-Driven Encyclopedia Article Generator
//!
//! Turns a topic into a sourced, fact-checked and moderated encyclopedia
//! article, or expands a broad topic into a batch of articles on distinct
//! subtopics.
//!
//! ## Core Features
//!
//! - **Verification Gates**: duplicate detection, fact verification and
//!   moderation before an article is assembled
//! - **Two Generator Variants**: JSON completions with discovered sources, or
//!   retrieval-backed markdown with inline citations
//! - **Batch Generation**: weighted subtopic sampling with within-batch
//!   duplicate checks
//!
//! ## Quick Start
//!
//! ```ignore
//! use weavepedia::{ConfigLoader, GenerationRequest, create_generator, create_provider};
//! use weavepedia::session::StaticSession;
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.llm)?;
//! let session = Arc::new(StaticSession::from_config(&config.author));
//! let generator = create_generator(&config, provider, session, None)?;
//!
//! let request = GenerationRequest::new("Coffee", 800, 1500);
//! if let Some(article) = generator.generate_article(&request).await? {
//!     println!("{}", article.title);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider abstraction, prompt building, metrics, JSON repair
//! - [`article`]: pipeline, gates, batch runs and generator variants
//! - [`images`]: credentialed image search
//! - [`config`]: layered configuration
//! - [`session`]: author lookup for attribution

pub mod ai;
pub mod article;
pub mod cli;
pub mod config;
pub mod constants;
pub mod images;
pub mod session;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, PediaError, Result};

// Data Model
pub use types::{Article, ArticleRef, Categorization, EditSuggestion, GenerationRequest};

// =============================================================================
// Generation Re-exports
// =============================================================================

pub use article::{
    ArticleGenerator, ArticlePipeline, BatchReport, GenerationOutcome, SharedGenerator,
    create_generator,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    LlmProvider, LlmResponse, MeteredProvider, MetricsCollector, SharedMetrics, SharedProvider,
    create_provider, with_timeout,
};
