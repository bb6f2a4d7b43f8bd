//! Article generation: prompts, gates, the single-article pipeline, batch
//! runs over expanded subtopics, and the generator variants that tie them
//! together.

pub mod batch;
pub mod categorize;
pub mod expander;
pub mod gates;
pub mod generator;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod sampling;
pub mod sources;

pub use batch::{BatchReport, BatchRunner};
pub use categorize::{CategoryScheme, Categorizer};
pub use expander::TopicExpander;
pub use generator::{
    ArticleGenerator, CompletionGenerator, RetrievalGenerator, SharedGenerator, create_generator,
};
pub use normalizer::{NormalizedArticle, normalize};
pub use pipeline::{AbortReason, ArticlePipeline, GenerationOutcome, Stage};
pub use sampling::pick_weighted;
pub use sources::SourceFinder;
