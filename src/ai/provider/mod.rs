//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait that turns a system prompt plus a user
//! prompt into generated text and, for retrieval-style providers, citation
//! URLs. All providers return `LlmResponse` with token usage for metrics.
//!
//! ## Modules
//!
//! - `openai`: completion variant (JSON-object responses)
//! - `ollama`: completion variant for local models
//! - `perplexity`: retrieval variant with inline citations
//! - `retry`: backoff for transient transport failures

mod ollama;
mod openai;
mod perplexity;
mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;
pub use retry::{RetryPolicy, with_retry};

pub(crate) use openai::{DEFAULT_API_BASE as OPENAI_API_BASE, resolve_api_key as resolve_openai_key};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::ai::validation::extract_json_from_response;
use crate::config::LlmConfig;
use crate::constants::temperature;
use crate::types::{PediaError, Result};

// =============================================================================
// Call Purpose
// =============================================================================

/// What a provider call is for. Fixes the sampling temperature and lets
/// metrics and tests tell calls apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    DuplicateCheck,
    SourceDiscovery,
    ContentGeneration,
    FactCheck,
    Moderation,
    Categorization,
    TopicExpansion,
    EditSuggestion,
}

impl CallKind {
    /// Lower temperatures wherever the output is parsed as structured data
    pub fn temperature(&self) -> f32 {
        match self {
            Self::DuplicateCheck | Self::SourceDiscovery | Self::FactCheck | Self::Moderation => {
                temperature::RESEARCH
            }
            Self::Categorization => temperature::CATEGORIZATION,
            Self::ContentGeneration | Self::EditSuggestion => temperature::PROSE,
            Self::TopicExpansion => temperature::IDEATION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateCheck => "duplicate_check",
            Self::SourceDiscovery => "source_discovery",
            Self::ContentGeneration => "content_generation",
            Self::FactCheck => "fact_check",
            Self::Moderation => "moderation",
            Self::Categorization => "categorization",
            Self::TopicExpansion => "topic_expansion",
            Self::EditSuggestion => "edit_suggestion",
        }
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub kind: CallKind,
    pub system: String,
    pub user: String,
    /// Ask the provider for a single JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(kind: CallKind, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            kind,
            system: system.into(),
            user: user.into(),
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.kind.temperature()
    }
}

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Provider output with usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw generated text
    pub text: String,
    /// Citation URLs (retrieval providers only)
    pub citations: Vec<String>,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Response with text only (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }

    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = citations;
        self
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Wall clock milliseconds, retries included
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared provider handle
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// Provider Selection
// =============================================================================

/// Which generator variant a provider backs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorVariant {
    /// JSON completions; sources discovered separately
    Completion,
    /// Free text with inline citations
    Retrieval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
    Perplexity,
}

impl ProviderKind {
    pub fn variant(&self) -> GeneratorVariant {
        match self {
            Self::OpenAi | Self::Ollama => GeneratorVariant::Completion,
            Self::Perplexity => GeneratorVariant::Retrieval,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "perplexity" => Ok(Self::Perplexity),
            other => Err(format!(
                "Unknown provider: {}. Supported: openai, ollama, perplexity",
                other
            )),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Perplexity => "perplexity",
        })
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion. Transport failures and non-success statuses are errors.
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Run a JSON-mode call and parse the reply, repairing common model formatting slips
pub async fn generate_json(
    provider: &dyn LlmProvider,
    request: CompletionRequest,
) -> Result<(Value, LlmResponse)> {
    let request = request.json();
    let response = provider.generate(&request).await?;
    let value = extract_json_from_response(&response.text)?;
    Ok((value, response))
}

/// Create a shared provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    let kind: ProviderKind = config.provider.parse().map_err(PediaError::Config)?;
    Ok(match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(config)?),
        ProviderKind::Perplexity => Arc::new(PerplexityProvider::new(config)?),
    })
}

/// Configured model name, or the provider default when blank
pub(crate) fn model_or(config: &LlmConfig, default: &str) -> String {
    let trimmed = config.model.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
