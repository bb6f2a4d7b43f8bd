//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/weavepedia/) and project (.weavepedia/) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderKind;
use crate::constants::{article as article_constants, network, retry};
use crate::types::{Author, PediaError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Article generation settings
    pub generation: GenerationConfig,

    /// Moderation gate settings
    pub moderation: ModerationConfig,

    /// Image search settings
    pub images: ImageConfig,

    /// Author attributed to generated articles
    pub author: AuthorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            moderation: ModerationConfig::default(),
            images: ImageConfig::default(),
            author: AuthorConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PediaError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.llm.provider.parse::<ProviderKind>().map_err(PediaError::Config)?;

        if self.llm.timeout_secs == 0 {
            return Err(PediaError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.min_words == 0 {
            return Err(PediaError::Config(
                "generation.min_words must be greater than 0".to_string(),
            ));
        }

        if self.generation.min_words > self.generation.max_words {
            return Err(PediaError::Config(format!(
                "generation.min_words ({}) must not exceed generation.max_words ({})",
                self.generation.min_words, self.generation.max_words
            )));
        }

        if !(0.0..=1.0).contains(&self.generation.word_tolerance) {
            return Err(PediaError::Config(format!(
                "generation.word_tolerance must be between 0.0 and 1.0, got {}",
                self.generation.word_tolerance
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: openai, ollama, perplexity
    pub provider: String,

    /// Model name (empty = provider default)
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// API base URL override
    pub api_base: Option<String>,

    /// Retries for transient provider failures
    pub max_retries: usize,

    /// API key; prefer the provider's environment variable
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: String::new(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_tokens: 4096,
            api_base: None,
            max_retries: retry::DEFAULT_MAX_RETRIES,
            api_key: None,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default minimum article length in words
    pub min_words: usize,

    /// Default maximum article length in words
    pub max_words: usize,

    /// Fractional slack when checking generated length against the band
    pub word_tolerance: f32,

    /// Images attached per article (0 disables image discovery)
    pub images_per_article: usize,

    /// Wall-clock bound for one CLI command (0 = unbounded)
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_words: 800,
            max_words: 1500,
            word_tolerance: 0.25,
            images_per_article: article_constants::DEFAULT_IMAGES_PER_ARTICLE,
            timeout_secs: 0,
        }
    }
}

// =============================================================================
// Moderation Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationBackend {
    /// OpenAI classifier when the provider is OpenAI, LLM-backed otherwise
    #[default]
    Auto,
    OpenAi,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModerationConfig {
    pub backend: ModerationBackend,
}

// =============================================================================
// Image Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,

    /// Openverse API base URL
    pub api_base: String,

    /// OAuth client id; the secret comes from OPENVERSE_CLIENT_SECRET
    pub client_id: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.openverse.org/v1".to_string(),
            client_id: None,
        }
    }
}

// =============================================================================
// Author Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthorConfig {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl AuthorConfig {
    /// Configured author, if both id and name are set
    pub fn to_author(&self) -> Option<Author> {
        match (&self.id, &self.name) {
            (Some(id), Some(name)) if !id.trim().is_empty() => Some(Author {
                id: id.clone(),
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "openai");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_word_band() {
        let mut config = Config::default();
        config.generation.min_words = 2000;
        config.generation.max_words = 1000;
        assert!(matches!(config.validate(), Err(PediaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = Config::default();
        config.llm.provider = "carrier-pigeon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_config_debug_redacts_key() {
        let config = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_author_requires_id_and_name() {
        let partial = AuthorConfig {
            id: Some("u1".to_string()),
            name: None,
        };
        assert!(partial.to_author().is_none());

        let full = AuthorConfig {
            id: Some("u1".to_string()),
            name: Some("Editor".to_string()),
        };
        assert_eq!(full.to_author().unwrap().name, "Editor");
    }
}
