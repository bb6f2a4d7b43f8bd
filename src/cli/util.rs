//! CLI Common Utilities
//!
//! Shared setup for commands that talk to a provider, plus the JSON file
//! boundary: the article store is external, so articles move in and out of
//! the CLI as JSON files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::ai::{
    MeteredProvider, SharedMetrics, SharedProvider, create_provider, create_shared_metrics,
};
use crate::article::{SharedGenerator, create_generator};
use crate::config::{Config, ConfigLoader};
use crate::images::create_image_search;
use crate::session::StaticSession;
use crate::types::{Article, ArticleRef, PediaError, Result, slugify};

/// Command-line overrides for the `[llm]` section
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl LlmOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
    }
}

/// Command execution context
///
/// Loaded config plus a metered provider and the generator built on it.
pub struct CommandContext {
    pub config: Config,
    pub provider: SharedProvider,
    pub metrics: SharedMetrics,
    pub generator: SharedGenerator,
}

impl CommandContext {
    pub fn load(overrides: &LlmOverrides) -> Result<Self> {
        let mut config = ConfigLoader::load()?;
        overrides.apply(&mut config);
        config.validate()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let metrics = create_shared_metrics();
        let inner = create_provider(&config.llm)?;
        let provider: SharedProvider = Arc::new(MeteredProvider::new(inner, metrics.clone()));
        info!("Using LLM provider: {} ({})", provider.name(), provider.model());

        let session = Arc::new(StaticSession::from_config(&config.author));
        let images = if config.generation.images_per_article > 0 {
            create_image_search(&config.images)?
        } else {
            None
        };
        let generator = create_generator(&config, provider.clone(), session, images)?;

        Ok(Self {
            config,
            provider,
            metrics,
            generator,
        })
    }
}

// =============================================================================
// JSON File Boundary
// =============================================================================

pub fn read_article(path: &Path) -> Result<Article> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| {
        PediaError::Config(format!("{} is not an article file: {}", path.display(), e))
    })
}

/// Existing articles from a JSON array. Full article records work too;
/// only id, title and content are read.
pub fn read_existing(path: Option<&Path>) -> Result<Vec<ArticleRef>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path)?;
    let existing: Vec<ArticleRef> = serde_json::from_str(&text).map_err(|e| {
        PediaError::Config(format!(
            "{} must hold a JSON array of articles: {}",
            path.display(),
            e
        ))
    })?;
    debug!(count = existing.len(), "Loaded existing articles");
    Ok(existing)
}

/// Write `article` as pretty JSON named after its title and id
pub fn write_article(dir: &Path, article: &Article) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let short_id: String = article.id.chars().take(8).collect();
    let path = dir.join(format!("{}-{}.json", slugify(&article.title), short_id));
    fs::write(&path, serde_json::to_string_pretty(article)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArticleStatus, Author};
    use chrono::Utc;
    use tempfile::TempDir;

    fn article() -> Article {
        Article {
            id: "0123456789abcdef".to_string(),
            title: "Coffee Roasting".to_string(),
            content: "Body".to_string(),
            status: ArticleStatus::Draft,
            author: Author {
                id: "u1".to_string(),
                name: "Ada".to_string(),
            },
            categories: Vec::new(),
            tags: Vec::new(),
            images: Vec::new(),
            infobox: None,
            is_ai_generated: true,
            categories_locked_by_ai: true,
            versions: Vec::new(),
            citations: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_written_article_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = write_article(dir.path(), &article()).unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("coffee-roasting-01234567.json")
        );
        let loaded = read_article(&path).unwrap();
        assert_eq!(loaded.title, "Coffee Roasting");
        assert!(loaded.is_ai_generated);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"isAIGenerated\": true"));
    }

    #[test]
    fn test_existing_accepts_full_articles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.json");
        let articles = vec![article()];
        fs::write(&path, serde_json::to_string(&articles).unwrap()).unwrap();

        let existing = read_existing(Some(&path)).unwrap();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].title, "Coffee Roasting");
        assert!(read_existing(None).unwrap().is_empty());
    }

    #[test]
    fn test_existing_must_be_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.json");
        fs::write(&path, r#"{"id": "a"}"#).unwrap();
        assert!(matches!(read_existing(Some(&path)), Err(PediaError::Config(_))));
    }

    #[test]
    fn test_overrides_replace_provider_and_model() {
        let mut config = Config::default();
        LlmOverrides {
            provider: Some("ollama".to_string()),
            model: Some("llama3".to_string()),
        }
        .apply(&mut config);
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3");
    }
}
