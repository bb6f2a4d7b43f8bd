//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/weavepedia/config.toml)
//! 3. Project config (.weavepedia/config.toml)
//! 4. Environment variables (WEAVEPEDIA_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{PediaError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // WEAVEPEDIA_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("WEAVEPEDIA_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| PediaError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only (defaults underneath)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| PediaError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/weavepedia/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("weavepedia"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".weavepedia")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Default directory for generated drafts
    pub fn drafts_dir() -> PathBuf {
        Self::project_dir().join("drafts")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let drafts = Self::drafts_dir();
        let exists = if drafts.exists() { "✓" } else { "✗" };
        println!("  Drafts:  {} {}", exists, drafts.display());
    }

    /// Print the effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| PediaError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            PediaError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_template(&config_path, Self::default_global_config(), force)?;
        Ok(global_dir)
    }

    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(Self::drafts_dir())?;

        let config_path = Self::project_config_path();
        Self::write_template(&config_path, Self::default_project_config(), force)?;
        Ok(project_dir)
    }

    fn write_template(path: &Path, content: &str, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, content)?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    fn default_global_config() -> &'static str {
        r#"# Weavepedia Global Configuration
# User-wide defaults. Project settings in .weavepedia/config.toml override these.

version = "1.0"

[llm]
provider = "openai"
timeout_secs = 300
max_retries = 2

[author]
# id = "user-id"
# name = "Your Name"
"#
    }

    fn default_project_config() -> &'static str {
        r#"# Weavepedia Project Configuration

version = "1.0"

[generation]
min_words = 800
max_words = 1500
word_tolerance = 0.25
images_per_article = 3

[moderation]
backend = "auto"

[images]
enabled = true
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[llm]
provider = "perplexity"

[generation]
min_words = 300
max_words = 600
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.llm.provider, "perplexity");
        assert_eq!(config.generation.min_words, 300);
        assert_eq!(config.generation.max_words, 600);
        // untouched sections keep defaults
        assert!(config.images.enabled);
    }

    #[test]
    fn test_load_from_file_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[generation]\nmin_words = 900\nmax_words = 100\n").unwrap();

        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn test_templates_parse() {
        let dir = TempDir::new().unwrap();
        for (name, body) in [
            ("global.toml", ConfigLoader::default_global_config()),
            ("project.toml", ConfigLoader::default_project_config()),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, body).unwrap();
            assert!(ConfigLoader::load_from_file(&path).is_ok(), "{} failed", name);
        }
    }
}
