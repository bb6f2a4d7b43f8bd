//! Check Command
//!
//! Preflight before generating: provider reachability and a configured author.
//!
//! Usage:
//!   weavepedia check [--provider NAME] [--model NAME]

use crate::ai::LlmProvider;
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::AuthorConfig;
use crate::types::{PediaError, Result};

pub async fn run(ctx: &CommandContext) -> Result<()> {
    let output = Output::new();
    output.header("Preflight checks");

    let mut failed: Vec<String> = Vec::new();

    match check_author(&ctx.config.author) {
        Ok(name) => output.success(&format!("Author '{}' is configured", name)),
        Err(e) => {
            output.error(&e.to_string());
            failed.push("author".to_string());
        }
    }

    match check_provider(ctx.provider.as_ref()).await {
        Ok(()) => output.success(&format!(
            "Provider '{}' is healthy ({})",
            ctx.provider.name(),
            ctx.provider.model()
        )),
        Err(e) => {
            output.error(&e.to_string());
            failed.push(format!("provider {}", ctx.provider.name()));
        }
    }

    if !failed.is_empty() {
        return Err(PediaError::Config(format!(
            "Preflight checks failed: {}",
            failed.join(", ")
        )));
    }
    Ok(())
}

fn check_author(config: &AuthorConfig) -> Result<String> {
    config
        .to_author()
        .map(|author| author.name)
        .ok_or(PediaError::NotAuthenticated)
}

/// `Ok` only when the provider reports itself healthy
pub async fn check_provider(provider: &dyn LlmProvider) -> Result<()> {
    match provider.health_check().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(PediaError::Config(format!(
            "Provider '{}' health check failed; check credentials and connectivity",
            provider.name()
        ))),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;

    #[tokio::test]
    async fn test_healthy_provider_passes() {
        let provider = ScriptedProvider::new();
        assert!(check_provider(&provider).await.is_ok());
    }

    #[tokio::test]
    async fn test_unhealthy_provider_is_reported() {
        let provider = ScriptedProvider::new().unhealthy();
        let err = check_provider(&provider).await.unwrap_err();
        assert!(matches!(err, PediaError::Config(_)));
        assert!(err.to_string().contains("'scripted'"));
    }

    #[test]
    fn test_author_requires_id_and_name() {
        let missing = AuthorConfig::default();
        assert!(matches!(
            check_author(&missing),
            Err(PediaError::NotAuthenticated)
        ));

        let configured = AuthorConfig {
            id: Some("editor-1".to_string()),
            name: Some("Editor".to_string()),
        };
        assert_eq!(check_author(&configured).unwrap(), "Editor");
    }
}
