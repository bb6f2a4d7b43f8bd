//! Content Moderation Gate
//!
//! Two backends behind `Moderator`: OpenAI's moderation endpoint and an
//! LLM-backed classifier for providers without one. Both fail closed; a
//! moderation failure blocks publication.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::provider::{
    OPENAI_API_BASE, ProviderKind, RetryPolicy, SharedProvider, generate_json, resolve_openai_key,
    with_retry,
};
use crate::article::prompts;
use crate::config::{Config, LlmConfig, ModerationBackend};
use crate::types::{ErrorClassifier, ModerationResult, PediaError, Result, json_bool};

const MODERATION_MODEL: &str = "omni-moderation-latest";
const PROVIDER: &str = "openai-moderation";

#[async_trait]
pub trait Moderator: Send + Sync {
    async fn moderate(&self, content: &str) -> ModerationResult;

    /// Backend name for logging
    fn name(&self) -> &str;
}

pub type SharedModerator = Arc<dyn Moderator>;

/// Pick the moderation backend. `Auto` uses OpenAI's endpoint only when the
/// configured provider is OpenAI.
pub fn create_moderator(config: &Config, provider: SharedProvider) -> Result<SharedModerator> {
    let provider_is_openai = matches!(config.llm.provider.parse(), Ok(ProviderKind::OpenAi));
    let use_openai = match config.moderation.backend {
        ModerationBackend::OpenAi => true,
        ModerationBackend::Llm => false,
        ModerationBackend::Auto => provider_is_openai,
    };

    if use_openai {
        Ok(Arc::new(OpenAiModerator::new(&config.llm)?))
    } else {
        Ok(Arc::new(LlmModerator::new(provider)))
    }
}

// =============================================================================
// OpenAI moderation endpoint
// =============================================================================

pub struct OpenAiModerator {
    api_key: SecretString,
    api_base: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiModerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiModerator")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationVerdict>,
}

#[derive(Deserialize)]
struct ModerationVerdict {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

impl OpenAiModerator {
    /// Reuses the LLM key and base when the provider is OpenAI; otherwise
    /// only OPENAI_API_KEY and the public endpoint apply.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (api_key, api_base) = if matches!(config.provider.parse(), Ok(ProviderKind::OpenAi)) {
            (
                resolve_openai_key(config)?,
                config
                    .api_base
                    .clone()
                    .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            )
        } else {
            let env_only = LlmConfig {
                api_key: None,
                ..config.clone()
            };
            (resolve_openai_key(&env_only)?, OPENAI_API_BASE.to_string())
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PediaError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base,
            retry: RetryPolicy::new(config.max_retries),
            client,
        })
    }

    async fn send_once(&self, content: &str) -> Result<ModerationResponse> {
        let url = format!("{}/moderations", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&ModerationRequest {
                model: MODERATION_MODEL,
                input: content,
            })
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Moderation API error ({}): {}", status, text),
                PROVIDER,
            )
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER).into())
    }

    fn verdict(response: ModerationResponse) -> ModerationResult {
        let Some(verdict) = response.results.into_iter().next() else {
            return ModerationResult::unavailable("moderation returned no results");
        };

        let mut flagged: Vec<String> = verdict
            .categories
            .into_iter()
            .filter_map(|(name, hit)| hit.then_some(name))
            .collect();
        if verdict.flagged && flagged.is_empty() {
            flagged.push("unspecified".to_string());
        }
        ModerationResult::from_flags(flagged)
    }
}

#[async_trait]
impl Moderator for OpenAiModerator {
    async fn moderate(&self, content: &str) -> ModerationResult {
        match with_retry(&self.retry, PROVIDER, || self.send_once(content)).await {
            Ok(response) => {
                let result = Self::verdict(response);
                debug!(appropriate = result.appropriate, "Moderation complete");
                result
            }
            Err(e) => {
                warn!("Moderation request failed, blocking content: {}", e);
                ModerationResult::unavailable(format!("moderation unavailable: {}", e))
            }
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// =============================================================================
// LLM-backed classifier
// =============================================================================

pub struct LlmModerator {
    provider: SharedProvider,
}

impl LlmModerator {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    fn verdict(value: &Value) -> ModerationResult {
        let mut flagged: Vec<String> = value
            .get("categories")
            .and_then(Value::as_object)
            .map(|categories| {
                categories
                    .iter()
                    .filter(|(_, hit)| hit.as_bool().unwrap_or(false))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();

        if json_bool(value, "flagged", false) && flagged.is_empty() {
            flagged.push("unspecified".to_string());
        }
        ModerationResult::from_flags(flagged)
    }
}

#[async_trait]
impl Moderator for LlmModerator {
    async fn moderate(&self, content: &str) -> ModerationResult {
        match generate_json(self.provider.as_ref(), prompts::moderation(content)).await {
            Ok((value, _)) => {
                let result = Self::verdict(&value);
                debug!(appropriate = result.appropriate, "Moderation complete");
                result
            }
            Err(e) => {
                warn!("Moderation failed, blocking content: {}", e);
                ModerationResult::unavailable(format!("moderation unavailable: {}", e))
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CallKind;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::types::ErrorCategory;

    #[tokio::test]
    async fn test_llm_moderator_lists_flagged_categories() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::Moderation,
            r#"{"flagged": true, "categories": {"hate": false, "violence": true, "illicit": true}}"#,
        ));
        let result = LlmModerator::new(provider).moderate("text").await;

        assert!(!result.appropriate);
        assert_eq!(result.flagged_categories, vec!["illicit", "violence"]);
        assert_eq!(result.reason.as_deref(), Some("illicit, violence"));
    }

    #[tokio::test]
    async fn test_llm_moderator_clean_content() {
        let provider = Arc::new(ScriptedProvider::new().respond(
            CallKind::Moderation,
            r#"{"flagged": false, "categories": {"hate": false}}"#,
        ));
        let result = LlmModerator::new(provider).moderate("text").await;
        assert!(result.appropriate);
        assert!(result.reason.is_none());
    }

    #[tokio::test]
    async fn test_llm_moderator_fails_closed() {
        let provider =
            Arc::new(ScriptedProvider::new().fail(CallKind::Moderation, ErrorCategory::Network));
        let result = LlmModerator::new(provider).moderate("text").await;
        assert!(!result.appropriate);
        assert!(result.flagged_categories.is_empty());
    }

    #[test]
    fn test_openai_verdict_flag_without_category() {
        let response: ModerationResponse =
            serde_json::from_str(r#"{"results": [{"flagged": true, "categories": {"hate": false}}]}"#)
                .unwrap();
        let result = OpenAiModerator::verdict(response);
        assert!(!result.appropriate);
        assert_eq!(result.flagged_categories, vec!["unspecified"]);

        let empty: ModerationResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!OpenAiModerator::verdict(empty).appropriate);
    }

    #[test]
    fn test_auto_backend_uses_llm_for_other_providers() {
        let mut config = Config::default();
        config.llm.provider = "ollama".to_string();
        let moderator = create_moderator(&config, Arc::new(ScriptedProvider::new())).unwrap();
        assert_eq!(moderator.name(), "llm");

        config.moderation.backend = ModerationBackend::Llm;
        config.llm.provider = "openai".to_string();
        let moderator = create_moderator(&config, Arc::new(ScriptedProvider::new())).unwrap();
        assert_eq!(moderator.name(), "llm");
    }

    #[test]
    fn test_openai_moderator_uses_configured_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            api_base: Some("http://localhost:9999/v1".to_string()),
            ..Default::default()
        };
        let moderator = OpenAiModerator::new(&config).unwrap();
        assert_eq!(moderator.api_base, "http://localhost:9999/v1");
        assert!(!format!("{:?}", moderator).contains("sk-test"));
    }
}
