//! Perplexity API Provider
//!
//! Retrieval-variant provider: the model searches the web while answering
//! and returns citation URLs alongside free text. Sampling parameters are
//! fixed; only the temperature follows the call kind.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    CompletionRequest, LlmProvider, LlmResponse, ResponseMetadata, ResponseTiming, RetryPolicy,
    TokenUsage, model_or, with_retry,
};
use crate::config::LlmConfig;
use crate::constants::retrieval;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, PediaError, Result};

const DEFAULT_API_BASE: &str = "https://api.perplexity.ai";
const DEFAULT_MODEL: &str = "sonar";
const PROVIDER: &str = "perplexity";

pub struct PerplexityProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    max_tokens: usize,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl std::fmt::Debug for PerplexityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl PerplexityProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("PERPLEXITY_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PediaError::Config(
                    "Perplexity API key not found. Set PERPLEXITY_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PediaError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: model_or(config, DEFAULT_MODEL),
            max_tokens: config.max_tokens,
            retry: RetryPolicy::new(config.max_retries),
            client,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> SearchChatRequest {
        SearchChatRequest {
            model: self.model.clone(),
            messages: vec![
                SearchMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                SearchMessage {
                    role: "user",
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature(),
            max_tokens: self.max_tokens,
            top_p: retrieval::TOP_P,
            frequency_penalty: retrieval::FREQUENCY_PENALTY,
            search_recency_filter: retrieval::RECENCY_FILTER,
            return_images: false,
            return_related_questions: false,
            stream: false,
        }
    }

    async fn send_once(&self, body: &SearchChatRequest) -> Result<SearchChatResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Perplexity API error ({}): {}", status, text),
                PROVIDER,
            )
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER).into())
    }
}

impl SearchChatResponse {
    /// Citation URLs; newer responses carry them only inside `search_results`
    fn citation_urls(&self) -> Vec<String> {
        if !self.citations.is_empty() {
            return self.citations.clone();
        }
        self.search_results.iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        info!(
            kind = %request.kind,
            "Generating with Perplexity (model: {}, temperature: {})",
            self.model,
            request.temperature()
        );

        let start_time = Instant::now();
        let body = self.build_request(request);

        let response_body = with_retry(&self.retry, PROVIDER, || self.send_once(&body)).await?;
        let elapsed = start_time.elapsed();

        let citations = response_body.citation_urls();
        let usage = response_body
            .usage
            .as_ref()
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let text = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in Perplexity response",
                    PROVIDER,
                )
            })?;

        debug!(
            chars = text.len(),
            citations = citations.len(),
            "Received response from Perplexity"
        );

        Ok(LlmResponse {
            text,
            citations,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// Perplexity has no cheap listing endpoint; a reachable host answering
    /// anything other than an auth failure counts as available.
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.api_base)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;

        match response {
            Ok(resp) if matches!(resp.status().as_u16(), 401 | 403) => {
                warn!("Perplexity API rejected credentials: {}", resp.status());
                Ok(false)
            }
            Ok(_) => {
                info!("Perplexity API is reachable");
                Ok(true)
            }
            Err(e) => {
                warn!("Perplexity API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct SearchChatRequest {
    model: String,
    messages: Vec<SearchMessage>,
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    frequency_penalty: f32,
    search_recency_filter: &'static str,
    return_images: bool,
    return_related_questions: bool,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SearchMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SearchChatResponse {
    choices: Vec<SearchChoice>,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
    usage: Option<SearchUsage>,
}

#[derive(Debug, Deserialize)]
struct SearchChoice {
    message: SearchResponseMessage,
}

#[derive(Debug, Deserialize)]
struct SearchResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
