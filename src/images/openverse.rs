//! Openverse image search
//!
//! Searches openly licensed images. With client credentials configured the
//! client exchanges them for a bearer token and keeps it until shortly
//! before expiry; without credentials it searches anonymously at the lower
//! anonymous rate limit.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ImageSearch;
use super::credential::{AccessToken, ClientCredentials};
use crate::config::ImageConfig;
use crate::constants::network;
use crate::types::{ArticleImage, PediaError, Result};

pub struct OpenverseClient {
    api_base: String,
    credentials: Option<ClientCredentials>,
    token: Mutex<Option<AccessToken>>,
    client: reqwest::Client,
}

impl OpenverseClient {
    /// Credentials come from `images.client_id` plus OPENVERSE_CLIENT_SECRET
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let credentials = config.client_id.as_ref().and_then(|client_id| {
            match std::env::var("OPENVERSE_CLIENT_SECRET") {
                Ok(secret) if !secret.trim().is_empty() => Some(ClientCredentials {
                    client_id: client_id.clone(),
                    client_secret: SecretString::from(secret),
                }),
                _ => {
                    warn!("images.client_id set but OPENVERSE_CLIENT_SECRET is missing; searching anonymously");
                    None
                }
            }
        });
        Self::with_credentials(&config.api_base, credentials)
    }

    pub fn with_credentials(api_base: &str, credentials: Option<ClientCredentials>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network::IMAGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| PediaError::ImageSearch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
            token: Mutex::new(None),
            client,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Current bearer token, fetching a new one when missing or near expiry
    async fn bearer(&self) -> Result<Option<String>> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };

        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref()
            && token.is_fresh(Utc::now(), network::TOKEN_REFRESH_MARGIN_SECS)
        {
            return Ok(Some(token.expose().to_string()));
        }

        let token = self.fetch_token(credentials).await?;
        let secret = token.expose().to_string();
        *slot = Some(token);
        Ok(Some(secret))
    }

    async fn fetch_token(&self, credentials: &ClientCredentials) -> Result<AccessToken> {
        debug!("Requesting Openverse access token");
        let url = format!("{}/auth_tokens/token/", self.api_base);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| PediaError::ImageSearch(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PediaError::ImageSearch(format!(
                "Token request rejected: {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PediaError::ImageSearch(format!("Invalid token response: {}", e)))?;

        let token = AccessToken::issued(body.access_token, Utc::now(), body.expires_in);
        info!(expires_at = %token.expires_at(), "Openverse access token refreshed");
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl ImageSearch for OpenverseClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ArticleImage>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/images/", self.api_base);
        let page_size = limit.to_string();
        let mut request = self
            .client
            .get(&url)
            .query(&[("q", query.trim()), ("page_size", page_size.as_str())]);

        if let Some(token) = self.bearer().await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PediaError::ImageSearch(format!("Image search failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 401 {
            self.invalidate_token().await;
        }
        if !status.is_success() {
            return Err(PediaError::ImageSearch(format!(
                "Image search returned {}",
                status
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PediaError::ImageSearch(format!("Invalid search response: {}", e)))?;

        Ok(body.into_images(limit))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    license_version: Option<String>,
    #[serde(default)]
    foreign_landing_url: Option<String>,
}

impl SearchResponse {
    fn into_images(self, limit: usize) -> Vec<ArticleImage> {
        self.results
            .into_iter()
            .filter_map(|hit| {
                let url = hit.url.filter(|u| !u.trim().is_empty())?;
                let license = hit.license.map(|l| match &hit.license_version {
                    Some(version) => format!("CC {} {}", l.to_uppercase(), version),
                    None => l.to_uppercase(),
                });
                Some(ArticleImage {
                    url,
                    title: hit.title.unwrap_or_default(),
                    creator: hit.creator,
                    license,
                    source_url: hit.foreign_landing_url,
                })
            })
            .take(limit)
            .collect()
    }
}
