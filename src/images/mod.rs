//! Image Discovery
//!
//! Openly licensed images attached to generated articles. Discovery is best
//! effort: the pipeline logs failures and continues with no images.

mod credential;
mod openverse;

pub use credential::{AccessToken, ClientCredentials};
pub use openverse::OpenverseClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ImageConfig;
use crate::types::{ArticleImage, Result};

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Up to `limit` images matching `query`
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ArticleImage>>;
}

pub type SharedImageSearch = Arc<dyn ImageSearch>;

/// Image search from configuration; `None` when disabled
pub fn create_image_search(config: &ImageConfig) -> Result<Option<SharedImageSearch>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(OpenverseClient::new(config)?)))
}
