//! Authenticated session lookup
//!
//! Generation must be attributable, so the pipeline asks a `SessionProvider`
//! for the current author before doing any work.

use std::sync::Arc;

use crate::config::AuthorConfig;
use crate::types::{Author, PediaError, Result};

pub trait SessionProvider: Send + Sync {
    /// Current author, or `None` when nobody is signed in
    fn current_author(&self) -> Option<Author>;

    /// Current author, or `PediaError::NotAuthenticated`
    fn require_author(&self) -> Result<Author> {
        self.current_author().ok_or(PediaError::NotAuthenticated)
    }
}

pub type SharedSession = Arc<dyn SessionProvider>;

/// Fixed identity, typically the `[author]` config section
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    author: Option<Author>,
}

impl StaticSession {
    pub fn new(author: Author) -> Self {
        Self {
            author: Some(author),
        }
    }

    pub fn anonymous() -> Self {
        Self { author: None }
    }

    pub fn from_config(config: &AuthorConfig) -> Self {
        Self {
            author: config.to_author(),
        }
    }
}

impl SessionProvider for StaticSession {
    fn current_author(&self) -> Option<Author> {
        self.author.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_is_not_authenticated() {
        let session = StaticSession::anonymous();
        assert!(session.current_author().is_none());
        assert!(matches!(
            session.require_author(),
            Err(PediaError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_configured_author() {
        let config = AuthorConfig {
            id: Some("editor-1".to_string()),
            name: Some("Editor".to_string()),
        };
        let author = StaticSession::from_config(&config).require_author().unwrap();
        assert_eq!(author.id, "editor-1");
    }
}
