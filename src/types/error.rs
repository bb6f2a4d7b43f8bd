//! Unified Error Type System
//!
//! One error type (`PediaError`) for the whole crate plus structured provider
//! errors that carry a category for retry decisions.
//!
//! ## Error Categories
//!
//! - **RateLimit**: API rate limiting (wait and retry)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Transient**: Server-side 5xx (retry with backoff)
//! - **Auth**: Authentication failures (fail fast)
//! - **BadRequest**: Invalid request (fail fast)
//! - **ParseError**: Malformed model output (handled by the caller)
//!
//! Gate call sites convert provider errors into their soft-fail decision;
//! only contract violations (no author, invalid request) reach the caller.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories used for retry routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    RateLimit,
    Auth,
    Network,
    Transient,
    BadRequest,
    ParseError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::Auth => "AUTH",
            Self::Network => "NETWORK",
            Self::Transient => "TRANSIENT",
            Self::BadRequest => "BAD_REQUEST",
            Self::ParseError => "PARSE_ERROR",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

impl ErrorCategory {
    /// Whether the same request may succeed if sent again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Structured provider error with category and retry hint
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "[{}:{}] {}", provider, self.category, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::new(category, message)
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport failures onto error categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code returned by a provider
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 404 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            500..=599 => LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(5)),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a reqwest transport error (no HTTP status available)
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_timeout() || err.is_connect() || err.is_request() {
            LlmError::with_provider(ErrorCategory::Network, message, provider)
        } else if err.is_decode() || err.is_body() {
            LlmError::with_provider(ErrorCategory::ParseError, message, provider)
        } else if let Some(status) = err.status() {
            Self::classify_http_status(status.as_u16(), &message, provider)
        } else {
            LlmError::with_provider(ErrorCategory::Unknown, message, provider)
        }
    }

    /// Category of an application error, for retry decisions
    pub fn category_of(err: &PediaError) -> ErrorCategory {
        match err {
            PediaError::Llm(e) => e.category,
            PediaError::Io(_) | PediaError::Timeout { .. } => ErrorCategory::Network,
            PediaError::Json(_) => ErrorCategory::ParseError,
            PediaError::Config(_) | PediaError::Validation(_) => ErrorCategory::BadRequest,
            PediaError::NotAuthenticated => ErrorCategory::Auth,
            _ => ErrorCategory::Unknown,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "Validation failed for '{}': {}", field, self.message),
            None => write!(f, "Validation failed: {}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured provider error with category and retry hints
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Unstructured provider error (client construction, unexpected payloads)
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(ValidationError),

    /// Generation requires an attributable author
    #[error("No authenticated author: configure [author] before generating articles")]
    NotAuthenticated,

    #[error("Image search error: {0}")]
    ImageSearch(String),
}

impl From<LlmError> for PediaError {
    fn from(err: LlmError) -> Self {
        PediaError::Llm(err)
    }
}

impl From<ValidationError> for PediaError {
    fn from(err: ValidationError) -> Self {
        PediaError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, PediaError>;

impl PediaError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Whether the failed operation may succeed if repeated unchanged
    pub fn is_retryable(&self) -> bool {
        ErrorClassifier::category_of(self).is_retryable()
    }

    /// Provider-suggested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Llm(err) => err.retry_after,
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
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Transient.to_string(), "TRANSIENT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::ParseError.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "slow down", "openai");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);
        assert_eq!(rate_limit.retry_after, Some(Duration::from_secs(30)));

        let auth = ErrorClassifier::classify_http_status(401, "bad key", "openai");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server = ErrorClassifier::classify_http_status(503, "overloaded", "perplexity");
        assert_eq!(server.category, ErrorCategory::Transient);
        assert!(server.is_retryable());
    }

    #[test]
    fn test_category_of_application_errors() {
        let llm = PediaError::from(LlmError::new(ErrorCategory::Network, "reset"));
        assert!(llm.is_retryable());

        assert!(!PediaError::NotAuthenticated.is_retryable());
        assert!(!PediaError::Config("bad".to_string()).is_retryable());
        assert_eq!(
            ErrorClassifier::category_of(&PediaError::NotAuthenticated),
            ErrorCategory::Auth
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let bare = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(bare.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("must be positive").with_field("min_word_count");
        assert_eq!(
            err.to_string(),
            "Validation failed for 'min_word_count': must be positive"
        );
    }
}
