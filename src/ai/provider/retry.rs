//! Provider retry policy
//!
//! Exponential backoff with jitter around a single provider call. Only
//! retryable categories (rate limit, network, 5xx) are repeated; auth and
//! bad-request failures surface immediately. A classified `retry_after` hint
//! raises the next delay, up to `max_delay`.

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::constants::retry;
use crate::types::{PediaError, Result};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(retry::DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            min_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECS),
        }
    }

    /// Policy that never repeats a call
    pub fn none() -> Self {
        Self::new(0)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// Backoff delay raised to the error's hint, capped at `max_delay`.
    /// `None` means the backoff is exhausted.
    fn next_delay(&self, err: &PediaError, backoff: Option<Duration>) -> Option<Duration> {
        let delay = backoff?;
        Some(match err.retry_after() {
            Some(hint) => delay.max(hint).min(self.max_delay),
            None => delay,
        })
    }
}

/// Run `op`, repeating it on retryable failures per `policy`
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    op.retry(policy.backoff())
        .when(|e: &PediaError| e.is_retryable())
        .adjust(|e: &PediaError, delay: Option<Duration>| policy.next_delay(e, delay))
        .notify(|e: &PediaError, delay: Duration| {
            warn!(
                operation = label,
                delay_ms = delay.as_millis() as u64,
                "Retrying after error: {}",
                e
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorCategory, LlmError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = with_retry(&fast(2), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(LlmError::new(ErrorCategory::Transient, "503").into())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_repeated() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry(&fast(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::new(ErrorCategory::Auth, "401").into())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_after_hint_raises_delay_within_cap() {
        let policy = RetryPolicy {
            max_retries: 3,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        };
        let server = PediaError::from(
            LlmError::new(ErrorCategory::Transient, "503").retry_after(Duration::from_secs(5)),
        );
        let limited = PediaError::from(
            LlmError::new(ErrorCategory::RateLimit, "429").retry_after(Duration::from_secs(30)),
        );
        let plain = PediaError::from(LlmError::new(ErrorCategory::Network, "reset"));
        let base = Some(Duration::from_millis(200));

        assert_eq!(policy.next_delay(&server, base), Some(Duration::from_secs(5)));
        assert_eq!(policy.next_delay(&limited, base), Some(Duration::from_secs(10)));
        assert_eq!(policy.next_delay(&plain, base), base);
        assert_eq!(policy.next_delay(&server, None), None);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry(&fast(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::new(ErrorCategory::Network, "reset").into())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
