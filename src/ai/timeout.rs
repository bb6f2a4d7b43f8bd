//! Command Timeout
//!
//! The generation core has no timeout of its own; a hung provider call blocks
//! its attempt. Callers needing bounded latency wrap the whole operation here.
//!
//! ## Usage
//!
//! ```ignore
//! let articles = with_timeout(
//!     Duration::from_secs(config.generation.timeout_secs),
//!     generator.generate_articles(&request, 5),
//!     "generate articles",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{PediaError, Result};

/// Run `future`, failing with `PediaError::Timeout` once `timeout` elapses
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(PediaError::timeout(operation_name, timeout)),
    }
}

/// Apply `with_timeout` only when a bound is configured (0 = unbounded)
pub async fn with_optional_timeout<T, F>(secs: u64, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if secs == 0 {
        future.await
    } else {
        with_timeout(Duration::from_secs(secs), future, operation_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, PediaError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, PediaError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), PediaError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_zero_means_unbounded() {
        let result = with_optional_timeout(
            0,
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, PediaError>("done")
            },
            "unbounded",
        )
        .await;
        assert_eq!(result.unwrap(), "done");
    }
}
