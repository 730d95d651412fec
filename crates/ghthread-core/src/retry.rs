// SPDX-License-Identifier: Apache-2.0

//! Whole-operation retry on rate limiting.
//!
//! Only [`ThreadError::RateLimited`] is retried; the entire fetch-and-render
//! operation runs again after an exponential, jittered delay.

use std::future::Future;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::Result;
use crate::config::FetchConfig;
use crate::error::ThreadError;

/// Backoff for rate-limit retries, bounded by `rate_limit_retries`.
#[must_use]
pub fn rate_limit_backoff(config: &FetchConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_factor(2.0)
        .with_min_delay(config.retry_min_delay())
        .with_max_times(config.rate_limit_retries)
        .with_jitter()
}

/// Runs `operation`, retrying it from scratch while it fails with
/// `RateLimited`. Every other error is returned immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retryable error.
pub async fn render_with_retry<T, F, Fut>(config: &FetchConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    operation
        .retry(rate_limit_backoff(config))
        .when(ThreadError::is_rate_limited)
        .notify(|err, dur| {
            warn!(
                error = %err,
                retry_after = ?dur,
                "Rate limited, retrying"
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::document::render_thread;
    use crate::fetch::FetchOptions;
    use crate::github::mock::MockSource;
    use crate::github::{ResourceKind, ResourceRef};
    use crate::utils::utc_offset;

    fn fast_config(retries: usize) -> FetchConfig {
        FetchConfig {
            rate_limit_retries: retries,
            retry_min_delay_ms: 1,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retries_after_rate_limit() {
        let attempts = AtomicUsize::new(0);
        let result = render_with_retry(&fast_config(3), || async {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ThreadError::RateLimited {
                    message: "API rate limit exceeded".to_string(),
                })
            } else {
                Ok("document".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap(), "document");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_not_found() {
        let attempts = AtomicUsize::new(0);
        let result: Result<String> = render_with_retry(&fast_config(3), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ThreadError::NotFound {
                reference: "o/r#1".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ThreadError::NotFound { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicUsize::new(0);
        let result: Result<String> = render_with_retry(&fast_config(2), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ThreadError::RateLimited {
                message: "still limited".to_string(),
            })
        })
        .await;

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_metadata_reruns_whole_render() {
        let source = MockSource::issue(5);
        source.rate_limited_attempts.store(1, Ordering::SeqCst);
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);
        let options = FetchOptions::builder().build();

        let result = render_with_retry(&fast_config(3), || {
            render_thread(&source, &resource, &options, utc_offset())
        })
        .await;

        assert!(result.unwrap().starts_with("# Parser crashes on empty input (#5)"));
        assert_eq!(source.metadata_calls.load(Ordering::SeqCst), 2);
    }
}
