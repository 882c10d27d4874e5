// ─── Retry Policy ───
// Exponential backoff shared by every network call in the launcher.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `base_delay_ms * 2^n`.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based): 2s, 4s, 8s with the default base.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Transport failure or a status worth trying again.
    Retryable(String),
    /// Surfaces immediately without consuming the retry budget.
    Fatal(LauncherError),
}

/// 4xx responses are the caller's fault and never get better, except throttling.
pub fn is_retryable_status(status: StatusCode) -> bool {
    if status.is_success() {
        return false;
    }
    status == StatusCode::TOO_MANY_REQUESTS || !status.is_client_error()
}

/// Run `op` until it succeeds, fails fatally, or the retry budget runs out.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> LauncherResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Retryable(reason)) => {
                if attempt >= policy.max_retries {
                    return Err(LauncherError::TransientNetwork {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        reason,
                    });
                }
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    "Request to {} failed ({}), retry {}/{} in {:?}",
                    url, reason, attempt, policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::new(3, 1)
    }

    #[test]
    fn default_delays_double_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn throttling_is_the_only_retryable_client_error() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[tokio::test]
    async fn three_failures_then_success_returns_value() {
        let calls = AtomicU32::new(0);
        let result = with_retries(&fast(), "http://test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(AttemptError::Retryable("HTTP 500".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn four_failures_exhaust_budget() {
        let calls = AtomicU32::new(0);
        let err = with_retries(&fast(), "http://test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(AttemptError::Retryable("connection reset".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match err {
            LauncherError::TransientNetwork { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fatal_errors_skip_retries() {
        let calls = AtomicU32::new(0);
        let err = with_retries(&fast(), "http://test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(AttemptError::Fatal(LauncherError::HttpStatus {
                    url: "http://test".into(),
                    status: 404,
                }))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.is_http_not_found());
    }
}
