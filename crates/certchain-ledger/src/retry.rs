//! Retry with exponential backoff for ledger calls.
//!
//! Retries only [`LedgerError::Unavailable`]. Rejections and protocol
//! errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Maximum number of retry attempts after the initial request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
pub const DEFAULT_BASE_DELAY_MS: u64 = 200;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        )
    }
}

/// Run `f` until it succeeds, fails permanently, or retries run out.
///
/// `f` is called at most `policy.max_retries + 1` times.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    operation,
                    "ledger call failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    // Final attempt.
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
        }
    }

    fn unavailable() -> LedgerError {
        LedgerError::Unavailable {
            ledger: "test".into(),
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.delay_for(0), Duration::from_millis(200));
        assert_eq!(p.delay_for(1), Duration::from_millis(400));
        assert_eq!(p.delay_for(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn exhausts_all_attempts_on_transport_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = retry_transient(&fast(), "publish", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = retry_transient(&fast(), "publish", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = retry_transient(&fast(), "publish", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(LedgerError::Rejected {
                    ledger: "test".into(),
                    reason: "bad commitment".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(LedgerError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn none_policy_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let _: Result<(), _> = retry_transient(&RetryPolicy::none(), "resolve", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
