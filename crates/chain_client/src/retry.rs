use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::errors::{ChainClientError, Result};

/// Per-attempt timeout plus bounded retries with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry; doubled for every retry after it.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            retries: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, retries: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            retries,
            backoff,
        }
    }

    /// A single attempt, still bounded by `timeout`.
    pub fn no_retry(timeout: Duration) -> Self {
        Self::new(timeout, 0, Duration::ZERO)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(retry.min(16)))
    }

    /// Run `op` until it succeeds, fails permanently, or the retries run out.
    /// `NotFound` and decode failures are returned immediately.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0u32;
        loop {
            let outcome = match timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ChainClientError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() || retry >= self.retries => return Err(err),
                Err(err) => {
                    let delay = self.delay_for(retry);
                    warn!(
                        request = what,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "chain request failed, retrying"
                    );
                    sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(50), retries, Duration::from_millis(1))
    }

    fn unavailable() -> ChainClientError {
        ChainClientError::Status {
            path: "/test".to_string(),
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(3)
            .run("flaky", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_configured_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(2)
            .run("down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(unavailable())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainClientError::Status { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn not_found_is_never_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(5)
            .run("missing", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChainClientError::NotFound("account".to_string()))
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 1, Duration::from_millis(1));
        let err = policy
            .run("slow", || async {
                sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainClientError::Timeout(_)));
    }
}
