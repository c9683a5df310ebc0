//! Retry with exponential backoff for remote store calls.
//!
//! The operation always runs once. Each retryable failure is followed by a
//! sleep of `initial_delay_ms × 2^n` (capped at [`MAX_DELAY_MS`]) before retry
//! `n`, for at most `attempts` retries. The last error is returned when the
//! retries run out.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound on a single backoff sleep (ms).
pub const MAX_DELAY_MS: u64 = 60_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first failure. Zero means a single try.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Sleep before the first retry; doubles for each one after that.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

impl RetryPolicy {
    pub fn new(attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            attempts,
            initial_delay_ms,
        }
    }

    /// Run once, never retry.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Backoff before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let ms = self.initial_delay_ms.saturating_mul(factor).min(MAX_DELAY_MS);
        Duration::from_millis(ms)
    }

    /// Run `op`, retrying on every error.
    pub async fn run<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(op, |_| true).await
    }

    /// Run `op`, retrying only errors for which `should_retry` returns true.
    pub async fn run_if<F, Fut, T, E, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.attempts && should_retry(&e) => {
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        attempt = retry + 1,
                        of = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "operation failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(default_attempts(), default_initial_delay_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::new(5, 1_000);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(10), Duration::from_millis(MAX_DELAY_MS));
        assert_eq!(policy.delay_for(200), Duration::from_millis(MAX_DELAY_MS));
    }

    #[test]
    fn zero_delay_stays_zero() {
        let policy = RetryPolicy::new(3, 0);
        assert_eq!(policy.delay_for(2), Duration::ZERO);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 0);
        let result: Result<u32, String> = policy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(format!("failure {n}"))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, 0);
        let result: Result<(), String> = policy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {n}"))
            })
            .await;
        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_means_single_try() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = RetryPolicy::none()
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn predicate_stops_retrying_permanent_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, 0);
        let result: Result<(), &str> = policy
            .run_if(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("conflict")
                },
                |e| *e != "conflict",
            )
            .await;
        assert_eq!(result, Err("conflict"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_retries() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::new(2, 100);
        let _: Result<(), &str> = policy.run(|| async { Err("down") }).await;
        // 100ms + 200ms
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
