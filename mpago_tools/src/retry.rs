//! A bounded exponential-backoff wrapper for gateway calls.

use std::{future::Future, time::Duration};

use log::*;

use crate::MpagoApiError;

/// Deterministic backoff: `base_delay`, doubling (`multiplier`) per attempt, capped at `cap`.
/// No jitter; the call volume here is a handful of counter terminals, not a fleet.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(1000),
            multiplier: 2,
            cap: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` until it succeeds, fails with a non-transient error, or `max_attempts` is
    /// reached. The last error is returned as-is.
    pub async fn execute<F, Fut, T>(&self, context: &str, mut op: F) -> Result<T, MpagoApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MpagoApiError>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(v) => {
                    trace!("🔁️ {context}: attempt {attempt} succeeded");
                    return Ok(v);
                },
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "🔁️ {context}: attempt {attempt}/{} failed ({e}); retrying in {}ms",
                        self.max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * self.multiplier).min(self.cap);
                    attempt += 1;
                },
                Err(e) => {
                    warn!("🔁️ {context}: attempt {attempt}/{} failed ({e}); giving up", self.max_attempts);
                    return Err(e);
                },
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        let _ = env_logger::try_init();
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            multiplier: 2,
            cap: Duration::from_millis(4),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute("unit", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        Err(MpagoApiError::QueryError { status: 503, message: "unavailable".to_string() })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .execute("unit", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(MpagoApiError::NetworkError("connection refused".to_string())) }
            })
            .await;
        assert!(matches!(result.unwrap_err(), MpagoApiError::NetworkError(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn permanent_errors_fail_on_the_first_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .execute("unit", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(MpagoApiError::QueryError { status: 400, message: "bad request".to_string() }) }
            })
            .await;
        assert!(matches!(result.unwrap_err(), MpagoApiError::QueryError { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(MpagoApiError::QueryError { status, message: String::new() }.is_transient());
        }
        for status in [400, 401, 403, 404, 422] {
            assert!(!MpagoApiError::QueryError { status, message: String::new() }.is_transient());
        }
        assert!(MpagoApiError::NetworkError("timeout".to_string()).is_transient());
        assert!(!MpagoApiError::JsonError("eof".to_string()).is_transient());
    }
}
