//! Exponential backoff policy and the retry combinator built on it
//!
//! The policy is a pure mapping from attempt number to delay so it can be
//! tested without I/O; [`retry`] drives any fallible async operation with it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt count to delay mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor for transient failures
    pub multiplier: f64,
    /// Growth factor when the service rejected the call with 429
    pub rate_limit_multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Total attempts including the first one
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            rate_limit_multiplier: 3.0,
            max_delay: Duration::from_secs(8),
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_multipliers(mut self, multiplier: f64, rate_limit_multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self.rate_limit_multiplier = rate_limit_multiplier.max(1.0);
        self
    }

    /// Delay after the given failed attempt (1-based): `base * m^(attempt-1)`, capped
    pub fn delay_for(&self, attempt: u32, rate_limited: bool) -> Duration {
        let factor = if rate_limited {
            self.rate_limit_multiplier
        } else {
            self.multiplier
        };
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }

    /// Delay to use after `error` ended the given attempt
    pub fn delay_after(&self, attempt: u32, error: &Error) -> Duration {
        self.delay_for(attempt, error.is_rate_limited())
    }

    /// Sum of all delays a fully failing operation waits through
    pub fn worst_case_wait(&self, rate_limited: bool) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for(attempt, rate_limited))
            .sum()
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are exhausted. The closure receives the 1-based
/// attempt number.
pub async fn retry<T, F, Fut>(policy: &BackoffPolicy, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{operation} succeeded on attempt {attempt}/{max_attempts}");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let backoff = policy.delay_after(attempt, &e);
                warn!("{operation} failed: {e}");
                warn!("Retrying in {backoff:?} (attempt {attempt}/{max_attempts})");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!("{operation} failed after {max_attempts} attempts: {e}");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(60), 4)
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = policy();
        assert_eq!(policy.delay_for(1, false), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, false), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3, false), Duration::from_secs(8));
    }

    #[test]
    fn test_rate_limit_backoff_is_steeper() {
        let policy = policy();
        assert_eq!(policy.delay_for(2, true), Duration::from_secs(6));
        assert_eq!(policy.delay_for(3, true), Duration::from_secs(18));
        assert!(policy.delay_for(3, true) > policy.delay_for(3, false));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(8), 10);
        assert_eq!(policy.delay_for(9, false), Duration::from_secs(8));
        assert_eq!(policy.delay_for(u32::MAX, true), Duration::from_secs(8));
    }

    #[test]
    fn test_worst_case_wait() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(8), 3);
        assert_eq!(policy.worst_case_wait(false), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = retry(&policy(), "probe", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::transport("connection reset"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry(&policy(), "probe", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::http_status(401, "bad key")) }
        })
        .await;

        assert!(matches!(result, Err(Error::HttpStatus { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<()> = retry(&policy(), "probe", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(Error::http_status(429, format!("attempt {attempt}"))) }
        })
        .await;

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 2 + 6 + 18
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(26) && elapsed < Duration::from_secs(27));
    }
}
