//! Bounded exponential backoff with jitter.
//!
//! # Example
//!
//! ```rust
//! use osint_tools::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(4)
//!     .base_delay(Duration::from_millis(200))
//!     .max_delay(Duration::from_secs(10))
//!     .jitter(0.1)
//!     .build();
//!
//! let result = policy.execute(|| async { Ok::<_, String>(42) }).await?;
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// Bounded exponential backoff configuration.
///
/// Delay for attempt `k >= 1` is `min(max_delay, base_delay * 2^(k-1)) * (1 + U[-jitter, jitter])`.
/// Any error triggers a retry until `max_attempts` is exhausted; the final
/// error is propagated unchanged. Retries are wrapped around the
/// rate-limited acquire: each attempt consumes a rate-limit slot.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on the computed delay.
    pub max_delay: Duration,
    /// Jitter fraction in `[0, 1]`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Start building a policy from the defaults (4 attempts, 250ms base,
    /// 30s cap, 20% jitter).
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder { policy: Self::default() }
    }

    /// Compute the base (un-jittered) delay for attempt `k` (`k >= 1`).
    #[must_use]
    pub fn base_delay_for_attempt(&self, k: u32) -> Duration {
        let exponent = k.saturating_sub(1);
        let multiplier = 2f64.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let scaled_ms = self.base_delay.as_millis() as f64 * multiplier;
        let capped_ms = scaled_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Compute the jittered delay for attempt `k`, sampling `U[-jitter, jitter]`.
    #[must_use]
    pub fn delay_for_attempt(&self, k: u32) -> Duration {
        let base = self.base_delay_for_attempt(k);
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        let jittered_ms = (base.as_millis() as f64 * factor.max(0.0)) as u64;
        Duration::from_millis(jittered_ms)
    }

    /// Run `operation`, retrying on every `Err` until `max_attempts` is
    /// exhausted. The error from the final attempt is propagated unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever `operation` returned on its last attempt.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    sleep(self.delay_for_attempt(attempt)).await;
                    attempt += 1;
                },
            }
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    /// Set the base delay.
    #[must_use]
    pub const fn base_delay(mut self, base_delay: Duration) -> Self {
        self.policy.base_delay = base_delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub const fn max_delay(mut self, max_delay: Duration) -> Self {
        self.policy.max_delay = max_delay;
        self
    }

    /// Set the jitter fraction.
    #[must_use]
    pub const fn jitter(mut self, jitter: f64) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub const fn build(self) -> RetryPolicy {
        self.policy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn base_delay_doubles_per_attempt() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(10))
            .build();

        assert_eq!(policy.base_delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn base_delay_is_capped() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(300))
            .build();

        assert_eq!(policy.base_delay_for_attempt(5), Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_millis(1000))
            .max_delay(Duration::from_secs(10))
            .jitter(0.2)
            .build();

        for _ in 0..50 {
            let delay = policy.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let policy = RetryPolicy::builder().build();
        let result = policy.execute(|| async { Ok::<_, String>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .base_delay(Duration::from_millis(1))
            .jitter(0.0)
            .build();
        let attempts = AtomicU32::new(0);

        let result = policy
            .execute(|| async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 { Err("not yet") } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_final_error_unchanged() {
        let policy = RetryPolicy::builder()
            .max_attempts(3)
            .base_delay(Duration::from_millis(1))
            .jitter(0.0)
            .build();

        let result = policy.execute(|| async { Err::<i32, _>("always fails") }).await;
        assert_eq!(result, Err("always fails"));
    }
}
