//! Sliding-window rate limiter.
//!
//! Implements [`osint_core::rate_limit::RateLimiter`] with a FIFO deque of
//! admission timestamps per platform, guarded by a single mutex. Starvation
//! cannot occur: a waiter always re-checks the window after the oldest
//! admission ages out, and the mutex serializes checks in arrival order.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use osint_core::error::CoreError;
use osint_core::rate_limit::{RateLimitPolicy, RateLimiter};
use tokio::time::sleep;

/// A sliding-window rate limiter keyed by platform.
///
/// One instance is typically shared by a single adapter (per the
/// "RateLimiter per adapter" ownership rule); a `HashMap` key lets a single
/// instance serve multiple platforms when that's more convenient for a
/// caller, without changing the per-platform admission semantics.
#[derive(Debug, Default)]
pub struct SlidingWindowRateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowRateLimiter {
    /// Build an empty rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self { windows: Mutex::new(HashMap::new()) }
    }

    /// Admit under `policy` for `key`, blocking until a slot is free.
    ///
    /// Sliding-window algorithm:
    /// 1. Drop entries older than `now - per_seconds`.
    /// 2. If fewer than `policy.requests` remain, admit immediately.
    /// 3. Otherwise sleep until the oldest entry ages out and retry from 1.
    pub async fn acquire_for(&self, key: &str, policy: RateLimitPolicy) {
        loop {
            let wait = {
                #[allow(clippy::unwrap_used)]
                let mut windows = self.windows.lock().unwrap();
                let entries = windows.entry(key.to_string()).or_default();

                let window = Duration::from_secs_f64(policy.per_seconds.max(0.0));
                let now = Instant::now();
                entries.retain(|t| now.duration_since(*t) < window);

                if entries.len() < policy.requests as usize {
                    entries.push(now);
                    None
                } else {
                    let oldest = entries[0];
                    Some(window.saturating_sub(now.duration_since(oldest)))
                }
            };

            match wait {
                None => return,
                Some(delay) => sleep(delay).await,
            }
        }
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    async fn acquire(&self, policy: RateLimitPolicy) -> Result<(), CoreError> {
        self.acquire_for("default", policy).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn admits_immediately_under_the_limit() {
        let limiter = SlidingWindowRateLimiter::new();
        let policy = RateLimitPolicy::new(5, 1.0);

        let start = Instant::now();
        limiter.acquire_for("twitter", policy).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn blocks_once_the_window_is_full() {
        let limiter = SlidingWindowRateLimiter::new();
        let policy = RateLimitPolicy::new(2, 1.0);

        let start = Instant::now();
        limiter.acquire_for("reddit", policy).await;
        limiter.acquire_for("reddit", policy).await;
        limiter.acquire_for("reddit", policy).await;
        assert!(start.elapsed() >= Duration::from_millis(950));
    }

    #[tokio::test]
    async fn platforms_are_independent() {
        let limiter = SlidingWindowRateLimiter::new();
        let policy = RateLimitPolicy::new(1, 1.0);

        limiter.acquire_for("a", policy).await;
        let start = Instant::now();
        limiter.acquire_for("b", policy).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
