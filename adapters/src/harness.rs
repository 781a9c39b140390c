//! Shared plumbing every platform adapter is built on: a per-adapter
//! rate-limited, retried HTTP call, tolerant timestamp parsing, and small
//! JSON field helpers that degrade to `None` instead of erroring on shape
//! mismatch.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use osint_core::error::CoreError;
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::{Response, Transport, DEFAULT_TIMEOUT};
use osint_tools::{RetryPolicy, SlidingWindowRateLimiter};
use serde_json::Value;

/// The rate limiter and retry policy a single adapter owns.
///
/// One instance per adapter, never shared across platforms: `acquire_for`
/// is always called with the same key, so the window is effectively
/// per-platform as long as each platform gets its own `AdapterGuard`.
pub struct AdapterGuard {
    rate_limiter: SlidingWindowRateLimiter,
    retry: RetryPolicy,
    rate_limit_policy: RateLimitPolicy,
}

const WINDOW_KEY: &str = "default";

impl AdapterGuard {
    /// Build a guard with the default retry policy (4 attempts, 250ms base, 30s cap, 20% jitter).
    #[must_use]
    pub fn new(rate_limit_policy: RateLimitPolicy) -> Self {
        Self { rate_limiter: SlidingWindowRateLimiter::new(), retry: RetryPolicy::builder().build(), rate_limit_policy }
    }

    /// Build a guard with a caller-supplied retry policy.
    #[must_use]
    pub fn with_retry(rate_limit_policy: RateLimitPolicy, retry: RetryPolicy) -> Self {
        Self { rate_limiter: SlidingWindowRateLimiter::new(), retry, rate_limit_policy }
    }

    /// Gated GET: acquire a rate-limit slot, then retry the request per the
    /// owned [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] once retries are exhausted.
    pub async fn get<T: Transport>(&self, transport: &T, url: &str, headers: &HashMap<String, String>) -> Result<Response, CoreError> {
        self.retry
            .execute(|| async {
                self.rate_limiter.acquire_for(WINDOW_KEY, self.rate_limit_policy).await;
                transport.get(url, headers, DEFAULT_TIMEOUT).await
            })
            .await
    }

    /// Gated `application/x-www-form-urlencoded` POST, same admission rules as [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] once retries are exhausted.
    pub async fn post_form<T: Transport>(
        &self,
        transport: &T,
        url: &str,
        form: &HashMap<String, String>,
        headers: &HashMap<String, String>,
    ) -> Result<Response, CoreError> {
        self.retry
            .execute(|| async {
                self.rate_limiter.acquire_for(WINDOW_KEY, self.rate_limit_policy).await;
                transport.post_form(url, form, headers, DEFAULT_TIMEOUT).await
            })
            .await
    }
}

/// What an adapter should do next after looking at a response's HTTP status,
/// before it even tries to parse the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// 2xx: proceed to parse the body.
    Proceed,
    /// 404: the caller should return `Ok(None)`, never an error.
    NotFound,
    /// `>= 400` other than 404: the caller should return a [`CoreError::SourceError`].
    Error,
}

/// Classify a response's status per the common HTTP-status mapping every
/// adapter uses.
#[must_use]
pub fn classify_status(resp: &Response) -> StatusOutcome {
    if resp.is_not_found() {
        StatusOutcome::NotFound
    } else if resp.status >= 400 {
        StatusOutcome::Error
    } else {
        StatusOutcome::Proceed
    }
}

/// Parse a source timestamp leniently; an unparseable value yields `None`,
/// never an error.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%a %b %d %H:%M:%S %z %Y"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    raw.parse::<i64>().and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Borrow a string field from a JSON object, `None` on any shape mismatch.
#[must_use]
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Borrow an unsigned integer field from a JSON object, `None` on any shape mismatch.
#[must_use]
pub fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

/// Borrow a boolean field from a JSON object, `None` on any shape mismatch.
#[must_use]
pub fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        assert!(parse_timestamp("2024-01-15T10:00:00Z").is_some());
    }

    #[test]
    fn parses_unix_seconds() {
        assert!(parse_timestamp("1700000000").is_some());
    }

    #[test]
    fn unparseable_timestamp_is_none_not_an_error() {
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn status_classification() {
        let ok = Response { status: 200, headers: HashMap::new(), text: String::new() };
        let missing = Response { status: 404, headers: HashMap::new(), text: String::new() };
        let broken = Response { status: 500, headers: HashMap::new(), text: String::new() };
        assert_eq!(classify_status(&ok), StatusOutcome::Proceed);
        assert_eq!(classify_status(&missing), StatusOutcome::NotFound);
        assert_eq!(classify_status(&broken), StatusOutcome::Error);
    }
}
