//! The `RateLimiter` boundary: a per-platform sliding-window admission gate.

use crate::error::CoreError;

/// `N` requests per `W` seconds, evaluated as a sliding window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitPolicy {
    /// Maximum admissions within the window.
    pub requests: u32,
    /// Window length, in seconds.
    pub per_seconds: f64,
}

impl RateLimitPolicy {
    /// Build a policy admitting `requests` calls per `per_seconds` seconds.
    #[must_use]
    pub const fn new(requests: u32, per_seconds: f64) -> Self {
        Self { requests, per_seconds }
    }
}

/// Sliding-window admission gate, one instance per `(adapter, platform)`.
///
/// `acquire` blocks the caller until a slot is available. Admission order is
/// FIFO within a platform: a caller that started waiting first is admitted
/// first, even under contention.
pub trait RateLimiter: Send + Sync {
    /// Block until a slot under `policy` is available, then admit.
    ///
    /// Cancelling the returned future while it is suspended releases the
    /// wait without consuming a slot; cancellation never cancels an
    /// already-granted admission.
    fn acquire(&self, policy: RateLimitPolicy) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;
}
