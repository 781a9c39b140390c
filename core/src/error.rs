//! Error kinds shared across the aggregation engine.
//!
//! Mirrors the taxonomy every layer is expected to branch on: a handful of
//! coarse kinds rather than one variant per failure site, so callers write
//! `match err.kind() { ... }` once instead of threading dozens of variants
//! through every crate boundary.

use thiserror::Error;

/// Errors produced by adapters, the extraction pipeline, and the stores.
#[derive(Debug, Error)]
pub enum CoreError {
    // ─────────────────────────────── Source errors ───────────────────────────────
    /// The resource is confirmed absent at the source (e.g. HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The source returned a non-recoverable shape, or a persistent `>= 400`
    /// after retries were exhausted.
    #[error("source error ({platform}): {message}")]
    SourceError {
        /// Platform that produced the error.
        platform: String,
        /// Human-readable detail.
        message: String,
    },

    /// The source asked us to back off; surfaced only when retries are
    /// exhausted, otherwise handled internally by the retry wrapper.
    #[error("rate limited by source: {0}")]
    RateLimited(String),

    /// A transient network failure. Callers that see this directly (rather
    /// than via the retry wrapper) have exhausted their retry budget.
    #[error("transient transport failure: {0}")]
    Transient(String),

    // ─────────────────────────────── Configuration ───────────────────────────────
    /// A required configuration key was missing while the code path that
    /// needed it was taken (e.g. an `ENC(...)` credential with no decryption key).
    #[error("configuration error: {0}")]
    ConfigError(String),

    // ─────────────────────────────── Persistence ───────────────────────────────
    /// The relational store failed an operation.
    #[error("store error: {0}")]
    Store(String),

    /// The graph store failed an operation.
    #[error("graph store error: {0}")]
    Graph(String),

    // ─────────────────────────────── Wrapped errors ───────────────────────────────
    /// A `serde_json` (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    /// Build a [`CoreError::SourceError`] for `platform`.
    #[must_use]
    pub fn source(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceError {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// True when the error should propagate out of a detailed-profile or
    /// refresh call rather than be swallowed as an empty result.
    ///
    /// Per the failure semantics: `NotFound` and `ConfigError` always
    /// propagate; everything else is a candidate for best-effort handling
    /// by the caller.
    #[must_use]
    pub const fn propagates_in_detail(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ConfigError(_))
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CoreError>;
