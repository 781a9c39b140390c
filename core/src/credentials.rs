//! The `CredentialProvider` boundary: round-robin tokens per platform.
//!
//! The cryptography used to decrypt `ENC(...)` wrapped values is an external
//! collaborator per the system's non-goals; this module only defines the
//! lookup contract adapters depend on.

use crate::error::CoreError;

/// Returns plaintext tokens for a platform, round-robin style.
///
/// Implementations own the decryption of any `ENC(...)`-wrapped values read
/// from configuration; by the time a token reaches an adapter it is always
/// plaintext.
pub trait CredentialProvider: Send + Sync {
    /// All configured tokens for `platform`, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigError`] when an `ENC(...)` value is present
    /// but no decryption key was configured.
    fn tokens(&self, platform: &str) -> Result<Vec<String>, CoreError>;

    /// The next token for `platform` in round-robin order, or `None` when no
    /// tokens are configured ("no-auth mode").
    ///
    /// The round-robin index is a single atomic counter per platform; there
    /// is no shared state across platforms.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigError`] under the same conditions as [`tokens`](Self::tokens).
    fn next_token(&self, platform: &str) -> Result<Option<String>, CoreError>;
}

/// Delegating impl so an `Arc<C>` can stand in for `C`, letting a single
/// provider be shared across every adapter in a registry without requiring
/// the concrete provider to be cheap to clone itself.
impl<C: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<C> {
    fn tokens(&self, platform: &str) -> Result<Vec<String>, CoreError> {
        (**self).tokens(platform)
    }

    fn next_token(&self, platform: &str) -> Result<Option<String>, CoreError> {
        (**self).next_token(platform)
    }
}
