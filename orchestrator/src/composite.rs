//! The composite return type for [`crate::FanoutOrchestrator::detailed_profile`].

use chrono::{DateTime, Utc};
use osint_core::model::{LinkedAccount, NormalizedPost, NormalizedProfile};

/// `profile`, `posts`, and `linked_accounts` for a single `(platform, username)`,
/// as returned by `detailed_profile`/`refresh`.
#[derive(Debug, Clone)]
pub struct DetailedProfile {
    /// The normalized profile.
    pub profile: NormalizedProfile,
    /// Posts fetched (or read back from cache) alongside the profile.
    pub posts: Vec<NormalizedPost>,
    /// Linked accounts discovered (or read back from cache).
    pub linked_accounts: Vec<LinkedAccount>,
    /// When this bundle was last written.
    pub last_updated: DateTime<Utc>,
}
