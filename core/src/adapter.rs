//! The `SourceAdapter` contract: one concrete type per platform.
//!
//! The [`FanoutOrchestrator`](https://docs.rs/osint-orchestrator) holds these
//! behind a `platform -> adapter` map keyed by string; everything above this
//! trait is platform-agnostic.

use crate::error::CoreError;
use crate::model::{NormalizedPost, NormalizedProfile, Platform};

/// A platform-specific source of profiles and posts.
///
/// Every outbound call an implementation makes is expected to be gated by a
/// `RateLimiter::acquire` and wrapped in a retry policy; this trait does not
/// enforce that itself; see `osint-adapters` for the shared harness every
/// concrete adapter is built on.
pub trait SourceAdapter: Send + Sync {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// The canonical profile URL for `username`. Pure and stable across calls.
    fn profile_url(&self, username: &str) -> String;

    /// Fetch a profile, or `None` when the source confirms the account does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceError`] for non-recoverable responses and
    /// [`CoreError::Transient`] when retries have been exhausted.
    fn fetch_profile(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<NormalizedProfile>, CoreError>> + Send;

    /// Fetch up to `max_items` posts, paginating internally as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceError`] or [`CoreError::Transient`] under
    /// the same conditions as [`fetch_profile`](Self::fetch_profile). A
    /// malformed individual post never fails the whole batch: it is skipped.
    fn fetch_posts(
        &self,
        username: &str,
        max_items: usize,
    ) -> impl std::future::Future<Output = Result<Vec<NormalizedPost>, CoreError>> + Send;
}

/// Canonical profile URL templates, shared by every adapter so the mapping
/// documented as an external interface lives in exactly one place.
#[must_use]
pub fn canonical_profile_url(platform: &Platform, username: &str) -> String {
    match platform.as_str() {
        "twitter" => format!("https://x.com/{username}"),
        "reddit" => format!("https://www.reddit.com/user/{username}/"),
        "instagram" => format!("https://www.instagram.com/{username}/"),
        "tiktok" => format!("https://www.tiktok.com/@{username}"),
        "facebook" => format!("https://www.facebook.com/{username}"),
        "linkedin" => format!("https://www.linkedin.com/in/{username}/"),
        "youtube" => format!("https://www.youtube.com/@{username}"),
        "github" => format!("https://github.com/{username}"),
        "medium" => format!("https://medium.com/@{}", username.trim_start_matches('@')),
        "bluesky" => format!("https://bsky.app/profile/{username}"),
        "twitch" => format!("https://www.twitch.tv/{username}"),
        "discord" => {
            if is_discord_id(username) {
                format!("https://discord.com/users/{username}")
            } else {
                "https://discord.com/".to_string()
            }
        },
        "mastodon" => mastodon_profile_url(username),
        other => format!("https://{other}.example/{username}"),
    }
}

/// `true` when `value` looks like a Discord snowflake id (16-20 digits).
#[must_use]
pub fn is_discord_id(value: &str) -> bool {
    let len = value.len();
    (16..=20).contains(&len) && value.chars().all(|c| c.is_ascii_digit())
}

/// Default Mastodon instance used when a bare handle carries no `@instance` part.
pub const DEFAULT_MASTODON_INSTANCE: &str = "mastodon.social";

/// Split a Mastodon-style `user@instance` handle, defaulting the instance.
#[must_use]
pub fn split_mastodon_handle(handle: &str) -> (&str, &str) {
    let trimmed = handle.trim_start_matches('@');
    trimmed.split_once('@').unwrap_or((trimmed, DEFAULT_MASTODON_INSTANCE))
}

fn mastodon_profile_url(handle: &str) -> String {
    let (user, instance) = split_mastodon_handle(handle);
    format!("https://{instance}/@{user}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_url_requires_id_shape() {
        assert_eq!(
            canonical_profile_url(&Platform::new("discord"), "123456789012345678"),
            "https://discord.com/users/123456789012345678"
        );
        assert_eq!(canonical_profile_url(&Platform::new("discord"), "not_an_id"), "https://discord.com/");
    }

    #[test]
    fn mastodon_defaults_instance() {
        assert_eq!(
            canonical_profile_url(&Platform::new("mastodon"), "carol"),
            "https://mastodon.social/@carol"
        );
        assert_eq!(
            canonical_profile_url(&Platform::new("mastodon"), "carol@fosstodon.org"),
            "https://fosstodon.org/@carol"
        );
    }

    #[test]
    fn profile_urls_are_stable() {
        let a = canonical_profile_url(&Platform::new("github"), "octocat");
        let b = canonical_profile_url(&Platform::new("github"), "octocat");
        assert_eq!(a, b);
    }
}
