//! Closed enum over every concrete [`SourceAdapter`], and the registry that
//! maps a platform name to one.
//!
//! `SourceAdapter` is `async fn`-based and therefore trait-object
//! incompatible (see `osint_adapters`'s crate docs); [`AnyAdapter`] is the
//! same enum-dispatch pattern used for [`osint_store::Store`] and
//! `osint_graph`'s relationship lookup, applied here so the orchestrator can
//! hold thirteen different concrete adapter types behind one map.

use std::collections::HashMap;

use osint_adapters::platforms::{
    BlueskyAdapter, DiscordAdapter, FacebookAdapter, GitHubAdapter, InstagramAdapter, LinkedInAdapter, MastodonAdapter,
    MediumAdapter, RedditAdapter, TikTokAdapter, TwitchAdapter, TwitterAdapter, YouTubeAdapter,
};
use osint_core::adapter::SourceAdapter;
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::transport::Transport;

/// Every platform a registry built by [`build_registry`] knows about.
pub const SUPPORTED_PLATFORMS: &[&str] = &[
    "twitter", "reddit", "github", "instagram", "tiktok", "facebook", "linkedin", "youtube", "medium", "mastodon",
    "bluesky", "twitch", "discord",
];

/// One concrete adapter, for whichever platform this variant names.
///
/// `Twitch` carries its own client-credentials flow rather than a
/// [`CredentialProvider`], matching `TwitchAdapter`'s distinct constructor.
pub enum AnyAdapter<T, C> {
    /// `twitter`
    Twitter(TwitterAdapter<T, C>),
    /// `reddit`
    Reddit(RedditAdapter<T, C>),
    /// `github`
    GitHub(GitHubAdapter<T, C>),
    /// `instagram`
    Instagram(InstagramAdapter<T, C>),
    /// `tiktok`
    TikTok(TikTokAdapter<T, C>),
    /// `facebook`
    Facebook(FacebookAdapter<T, C>),
    /// `linkedin`
    LinkedIn(LinkedInAdapter<T, C>),
    /// `youtube`
    YouTube(YouTubeAdapter<T, C>),
    /// `medium`
    Medium(MediumAdapter<T, C>),
    /// `mastodon`
    Mastodon(MastodonAdapter<T, C>),
    /// `bluesky`
    Bluesky(BlueskyAdapter<T, C>),
    /// `twitch`
    Twitch(TwitchAdapter<T>),
    /// `discord`
    Discord(DiscordAdapter<T, C>),
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for AnyAdapter<T, C> {
    fn platform(&self) -> Platform {
        match self {
            Self::Twitter(a) => a.platform(),
            Self::Reddit(a) => a.platform(),
            Self::GitHub(a) => a.platform(),
            Self::Instagram(a) => a.platform(),
            Self::TikTok(a) => a.platform(),
            Self::Facebook(a) => a.platform(),
            Self::LinkedIn(a) => a.platform(),
            Self::YouTube(a) => a.platform(),
            Self::Medium(a) => a.platform(),
            Self::Mastodon(a) => a.platform(),
            Self::Bluesky(a) => a.platform(),
            Self::Twitch(a) => a.platform(),
            Self::Discord(a) => a.platform(),
        }
    }

    fn profile_url(&self, username: &str) -> String {
        match self {
            Self::Twitter(a) => a.profile_url(username),
            Self::Reddit(a) => a.profile_url(username),
            Self::GitHub(a) => a.profile_url(username),
            Self::Instagram(a) => a.profile_url(username),
            Self::TikTok(a) => a.profile_url(username),
            Self::Facebook(a) => a.profile_url(username),
            Self::LinkedIn(a) => a.profile_url(username),
            Self::YouTube(a) => a.profile_url(username),
            Self::Medium(a) => a.profile_url(username),
            Self::Mastodon(a) => a.profile_url(username),
            Self::Bluesky(a) => a.profile_url(username),
            Self::Twitch(a) => a.profile_url(username),
            Self::Discord(a) => a.profile_url(username),
        }
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        match self {
            Self::Twitter(a) => a.fetch_profile(username).await,
            Self::Reddit(a) => a.fetch_profile(username).await,
            Self::GitHub(a) => a.fetch_profile(username).await,
            Self::Instagram(a) => a.fetch_profile(username).await,
            Self::TikTok(a) => a.fetch_profile(username).await,
            Self::Facebook(a) => a.fetch_profile(username).await,
            Self::LinkedIn(a) => a.fetch_profile(username).await,
            Self::YouTube(a) => a.fetch_profile(username).await,
            Self::Medium(a) => a.fetch_profile(username).await,
            Self::Mastodon(a) => a.fetch_profile(username).await,
            Self::Bluesky(a) => a.fetch_profile(username).await,
            Self::Twitch(a) => a.fetch_profile(username).await,
            Self::Discord(a) => a.fetch_profile(username).await,
        }
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        match self {
            Self::Twitter(a) => a.fetch_posts(username, max_items).await,
            Self::Reddit(a) => a.fetch_posts(username, max_items).await,
            Self::GitHub(a) => a.fetch_posts(username, max_items).await,
            Self::Instagram(a) => a.fetch_posts(username, max_items).await,
            Self::TikTok(a) => a.fetch_posts(username, max_items).await,
            Self::Facebook(a) => a.fetch_posts(username, max_items).await,
            Self::LinkedIn(a) => a.fetch_posts(username, max_items).await,
            Self::YouTube(a) => a.fetch_posts(username, max_items).await,
            Self::Medium(a) => a.fetch_posts(username, max_items).await,
            Self::Mastodon(a) => a.fetch_posts(username, max_items).await,
            Self::Bluesky(a) => a.fetch_posts(username, max_items).await,
            Self::Twitch(a) => a.fetch_posts(username, max_items).await,
            Self::Discord(a) => a.fetch_posts(username, max_items).await,
        }
    }
}

/// `platform name -> adapter`, built once at startup and held for the
/// orchestrator's lifetime.
pub struct AdapterRegistry<T, C> {
    adapters: HashMap<String, AnyAdapter<T, C>>,
}

impl<T: Transport + Clone, C: CredentialProvider + Clone> AdapterRegistry<T, C> {
    /// Build the full registry of thirteen platform adapters.
    ///
    /// `transport` and `credentials` are cloned into each adapter; both are
    /// expected to be cheap handles (an `Arc`-backed client, a shared
    /// credential map) per their trait docs. `twitch_client_id`/`twitch_client_secret`
    /// are plumbed separately since `TwitchAdapter` authenticates via its own
    /// client-credentials flow rather than a `CredentialProvider`.
    #[must_use]
    pub fn new(transport: T, credentials: C, twitch_client_id: impl Into<String>, twitch_client_secret: impl Into<String>) -> Self {
        let mut adapters = HashMap::new();
        adapters.insert("twitter".to_string(), AnyAdapter::Twitter(TwitterAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert("reddit".to_string(), AnyAdapter::Reddit(RedditAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert("github".to_string(), AnyAdapter::GitHub(GitHubAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert(
            "instagram".to_string(),
            AnyAdapter::Instagram(InstagramAdapter::new(transport.clone(), credentials.clone())),
        );
        adapters.insert("tiktok".to_string(), AnyAdapter::TikTok(TikTokAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert(
            "facebook".to_string(),
            AnyAdapter::Facebook(FacebookAdapter::new(transport.clone(), credentials.clone())),
        );
        adapters.insert(
            "linkedin".to_string(),
            AnyAdapter::LinkedIn(LinkedInAdapter::new(transport.clone(), credentials.clone())),
        );
        adapters.insert("youtube".to_string(), AnyAdapter::YouTube(YouTubeAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert("medium".to_string(), AnyAdapter::Medium(MediumAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert(
            "mastodon".to_string(),
            AnyAdapter::Mastodon(MastodonAdapter::new(transport.clone(), credentials.clone())),
        );
        adapters.insert("bluesky".to_string(), AnyAdapter::Bluesky(BlueskyAdapter::new(transport.clone(), credentials.clone())));
        adapters.insert("twitch".to_string(), AnyAdapter::Twitch(TwitchAdapter::new(transport.clone(), twitch_client_id, twitch_client_secret)));
        adapters.insert("discord".to_string(), AnyAdapter::Discord(DiscordAdapter::new(transport, credentials)));
        Self { adapters }
    }

    /// Look up the adapter for `platform`, case-insensitively.
    #[must_use]
    pub fn get(&self, platform: &str) -> Option<&AnyAdapter<T, C>> {
        self.adapters.get(&platform.to_lowercase())
    }

    /// Every registered platform name.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Resolve a caller-supplied subset of platforms against the registry,
    /// silently dropping names with no adapter. `None` means "every platform".
    #[must_use]
    pub fn resolve<'a>(&'a self, requested: Option<&'a [String]>) -> Vec<&'a str> {
        match requested {
            Some(names) => names.iter().map(String::as_str).filter(|name| self.adapters.contains_key(&name.to_lowercase())).collect(),
            None => self.platforms().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use osint_testing::{MapCredentials, ScriptedTransport};

    use super::*;

    fn registry() -> AdapterRegistry<Arc<ScriptedTransport>, Arc<MapCredentials>> {
        AdapterRegistry::new(Arc::new(ScriptedTransport::new()), Arc::new(MapCredentials::new(HashMap::new())), "id", "secret")
    }

    #[test]
    fn registry_covers_every_supported_platform() {
        let registry = registry();
        for platform in SUPPORTED_PLATFORMS {
            assert!(registry.get(platform).is_some(), "missing adapter for {platform}");
        }
    }

    #[test]
    fn resolve_defaults_to_every_platform() {
        assert_eq!(registry().resolve(None).len(), SUPPORTED_PLATFORMS.len());
    }

    #[test]
    fn resolve_drops_unknown_platform_names() {
        let requested = vec!["github".to_string(), "not-a-real-platform".to_string()];
        assert_eq!(registry().resolve(Some(&requested)), vec!["github"]);
    }
}
