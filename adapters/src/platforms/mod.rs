//! One module per platform, each exposing a concrete `SourceAdapter` impl.

pub mod bluesky;
pub mod discord;
pub mod facebook;
pub mod github;
pub mod instagram;
pub mod linkedin;
pub mod mastodon;
pub mod medium;
pub mod reddit;
pub mod tiktok;
pub mod twitch;
pub mod twitter;
pub mod youtube;

pub use bluesky::BlueskyAdapter;
pub use discord::DiscordAdapter;
pub use facebook::FacebookAdapter;
pub use github::GitHubAdapter;
pub use instagram::InstagramAdapter;
pub use linkedin::LinkedInAdapter;
pub use mastodon::MastodonAdapter;
pub use medium::MediumAdapter;
pub use reddit::RedditAdapter;
pub use tiktok::TikTokAdapter;
pub use twitch::TwitchAdapter;
pub use twitter::TwitterAdapter;
pub use youtube::YouTubeAdapter;
