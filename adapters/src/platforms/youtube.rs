//! YouTube Data API v3: `channels?forHandle=` for profiles,
//! `search?channelId=...&order=date&type=video` for posts.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "youtube";
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube adapter. Requires an API key (`YOUTUBE_TOKENS`); with no-auth
/// mode, `fetch_profile`/`fetch_posts` both return empty/null since there is
/// no unauthenticated path into the Data API.
pub struct YouTubeAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> YouTubeAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(100, 1.0)) }
    }

    async fn channel_for_handle(&self, username: &str, api_key: &str) -> Result<Option<Value>, CoreError> {
        let handle = username.trim_start_matches('@');
        let url = format!(
            "{API_BASE}/channels?part=snippet,statistics&forHandle=%40{handle}&key={api_key}"
        );
        let resp = self.guard.get(&self.transport, &url, &HashMap::new()).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }
        let body = resp.json()?;
        Ok(body.get("items").and_then(Value::as_array).and_then(|items| items.first()).cloned())
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for YouTubeAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(api_key) = self.credentials.next_token(PLATFORM)? else {
            return Ok(None);
        };
        let Some(channel) = self.channel_for_handle(username, &api_key).await? else {
            return Ok(None);
        };

        let snippet = channel.get("snippet");
        let statistics = channel.get("statistics");

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = snippet.and_then(|s| str_field(s, "title")).map(str::to_string);
        profile.bio = snippet.and_then(|s| str_field(s, "description")).map(str::to_string);
        profile.profile_image_url =
            snippet.and_then(|s| s.get("thumbnails")).and_then(|t| t.get("high")).and_then(|h| str_field(h, "url")).map(str::to_string);
        profile.created_at = snippet.and_then(|s| str_field(s, "publishedAt")).and_then(parse_timestamp);
        profile.follower_count = statistics.and_then(|s| u64_field(s, "subscriberCount"));
        profile.post_count = statistics.and_then(|s| u64_field(s, "videoCount"));
        profile.raw = channel;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(api_key) = self.credentials.next_token(PLATFORM)? else {
            return Ok(Vec::new());
        };
        let Some(channel) = self.channel_for_handle(username, &api_key).await? else {
            return Ok(Vec::new());
        };
        let Some(channel_id) = str_field(&channel, "id").map(str::to_string) else {
            return Ok(Vec::new());
        };

        let url = format!(
            "{API_BASE}/search?part=snippet&channelId={channel_id}&order=date&type=video&maxResults={}&key={api_key}",
            max_items.min(50)
        );
        let resp = self.guard.get(&self.transport, &url, &HashMap::new()).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Ok(Vec::new());
        }

        let body = resp.json()?;
        let Some(items) = body.get("items").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(items.iter().take(max_items).map(|item| to_post(username, item)).collect())
    }
}

fn to_post(username: &str, item: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    let video_id = item.get("id").and_then(|i| str_field(i, "videoId")).map(str::to_string);
    post.post_id = video_id.clone();
    if let Some(id) = &video_id {
        post.url = Some(format!("https://www.youtube.com/watch?v={id}"));
    }
    if let Some(snippet) = item.get("snippet") {
        post.title = str_field(snippet, "title").map(str::to_string);
        post.content = str_field(snippet, "description").map(str::to_string);
        post.created_at = str_field(snippet, "publishedAt").and_then(parse_timestamp);
    }
    post.raw = item.clone();
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = YouTubeAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("carol"), "https://www.youtube.com/@carol");
    }

    #[tokio::test]
    async fn no_api_key_yields_no_profile() {
        let adapter = YouTubeAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_profile("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_api_key_skips_posts() {
        let adapter = YouTubeAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_posts("carol", 5).await.unwrap().is_empty());
    }
}
