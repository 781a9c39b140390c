//! Bluesky: `app.bsky.actor.getProfile` / `app.bsky.feed.getAuthorFeed` over
//! the public AT Protocol XRPC endpoint.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "bluesky";
const XRPC_BASE: &str = "https://public.api.bsky.app/xrpc";

/// Bluesky adapter. The public AppView serves profile and feed reads without
/// auth; a configured token only raises the rate limit.
pub struct BlueskyAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> BlueskyAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(300, 300.0)) }
    }

    fn headers(&self) -> Result<HashMap<String, String>, CoreError> {
        let mut headers = HashMap::new();
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("authorization".to_string(), format!("Bearer {token}"));
        }
        Ok(headers)
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for BlueskyAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let headers = self.headers()?;
        let url = format!("{XRPC_BASE}/app.bsky.actor.getProfile?actor={username}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(&body, "displayName").map(str::to_string);
        profile.bio = str_field(&body, "description").map(str::to_string);
        profile.profile_image_url = str_field(&body, "avatar").map(str::to_string);
        profile.follower_count = u64_field(&body, "followersCount");
        profile.following_count = u64_field(&body, "followsCount");
        profile.post_count = u64_field(&body, "postsCount");
        profile.created_at = str_field(&body, "createdAt").and_then(parse_timestamp);
        profile.raw = body;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let headers = self.headers()?;
        let url = format!(
            "{XRPC_BASE}/app.bsky.feed.getAuthorFeed?actor={username}&limit={}",
            max_items.min(100)
        );
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Ok(Vec::new());
        }

        let body = resp.json()?;
        let Some(feed) = body.get("feed").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(feed.iter().take(max_items).filter_map(|entry| to_post(username, entry)).collect())
    }
}

fn to_post(username: &str, entry: &Value) -> Option<NormalizedPost> {
    let view = entry.get("post")?;
    let record = view.get("record")?;

    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(view, "cid").map(str::to_string);
    post.url = str_field(view, "uri").map(str::to_string);
    post.content = str_field(record, "text").map(str::to_string);
    post.created_at = str_field(record, "createdAt").and_then(parse_timestamp);
    post.like_count = u64_field(view, "likeCount");
    post.comment_count = u64_field(view, "replyCount");
    post.share_count = u64_field(view, "repostCount");
    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
    }
    post.raw = view.clone();
    Some(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_is_canonical() {
        assert_eq!(canonical_profile_url(&Platform::new(PLATFORM), "carol.bsky.social"), "https://bsky.app/profile/carol.bsky.social");
    }

    #[test]
    fn post_requires_a_record() {
        assert!(to_post("carol", &serde_json::json!({"post": {}})).is_none());
    }
}
