//! TikTok: scrape the `SIGI_STATE` JSON blob embedded in a profile page.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use regex::Regex;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "tiktok";

static SIGI_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"<script id="SIGI_STATE"[^>]*>(\{.*?\})</script>"#).unwrap()
});

/// TikTok adapter: no public API, everything comes from parsing `SIGI_STATE`.
pub struct TikTokAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> TikTokAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(30, 60.0)) }
    }

    async fn fetch_sigi_state(&self, username: &str) -> Result<Option<Value>, CoreError> {
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), "osint-aggregator/1.0".to_string());
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("cookie".to_string(), token);
        }

        let url = format!("https://www.tiktok.com/@{username}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        Ok(extract_sigi_state(&resp.text))
    }
}

fn extract_sigi_state(html: &str) -> Option<Value> {
    let captured = SIGI_STATE_RE.captures(html)?;
    serde_json::from_str(&captured[1]).ok()
}

fn user_module<'a>(state: &'a Value, username: &str) -> Option<&'a Value> {
    state.get("UserModule").and_then(|m| m.get("users")).and_then(|u| u.get(username))
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for TikTokAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(state) = self.fetch_sigi_state(username).await? else {
            return Ok(None);
        };
        let Some(user) = user_module(&state, username) else {
            return Ok(None);
        };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(user, "nickname").map(str::to_string);
        profile.bio = str_field(user, "signature").map(str::to_string);
        profile.verified = user.get("verified").and_then(Value::as_bool);
        profile.profile_image_url = str_field(user, "avatarLarger").map(str::to_string);

        if let Some(stats) = state.get("UserModule").and_then(|m| m.get("stats")).and_then(|s| s.get(username)) {
            profile.follower_count = u64_field(stats, "followerCount");
            profile.following_count = u64_field(stats, "followingCount");
            profile.post_count = u64_field(stats, "videoCount");
        }
        profile.raw = user.clone();

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(state) = self.fetch_sigi_state(username).await? else {
            return Ok(Vec::new());
        };
        let Some(items) = state.get("ItemModule").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        Ok(items.values().take(max_items).map(|item| to_post(username, item)).collect())
    }
}

fn to_post(username: &str, item: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(item, "id").map(str::to_string);
    post.content = str_field(item, "desc").map(str::to_string);
    post.created_at = item.get("createTime").and_then(|v| {
        v.as_str().map(str::to_string).or_else(|| v.as_u64().map(|n| n.to_string()))
    }).and_then(|raw| parse_timestamp(&raw));
    if let Some(id) = &post.post_id {
        post.url = Some(format!("https://www.tiktok.com/@{username}/video/{id}"));
    }
    if let Some(stats) = item.get("stats") {
        post.like_count = u64_field(stats, "diggCount");
        post.comment_count = u64_field(stats, "commentCount");
        post.share_count = u64_field(stats, "shareCount");
        post.view_count = u64_field(stats, "playCount");
    }
    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
    }
    post.raw = item.clone();
    post
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_is_canonical() {
        assert_eq!(
            osint_core::adapter::canonical_profile_url(&Platform::new(PLATFORM), "carol"),
            "https://www.tiktok.com/@carol"
        );
    }

    #[test]
    fn extracts_sigi_state_blob() {
        let html = r#"<script id="SIGI_STATE" type="application/json">{"UserModule":{"users":{"carol":{"nickname":"Carol"}}}}</script>"#;
        let state = extract_sigi_state(html).unwrap();
        assert_eq!(user_module(&state, "carol").and_then(|u| str_field(u, "nickname")), Some("Carol"));
    }

    #[test]
    fn missing_sigi_state_is_none() {
        assert!(extract_sigi_state("<html></html>").is_none());
    }
}
