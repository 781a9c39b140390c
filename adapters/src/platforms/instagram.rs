//! Instagram: best-effort scrape. Tries the `?__a=1` JSON endpoint first,
//! falls back to mining `window._sharedData` out of the rendered HTML.

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

use crate::harness::{classify_status, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "instagram";

static SHARED_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"window\._sharedData\s*=\s*(\{.*?\});</script>").unwrap()
});

/// Instagram adapter. Entirely a best-effort scrape: Instagram has no public
/// unauthenticated API, so every result here is "whatever the HTML/embedded
/// JSON happened to expose at fetch time".
pub struct InstagramAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> InstagramAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(30, 60.0)) }
    }

    fn headers(&self) -> Result<HashMap<String, String>, CoreError> {
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), "osint-aggregator/1.0".to_string());
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("cookie".to_string(), token);
        }
        Ok(headers)
    }

    async fn fetch_user_payload(&self, username: &str) -> Result<Option<Value>, CoreError> {
        let headers = self.headers()?;

        let json_url = format!("https://www.instagram.com/{username}/?__a=1&__d=dis");
        let resp = self.guard.get(&self.transport, &json_url, &headers).await?;
        if classify_status(&resp) == StatusOutcome::Proceed {
            if let Ok(body) = resp.json() {
                if let Some(user) = user_from_json_payload(&body) {
                    return Ok(Some(user.clone()));
                }
            }
        }

        let html_url = format!("https://www.instagram.com/{username}/");
        let resp = self.guard.get(&self.transport, &html_url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        Ok(user_from_shared_data(&resp.text))
    }
}

fn user_from_json_payload(body: &Value) -> Option<&Value> {
    body.get("graphql").and_then(|g| g.get("user")).or_else(|| body.get("user"))
}

fn user_from_shared_data(html: &str) -> Option<Value> {
    let captured = SHARED_DATA_RE.captures(html)?;
    let parsed: Value = serde_json::from_str(&captured[1]).ok()?;
    parsed
        .get("entry_data")
        .and_then(|e| e.get("ProfilePage"))
        .and_then(Value::as_array)
        .and_then(|pages| pages.first())
        .and_then(|page| page.get("graphql"))
        .and_then(|g| g.get("user"))
        .cloned()
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for InstagramAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(user) = self.fetch_user_payload(username).await? else {
            return Ok(None);
        };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(&user, "full_name").map(str::to_string);
        profile.bio = str_field(&user, "biography").map(str::to_string);
        profile.verified = user.get("is_verified").and_then(Value::as_bool);
        profile.profile_image_url = str_field(&user, "profile_pic_url_hd").or_else(|| str_field(&user, "profile_pic_url")).map(str::to_string);
        profile.follower_count = user.get("edge_followed_by").and_then(|e| u64_field(e, "count"));
        profile.following_count = user.get("edge_follow").and_then(|e| u64_field(e, "count"));
        profile.post_count = user.get("edge_owner_to_timeline_media").and_then(|e| u64_field(e, "count"));
        profile.raw = user;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(user) = self.fetch_user_payload(username).await? else {
            return Ok(Vec::new());
        };

        let Some(edges) = user
            .get("edge_owner_to_timeline_media")
            .and_then(|e| e.get("edges"))
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };

        Ok(edges.iter().take(max_items).filter_map(|edge| to_post(username, edge)).collect())
    }
}

fn to_post(username: &str, edge: &Value) -> Option<NormalizedPost> {
    let node = edge.get("node")?;
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(node, "id").map(str::to_string);
    post.content = node
        .get("edge_media_to_caption")
        .and_then(|c| c.get("edges"))
        .and_then(Value::as_array)
        .and_then(|edges| edges.first())
        .and_then(|e| e.get("node"))
        .and_then(|n| str_field(n, "text"))
        .map(str::to_string);
    post.like_count = node.get("edge_liked_by").and_then(|e| u64_field(e, "count"));
    post.comment_count = node.get("edge_media_to_comment").and_then(|e| u64_field(e, "count"));
    if let Some(shortcode) = str_field(node, "shortcode") {
        post.url = Some(format!("https://www.instagram.com/p/{shortcode}/"));
    }
    if let Some(display_url) = str_field(node, "display_url") {
        post.media_urls.push(display_url.to_string());
    }
    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
    }
    post.raw = node.clone();
    Some(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = InstagramAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("carol"), "https://www.instagram.com/carol/");
    }

    #[test]
    fn extracts_user_from_shared_data() {
        let html = r#"<script>window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{"full_name":"Carol"}}}]}};</script>"#;
        let user = user_from_shared_data(html).unwrap();
        assert_eq!(user.get("full_name").and_then(Value::as_str), Some("Carol"));
    }

    #[test]
    fn missing_shared_data_is_none() {
        assert!(user_from_shared_data("<html></html>").is_none());
    }
}
