//! Twitter/X: `users/by/username` for profiles, `users/{id}/tweets` for posts.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "twitter";
const API_BASE: &str = "https://api.twitter.com/2";

/// Twitter/X adapter. Posts are skipped entirely (empty result, not an
/// error) when no bearer token is configured, since `users/{id}/tweets`
/// requires auth unconditionally.
pub struct TwitterAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> TwitterAdapter<T, C> {
    /// Build the adapter. Default rate limit: 180 requests / 15 minutes, the
    /// v2 API's standard app-level cap for these endpoints.
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(180, 900.0)) }
    }

    fn auth_headers(&self) -> Result<Option<HashMap<String, String>>, CoreError> {
        let Some(token) = self.credentials.next_token(PLATFORM)? else {
            return Ok(None);
        };
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), format!("Bearer {token}"));
        Ok(Some(headers))
    }

    fn user_fields_query() -> &'static str {
        "user.fields=description,location,profile_image_url,public_metrics,verified,created_at"
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for TwitterAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(headers) = self.auth_headers()? else {
            return Ok(None);
        };

        let url = format!("{API_BASE}/users/by/username/{username}?{}", Self::user_fields_query());
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let Some(data) = body.get("data") else { return Ok(None) };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(data, "name").map(str::to_string);
        profile.bio = str_field(data, "description").map(str::to_string);
        profile.location = str_field(data, "location").map(str::to_string);
        profile.verified = data.get("verified").and_then(Value::as_bool);
        profile.profile_image_url = str_field(data, "profile_image_url").map(str::to_string);
        profile.created_at = str_field(data, "created_at").and_then(parse_timestamp);

        if let Some(metrics) = data.get("public_metrics") {
            profile.follower_count = u64_field(metrics, "followers_count");
            profile.following_count = u64_field(metrics, "following_count");
            profile.post_count = u64_field(metrics, "tweet_count");
        }
        profile.raw = body;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(headers) = self.auth_headers()? else {
            return Ok(Vec::new());
        };
        let Some(profile) = self.fetch_profile(username).await? else {
            return Ok(Vec::new());
        };
        let Some(user_id) = str_field(&profile.raw, "id").map(str::to_string).or_else(|| {
            profile.raw.get("data").and_then(|d| str_field(d, "id")).map(str::to_string)
        }) else {
            return Ok(Vec::new());
        };

        let mut posts = Vec::new();
        let mut pagination_token: Option<String> = None;

        loop {
            if posts.len() >= max_items {
                break;
            }
            let mut url = format!(
                "{API_BASE}/users/{user_id}/tweets?max_results=100&tweet.fields=created_at,public_metrics"
            );
            if let Some(token) = &pagination_token {
                url.push_str(&format!("&pagination_token={token}"));
            }

            let resp = self.guard.get(&self.transport, &url, &headers).await?;
            match classify_status(&resp) {
                StatusOutcome::NotFound | StatusOutcome::Error => break,
                StatusOutcome::Proceed => {},
            }

            let body = resp.json()?;
            let Some(items) = body.get("data").and_then(Value::as_array) else { break };
            if items.is_empty() {
                break;
            }

            for item in items {
                posts.push(to_post(&profile.username, item));
                if posts.len() >= max_items {
                    break;
                }
            }

            pagination_token = body.get("meta").and_then(|m| str_field(m, "next_token")).map(str::to_string);
            if pagination_token.is_none() {
                break;
            }
        }

        posts.truncate(max_items);
        Ok(posts)
    }
}

fn to_post(username: &str, item: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(item, "id").map(str::to_string);
    post.content = str_field(item, "text").map(str::to_string);
    post.created_at = str_field(item, "created_at").and_then(parse_timestamp);
    if let Some(id) = &post.post_id {
        post.url = Some(format!("https://x.com/{username}/status/{id}"));
    }
    if let Some(metrics) = item.get("public_metrics") {
        post.like_count = u64_field(metrics, "like_count");
        post.comment_count = u64_field(metrics, "reply_count");
        post.share_count = u64_field(metrics, "retweet_count");
    }
    if let Some(text) = &post.content {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
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
        let adapter = TwitterAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("carol"), "https://x.com/carol");
    }

    #[tokio::test]
    async fn no_auth_mode_skips_posts_entirely() {
        let adapter = TwitterAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_posts("carol", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_auth_mode_returns_no_profile() {
        let adapter = TwitterAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_profile("carol").await.unwrap().is_none());
    }
}
