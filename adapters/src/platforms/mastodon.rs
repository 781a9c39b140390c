//! Mastodon: `api/v2/search?type=accounts` against the handle's inferred
//! instance, `api/v1/accounts/{id}/statuses` for posts.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, split_mastodon_handle, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "mastodon";

/// Mastodon adapter. A handle may be `user@instance`; with no instance part
/// the default `mastodon.social` is assumed, per [`split_mastodon_handle`].
pub struct MastodonAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> MastodonAdapter<T, C> {
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

    async fn find_account(&self, handle: &str) -> Result<Option<Value>, CoreError> {
        let (user, instance) = split_mastodon_handle(handle);
        let headers = self.headers()?;
        let url = format!("https://{instance}/api/v2/search?q=%40{user}%40{instance}&type=accounts&resolve=true");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }
        let body = resp.json()?;
        Ok(body
            .get("accounts")
            .and_then(Value::as_array)
            .and_then(|accounts| accounts.iter().find(|a| str_field(a, "acct") == Some(user) || str_field(a, "username") == Some(user)))
            .or_else(|| body.get("accounts").and_then(Value::as_array).and_then(|a| a.first()))
            .cloned())
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for MastodonAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(account) = self.find_account(username).await? else {
            return Ok(None);
        };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(&account, "display_name").map(str::to_string);
        profile.bio = str_field(&account, "note").map(str::to_string);
        profile.profile_image_url = str_field(&account, "avatar").map(str::to_string);
        profile.follower_count = u64_field(&account, "followers_count");
        profile.following_count = u64_field(&account, "following_count");
        profile.post_count = u64_field(&account, "statuses_count");
        profile.created_at = str_field(&account, "created_at").and_then(parse_timestamp);
        profile.raw = account;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let (_, instance) = split_mastodon_handle(username);
        let Some(account) = self.find_account(username).await? else {
            return Ok(Vec::new());
        };
        let Some(id) = str_field(&account, "id").map(str::to_string) else {
            return Ok(Vec::new());
        };

        let headers = self.headers()?;
        let url = format!("https://{instance}/api/v1/accounts/{id}/statuses?limit={}", max_items.min(40));
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Ok(Vec::new());
        }

        let body = resp.json()?;
        let Some(statuses) = body.as_array() else { return Ok(Vec::new()) };
        Ok(statuses.iter().take(max_items).map(|status| to_post(username, status)).collect())
    }
}

fn to_post(username: &str, status: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(status, "id").map(str::to_string);
    post.url = str_field(status, "url").map(str::to_string);
    post.content = str_field(status, "content").map(|html| strip_tags(html));
    post.created_at = str_field(status, "created_at").and_then(parse_timestamp);
    post.like_count = u64_field(status, "favourites_count");
    post.share_count = u64_field(status, "reblogs_count");
    post.comment_count = u64_field(status, "replies_count");
    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
    }
    post.raw = status.clone();
    post
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {},
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_defaults_instance() {
        assert_eq!(
            canonical_profile_url(&Platform::new(PLATFORM), "carol"),
            "https://mastodon.social/@carol"
        );
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<p>Hello <strong>world</strong></p>"), "Hello world");
    }
}
