//! Reddit: `/user/<u>/about.json` for profiles, `submitted.json` +
//! `comments.json` for posts, each paginated via Reddit's `after` cursor.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "reddit";
const BASE: &str = "https://www.reddit.com";

/// Reddit adapter. Public JSON endpoints, auth optional (an OAuth token, if
/// configured, raises the rate limit but isn't required to read public data).
pub struct RedditAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> RedditAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(60, 60.0)) }
    }

    fn headers(&self) -> Result<HashMap<String, String>, CoreError> {
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), "osint-aggregator/1.0".to_string());
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("authorization".to_string(), format!("Bearer {token}"));
        }
        Ok(headers)
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for RedditAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let headers = self.headers()?;
        let url = format!("{BASE}/user/{username}/about.json");
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
        profile.bio = data
            .get("subreddit")
            .and_then(|s| str_field(s, "public_description"))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        profile.verified = data.get("verified").and_then(Value::as_bool);
        profile.post_count = u64_field(data, "link_karma");
        profile.follower_count = data.get("subreddit").and_then(|s| u64_field(s, "subscribers"));
        profile.created_at = data.get("created_utc").and_then(Value::as_f64).and_then(|secs| {
            chrono::DateTime::from_timestamp(secs as i64, 0)
        });
        profile.raw = body;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let headers = self.headers()?;
        let mut posts = paginate(&self.guard, &self.transport, &headers, &format!("{BASE}/user/{username}/submitted.json"), username, max_items).await?;
        if posts.len() < max_items {
            let remaining = max_items - posts.len();
            let comments = paginate(&self.guard, &self.transport, &headers, &format!("{BASE}/user/{username}/comments.json"), username, remaining).await?;
            posts.extend(comments);
        }
        posts.truncate(max_items);
        Ok(posts)
    }
}

async fn paginate<T: Transport>(
    guard: &AdapterGuard,
    transport: &T,
    headers: &HashMap<String, String>,
    base_url: &str,
    username: &str,
    max_items: usize,
) -> Result<Vec<NormalizedPost>, CoreError> {
    let mut posts = Vec::new();
    let mut after: Option<String> = None;

    loop {
        if posts.len() >= max_items {
            break;
        }
        let mut url = format!("{base_url}?limit=100");
        if let Some(cursor) = &after {
            url.push_str(&format!("&after={cursor}"));
        }

        let resp = guard.get(transport, &url, headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound | StatusOutcome::Error => break,
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let Some(children) = body.get("data").and_then(|d| d.get("children")).and_then(Value::as_array) else { break };
        if children.is_empty() {
            break;
        }

        for child in children {
            if let Some(post) = to_post(username, child) {
                posts.push(post);
            }
            if posts.len() >= max_items {
                break;
            }
        }

        after = body.get("data").and_then(|d| str_field(d, "after")).map(str::to_string);
        if after.is_none() {
            break;
        }
    }

    Ok(posts)
}

fn to_post(username: &str, child: &Value) -> Option<NormalizedPost> {
    let kind = str_field(child, "kind")?;
    let data = child.get("data")?;

    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(data, "id").map(str::to_string);
    post.created_at = data.get("created_utc").and_then(Value::as_f64).and_then(|secs| {
        chrono::DateTime::from_timestamp(secs as i64, 0)
    });
    post.like_count = u64_field(data, "score");
    post.comment_count = u64_field(data, "num_comments");

    match kind {
        "t3" => {
            post.title = str_field(data, "title").map(str::to_string);
            post.content = str_field(data, "selftext").filter(|s| !s.is_empty()).map(str::to_string);
            post.url = str_field(data, "permalink").map(|p| format!("https://www.reddit.com{p}"));
        },
        "t1" => {
            post.content = str_field(data, "body").map(str::to_string);
            post.url = str_field(data, "permalink").map(|p| format!("https://www.reddit.com{p}"));
        },
        _ => return None,
    }

    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
        post.mentions = osint_core::extraction::mentions(text);
    }
    post.raw = child.clone();
    Some(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedCredentials, FixedTransport, NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = RedditAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("carol"), "https://www.reddit.com/user/carol/");
    }

    #[tokio::test]
    async fn not_found_profile_yields_none() {
        let adapter = RedditAdapter::new(FixedTransport { status: 404, body: String::new() }, NoopCredentials);
        assert!(adapter.fetch_profile("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn parses_about_json_profile() {
        let body = serde_json::json!({
            "data": {"name": "carol", "verified": true, "link_karma": 120, "subreddit": {"public_description": "hi", "subscribers": 3}}
        })
        .to_string();
        let adapter = RedditAdapter::new(FixedTransport { status: 200, body }, FixedCredentials("tok"));
        let profile = adapter.fetch_profile("carol").await.unwrap().unwrap();
        assert_eq!(profile.bio.as_deref(), Some("hi"));
        assert_eq!(profile.verified, Some(true));
    }

    #[test]
    fn branches_submission_and_comment_kinds() {
        let submission = serde_json::json!({"kind": "t3", "data": {"id": "abc", "title": "Hello", "selftext": "", "score": 1, "num_comments": 0}});
        let comment = serde_json::json!({"kind": "t1", "data": {"id": "def", "body": "reply text", "score": 1, "num_comments": 0}});
        assert!(to_post("carol", &submission).unwrap().title.is_some());
        assert_eq!(to_post("carol", &comment).unwrap().content.as_deref(), Some("reply text"));
    }
}
