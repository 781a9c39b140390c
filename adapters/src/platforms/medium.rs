//! Medium: RSS (`/feed/@u`) channel metadata as the "profile", items as posts.
//!
//! Medium's RSS is a small, well-behaved XML dialect; rather than pull in a
//! full XML parser for a handful of flat tags, the feed is mined with
//! targeted regexes, the same tolerant-extraction spirit as the rest of the
//! pipeline.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use regex::Regex;

use crate::harness::{classify_status, parse_timestamp, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "medium";

static ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?s)<item>(.*?)</item>").unwrap()
});
static CHANNEL_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| tag_re("description"));
static CHANNEL_TITLE_RE: Lazy<Regex> = Lazy::new(|| tag_re("title"));

fn tag_re(tag: &str) -> Regex {
    #[allow(clippy::unwrap_used)]
    Regex::new(&format!(r"(?s)<{tag}>(?:<!\[CDATA\[(.*?)\]\]>|(.*?))</{tag}>")).unwrap()
}

fn extract_tag(re: &Regex, xml: &str) -> Option<String> {
    let captured = re.captures(xml)?;
    captured.get(1).or_else(|| captured.get(2)).map(|m| m.as_str().trim().to_string())
}

/// Medium adapter.
pub struct MediumAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> MediumAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(30, 60.0)) }
    }

    async fn fetch_feed(&self, username: &str) -> Result<Option<String>, CoreError> {
        let handle = username.trim_start_matches('@');
        let mut headers = HashMap::new();
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("cookie".to_string(), token);
        }

        let url = format!("https://medium.com/feed/@{handle}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => Ok(None),
            StatusOutcome::Error => Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => Ok(Some(resp.text)),
        }
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for MediumAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let Some(xml) = self.fetch_feed(username).await? else {
            return Ok(None);
        };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = extract_tag(&CHANNEL_TITLE_RE, &xml);
        profile.bio = extract_tag(&CHANNEL_DESCRIPTION_RE, &xml);
        profile.raw = serde_json::json!({"feed": xml});

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(xml) = self.fetch_feed(username).await? else {
            return Ok(Vec::new());
        };

        Ok(ITEM_RE.captures_iter(&xml).take(max_items).map(|cap| to_post(username, &cap[1])).collect())
    }
}

fn to_post(username: &str, item_xml: &str) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.title = extract_tag(&tag_re("title"), item_xml);
    post.url = extract_tag(&tag_re("link"), item_xml);
    post.content = extract_tag(&tag_re("description"), item_xml);
    post.created_at = extract_tag(&tag_re("pubDate"), item_xml).and_then(|raw| parse_timestamp(&raw));
    if let Some(text) = post.content.as_deref() {
        post.hashtags = osint_core::extraction::hashtags(text);
    }
    post
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
        <rss><channel>
            <title><![CDATA[Carol on Medium]]></title>
            <description>Writing about rust</description>
            <item>
                <title><![CDATA[My First Post]]></title>
                <link>https://medium.com/@carol/my-first-post-abc123</link>
                <pubDate>Mon, 15 Jan 2024 10:00:00 GMT</pubDate>
                <description><![CDATA[Body text here #rust]]></description>
            </item>
        </channel></rss>
    "#;

    #[test]
    fn profile_url_strips_leading_at() {
        assert_eq!(canonical_profile_url(&Platform::new(PLATFORM), "@carol"), "https://medium.com/@carol");
    }

    #[test]
    fn extracts_channel_title_and_description() {
        assert_eq!(extract_tag(&CHANNEL_TITLE_RE, FEED), Some("Carol on Medium".to_string()));
        assert_eq!(extract_tag(&CHANNEL_DESCRIPTION_RE, FEED), Some("Writing about rust".to_string()));
    }

    #[test]
    fn extracts_items_as_posts() {
        let captured: Vec<_> = ITEM_RE.captures_iter(FEED).collect();
        assert_eq!(captured.len(), 1);
        let post = to_post("carol", &captured[0][1]);
        assert_eq!(post.title.as_deref(), Some("My First Post"));
        assert!(post.created_at.is_some());
        assert_eq!(post.hashtags, vec!["rust".to_string()]);
    }
}
