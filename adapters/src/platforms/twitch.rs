//! Twitch: Helix API, authenticated with an app access token obtained via
//! the client-credentials flow and memoized for its lifetime.

use std::collections::HashMap;
use std::time::Duration;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "twitch";
const HELIX_BASE: &str = "https://api.twitch.tv/helix";
const OAUTH_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Seconds subtracted from a token's reported lifetime before it is treated
/// as expired, so a request never races a server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Twitch adapter. `client_id`/`client_secret` come from dedicated
/// configuration (`TWITCH_CLIENT_ID`/`TWITCH_CLIENT_SECRET`), not the
/// generic per-platform token rotation every other adapter uses, since the
/// credential here is the pair itself, not a list of interchangeable tokens.
pub struct TwitchAdapter<T> {
    transport: T,
    client_id: String,
    client_secret: String,
    guard: AdapterGuard,
    cached_token: Mutex<Option<CachedToken>>,
}

impl<T: Transport> TwitchAdapter<T> {
    #[must_use]
    pub fn new(transport: T, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            transport,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            guard: AdapterGuard::new(RateLimitPolicy::new(800, 60.0)),
            cached_token: Mutex::new(None),
        }
    }

    /// Return a valid app access token, refreshing it if absent or close to
    /// expiry. Single-writer: the mutex serializes concurrent callers onto
    /// one refresh rather than stampeding the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceError`] if the token endpoint refuses the
    /// client credentials.
    async fn app_token(&self) -> Result<String, CoreError> {
        let mut cached = self.cached_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let mut form = HashMap::new();
        form.insert("client_id".to_string(), self.client_id.clone());
        form.insert("client_secret".to_string(), self.client_secret.clone());
        form.insert("grant_type".to_string(), "client_credentials".to_string());

        let resp = self.guard.post_form(&self.transport, OAUTH_URL, &form, &HashMap::new()).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Err(CoreError::source(PLATFORM, format!("token refresh failed: http {}", resp.status)));
        }

        let body = resp.json()?;
        let access_token = str_field(&body, "access_token")
            .ok_or_else(|| CoreError::source(PLATFORM, "token response missing access_token"))?
            .to_string();
        let expires_in = u64_field(&body, "expires_in").unwrap_or(3600);
        let ttl = Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN);

        *cached = Some(CachedToken { access_token: access_token.clone(), expires_at: Instant::now() + ttl });
        Ok(access_token)
    }

    async fn headers(&self) -> Result<HashMap<String, String>, CoreError> {
        let token = self.app_token().await?;
        let mut headers = HashMap::new();
        headers.insert("client-id".to_string(), self.client_id.clone());
        headers.insert("authorization".to_string(), format!("Bearer {token}"));
        Ok(headers)
    }
}

impl<T: Transport + Send + Sync> SourceAdapter for TwitchAdapter<T> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let headers = self.headers().await?;
        let url = format!("{HELIX_BASE}/users?login={username}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let Some(user) = body.get("data").and_then(Value::as_array).and_then(|items| items.first()) else {
            return Ok(None);
        };

        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(user, "display_name").map(str::to_string);
        profile.bio = str_field(user, "description").map(str::to_string);
        profile.profile_image_url = str_field(user, "profile_image_url").map(str::to_string);
        profile.created_at = str_field(user, "created_at").and_then(parse_timestamp);
        profile.raw = user.clone();

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let Some(profile) = self.fetch_profile(username).await? else {
            return Ok(Vec::new());
        };
        let Some(user_id) = str_field(&profile.raw, "id").map(str::to_string) else {
            return Ok(Vec::new());
        };

        let headers = self.headers().await?;
        let url = format!("{HELIX_BASE}/videos?user_id={user_id}&first={}", max_items.min(100));
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Ok(Vec::new());
        }

        let body = resp.json()?;
        let Some(videos) = body.get("data").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(videos.iter().take(max_items).map(|video| to_post(username, video)).collect())
    }
}

fn to_post(username: &str, video: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(video, "id").map(str::to_string);
    post.title = str_field(video, "title").map(str::to_string);
    post.url = str_field(video, "url").map(str::to_string);
    post.created_at = str_field(video, "created_at").and_then(parse_timestamp);
    post.view_count = u64_field(video, "view_count");
    post.raw = video.clone();
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NoopTransport;

    #[test]
    fn profile_url_is_canonical() {
        let adapter = TwitchAdapter::new(NoopTransport, "id", "secret");
        assert_eq!(adapter.profile_url("carol"), "https://www.twitch.tv/carol");
    }
}
