//! Facebook: Graph API when a token is configured, Open Graph scrape
//! otherwise. No posts source is defined for this platform.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;

use crate::harness::{classify_status, str_field, AdapterGuard, StatusOutcome};
use crate::opengraph::scrape_profile;

const PLATFORM: &str = "facebook";

/// Facebook adapter. Posts are never produced: the Graph API's feed
/// permissions aren't obtainable for arbitrary third-party usernames, and
/// there is no public posts source to fall back to.
pub struct FacebookAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> FacebookAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(200, 3600.0)) }
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for FacebookAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            let url = format!(
                "https://graph.facebook.com/{username}?fields=name,about,link,picture&access_token={token}"
            );
            let resp = self.guard.get(&self.transport, &url, &HashMap::new()).await?;
            match classify_status(&resp) {
                StatusOutcome::NotFound => return Ok(None),
                StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
                StatusOutcome::Proceed => {},
            }

            let body = resp.json()?;
            let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
            profile.display_name = str_field(&body, "name").map(str::to_string);
            profile.bio = str_field(&body, "about").map(str::to_string);
            profile.profile_image_url = body
                .get("picture")
                .and_then(|p| p.get("data"))
                .and_then(|d| str_field(d, "url"))
                .map(str::to_string);
            profile.raw = body;
            return Ok(Some(profile));
        }

        scrape_profile(&self.transport, &self.guard, &self.platform(), username, &self.profile_url(username)).await
    }

    async fn fetch_posts(&self, _username: &str, _max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedTransport, NoopCredentials};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = FacebookAdapter::new(crate::test_support::NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("carol"), "https://www.facebook.com/carol");
    }

    #[tokio::test]
    async fn no_auth_falls_back_to_og_scrape() {
        let html = r#"<html><head><meta property="og:title" content="Carol"></head></html>"#;
        let adapter = FacebookAdapter::new(FixedTransport { status: 200, body: html.to_string() }, NoopCredentials);
        let profile = adapter.fetch_profile("carol").await.unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Carol"));
    }

    #[tokio::test]
    async fn never_produces_posts() {
        let adapter = FacebookAdapter::new(crate::test_support::NoopTransport, NoopCredentials);
        assert!(adapter.fetch_posts("carol", 10).await.unwrap().is_empty());
    }
}
