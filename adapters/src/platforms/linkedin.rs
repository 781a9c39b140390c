//! LinkedIn: HTML scrape, mining JSON-LD and the page title. No posts source.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::harness::{classify_status, str_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "linkedin";

/// LinkedIn adapter. There is no public API for third-party profiles; every
/// field here comes from whatever a logged-out page render exposes, which is
/// usually just the page title and any JSON-LD `Person` block.
pub struct LinkedInAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> LinkedInAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(20, 60.0)) }
    }
}

fn json_ld_person(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&selector).find_map(|el| {
        let text = el.text().collect::<String>();
        let value: Value = serde_json::from_str(&text).ok()?;
        matches!(value.get("@type").and_then(Value::as_str), Some("Person")).then_some(value)
    })
}

fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document.select(&selector).next().map(|el| el.text().collect::<String>().trim().to_string())
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for LinkedInAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let mut headers = HashMap::new();
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("cookie".to_string(), token);
        }

        let url = self.profile_url(username);
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let person = json_ld_person(&resp.text);
        let title = page_title(&resp.text);

        if person.is_none() && title.is_none() {
            return Ok(None);
        }

        let mut profile = NormalizedProfile::new(self.platform(), username, url);
        if let Some(person) = &person {
            profile.display_name = str_field(person, "name").map(str::to_string).or(title.clone());
            profile.bio = str_field(person, "description").map(str::to_string);
            profile.profile_image_url = str_field(person, "image").map(str::to_string);
            profile.raw = person.clone();
        } else {
            profile.display_name = title;
        }

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, _username: &str, _max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedTransport, NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = LinkedInAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("bob-smith"), "https://www.linkedin.com/in/bob-smith/");
    }

    #[test]
    fn extracts_json_ld_person() {
        let html = r#"<html><head><script type="application/ld+json">{"@type":"Person","name":"Bob Smith"}</script></head></html>"#;
        let person = json_ld_person(html).unwrap();
        assert_eq!(person.get("name").and_then(Value::as_str), Some("Bob Smith"));
    }

    #[test]
    fn ignores_non_person_json_ld_blocks() {
        let html = r#"<html><head><script type="application/ld+json">{"@type":"Organization"}</script></head></html>"#;
        assert!(json_ld_person(html).is_none());
    }

    #[tokio::test]
    async fn falls_back_to_title_without_json_ld() {
        let html = "<html><head><title>Bob Smith | LinkedIn</title></head></html>";
        let adapter = LinkedInAdapter::new(FixedTransport { status: 200, body: html.to_string() }, NoopCredentials);
        let profile = adapter.fetch_profile("bob-smith").await.unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Bob Smith | LinkedIn"));
    }
}
