//! Last-resort scrape: fetch a URL and synthesize a [`NormalizedProfile`]
//! from whatever Open Graph / Twitter Card meta tags are present.

use std::collections::HashMap;

use osint_core::error::CoreError;
use osint_core::model::{NormalizedProfile, Platform, SCRAPE_FALLBACK_KEY};
use osint_core::transport::Transport;
use scraper::{Html, Selector};
use serde_json::json;

use crate::harness::{classify_status, AdapterGuard, StatusOutcome};

/// Meta-tag keys tried, in order; the first non-empty hit of each field wins.
const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "description"];
const IMAGE_KEYS: &[&str] = &["og:image", "twitter:image"];

/// Scrape `url` for Open Graph meta tags and synthesize a minimal profile.
///
/// Returns `Ok(None)` when none of `og:title`, `og:description`, `og:image`,
/// `twitter:title`, `twitter:image`, or a plain `<meta name="description">`
/// are present, matching the "at least one is present" gate.
///
/// # Errors
///
/// Returns [`CoreError::Transient`] when the page can't be fetched at all.
/// A successful fetch with an unparseable or tag-free body is not an error;
/// it yields `Ok(None)`.
pub async fn scrape_profile<T: Transport>(
    transport: &T,
    guard: &AdapterGuard,
    platform: &Platform,
    username: &str,
    url: &str,
) -> Result<Option<NormalizedProfile>, CoreError> {
    let resp = guard.get(transport, url, &HashMap::new()).await?;
    if classify_status(&resp) != StatusOutcome::Proceed {
        return Ok(None);
    }

    let document = Html::parse_document(&resp.text);
    let meta = collect_meta(&document);

    let title = first_present(&meta, TITLE_KEYS);
    let description = first_present(&meta, DESCRIPTION_KEYS);
    let image = first_present(&meta, IMAGE_KEYS);

    if title.is_none() && description.is_none() && image.is_none() {
        return Ok(None);
    }

    let mut profile = NormalizedProfile::new(platform.clone(), username, url);
    profile.display_name = title.clone();
    profile.bio = description.clone();
    profile.profile_image_url = image.clone();
    profile.raw = json!({
        SCRAPE_FALLBACK_KEY: true,
        "og:title": title,
        "og:description": description,
        "og:image": image,
    });

    Ok(Some(profile))
}

fn collect_meta(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    let Ok(selector) = Selector::parse("meta") else {
        return meta;
    };
    for element in document.select(&selector) {
        let key = element.value().attr("property").or_else(|| element.value().attr("name"));
        let Some(key) = key else { continue };
        let Some(content) = element.value().attr("content") else { continue };
        if content.trim().is_empty() {
            continue;
        }
        meta.entry(key.to_string()).or_insert_with(|| content.to_string());
    }
    meta
}

fn first_present(meta: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| meta.get(*k).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_og_and_named_meta_tags() {
        let html = r#"
            <html><head>
                <meta property="og:title" content="Carol Danvers">
                <meta name="description" content="Pilot.">
                <meta property="og:image" content="https://example/img.jpg">
            </head></html>
        "#;
        let document = Html::parse_document(html);
        let meta = collect_meta(&document);
        assert_eq!(meta.get("og:title").map(String::as_str), Some("Carol Danvers"));
        assert_eq!(meta.get("og:image").map(String::as_str), Some("https://example/img.jpg"));
    }

    #[test]
    fn empty_content_is_ignored() {
        let html = r#"<html><head><meta property="og:title" content="  "></head></html>"#;
        let document = Html::parse_document(html);
        let meta = collect_meta(&document);
        assert!(meta.get("og:title").is_none());
    }

    #[test]
    fn title_falls_back_to_twitter_card() {
        let html = r#"<html><head><meta name="twitter:title" content="Fallback Title"></head></html>"#;
        let document = Html::parse_document(html);
        let meta = collect_meta(&document);
        assert_eq!(first_present(&meta, TITLE_KEYS), Some("Fallback Title".to_string()));
    }
}
