//! Deriving `LinkedAccount` candidates from a profile and its posts.

use std::collections::HashMap;

use osint_core::extraction;
use osint_core::model::{LinkedAccount, NormalizedPost, NormalizedProfile, Platform};
use serde_json::Value;

/// Confidence assigned to a link discovered from an explicit URL.
pub const URL_CONFIDENCE: f64 = 0.7;
/// Confidence assigned to a link discovered from an `@mention`.
pub const MENTION_CONFIDENCE: f64 = 0.35;

/// Platforms a bare `@mention` is speculatively checked against, since a
/// mention alone carries no host to disambiguate it.
const LIKELY_MENTION_PLATFORMS: &[&str] = &["twitter", "instagram", "tiktok", "github", "twitch"];

/// Derive `LinkedAccount` candidates from `profile` and its `posts`.
///
/// Deterministic given the same inputs; the result is deduplicated by
/// `(linked_platform, lowercase(linked_username))`, keeping the
/// highest-confidence record per key.
#[must_use]
pub fn discover_linked_accounts(profile: &NormalizedProfile, posts: &[NormalizedPost]) -> Vec<LinkedAccount> {
    let mut best: HashMap<(Platform, String), LinkedAccount> = HashMap::new();

    for url in mined_urls(profile, posts) {
        let Some(platform) = extraction::identify_platform(&url) else { continue };
        if platform == profile.platform {
            continue;
        }
        let Some(username) = extraction::username_from_url(&platform, &url) else { continue };
        if username.is_empty() {
            continue;
        }

        let edge = LinkedAccount {
            from_platform: profile.platform.clone(),
            from_username: profile.username.clone(),
            linked_platform: platform,
            linked_username: username,
            confidence: URL_CONFIDENCE,
            evidence: serde_json::json!({ "url": url }),
        };
        upsert_best(&mut best, edge);
    }

    for mention in mined_mentions(profile, posts) {
        for platform_name in LIKELY_MENTION_PLATFORMS {
            if *platform_name == profile.platform.as_str() {
                continue;
            }
            let edge = LinkedAccount {
                from_platform: profile.platform.clone(),
                from_username: profile.username.clone(),
                linked_platform: Platform::new(*platform_name),
                linked_username: mention.clone(),
                confidence: MENTION_CONFIDENCE,
                evidence: serde_json::json!({ "mention": mention }),
            };
            upsert_best(&mut best, edge);
        }
    }

    let mut edges: Vec<LinkedAccount> = best.into_values().collect();
    edges.sort_by(|a, b| {
        (a.linked_platform.as_str(), a.linked_username.as_str())
            .cmp(&(b.linked_platform.as_str(), b.linked_username.as_str()))
    });
    edges
}

fn upsert_best(best: &mut HashMap<(Platform, String), LinkedAccount>, edge: LinkedAccount) {
    let key = edge.dedup_key();
    best.entry(key)
        .and_modify(|existing| {
            if edge.confidence > existing.confidence {
                *existing = edge.clone();
            }
        })
        .or_insert(edge);
}

fn mined_urls(profile: &NormalizedProfile, posts: &[NormalizedPost]) -> Vec<String> {
    let mut urls = Vec::new();

    if let Some(bio) = &profile.bio {
        urls.extend(extraction::urls(bio));
    }
    urls.extend(extraction::urls(&profile.profile_url));
    collect_string_urls(&profile.raw, &mut urls);

    for post in posts {
        if let Some(content) = &post.content {
            urls.extend(extraction::urls(content));
        }
        if let Some(url) = &post.url {
            urls.extend(extraction::urls(url));
        }
    }

    urls.sort();
    urls.dedup();
    urls
}

fn mined_mentions(profile: &NormalizedProfile, posts: &[NormalizedPost]) -> Vec<String> {
    let mut mentions = Vec::new();
    if let Some(bio) = &profile.bio {
        mentions.extend(extraction::mentions(bio));
    }
    for post in posts {
        if let Some(content) = &post.content {
            mentions.extend(extraction::mentions(content));
        }
    }
    mentions.sort();
    mentions.dedup();
    mentions
}

/// Recursively walk a JSON tree, mining URLs from every string leaf.
fn collect_string_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(extraction::urls(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_string_urls(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_string_urls(v, out)),
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_a_github_link_from_bio() {
        let mut profile = NormalizedProfile::new("twitter", "alice", "https://x.com/alice");
        profile.bio = Some("Find me on https://github.com/alice".to_string());

        let edges = discover_linked_accounts(&profile, &[]);
        assert!(edges.iter().any(|e| e.linked_platform.as_str() == "github"
            && e.linked_username == "alice"
            && (e.confidence - URL_CONFIDENCE).abs() < f64::EPSILON));
    }

    #[test]
    fn skips_links_to_the_same_platform() {
        let mut profile = NormalizedProfile::new("github", "octocat", "https://github.com/octocat");
        profile.bio = Some("See also https://github.com/octocat/repo".to_string());

        let edges = discover_linked_accounts(&profile, &[]);
        assert!(edges.is_empty());
    }

    #[test]
    fn mentions_fan_out_to_likely_platforms_excluding_source() {
        let mut profile = NormalizedProfile::new("github", "octocat", "https://github.com/octocat");
        profile.bio = Some("also @octocat elsewhere".to_string());

        let edges = discover_linked_accounts(&profile, &[]);
        let platforms: Vec<&str> = edges.iter().map(|e| e.linked_platform.as_str()).collect();
        assert!(!platforms.contains(&"github"));
        assert!(platforms.contains(&"twitter"));
        assert!(platforms.contains(&"twitch"));
    }

    #[test]
    fn deduplicates_keeping_max_confidence() {
        let mut profile = NormalizedProfile::new("reddit", "alice", "https://www.reddit.com/user/alice/");
        profile.bio = Some("https://github.com/alice also @alice".to_string());

        let edges = discover_linked_accounts(&profile, &[]);
        let github_edges: Vec<_> = edges
            .iter()
            .filter(|e| e.linked_platform.as_str() == "github" && e.linked_username == "alice")
            .collect();
        assert_eq!(github_edges.len(), 1);
        assert!((github_edges[0].confidence - URL_CONFIDENCE).abs() < f64::EPSILON);
    }
}
