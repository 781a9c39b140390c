//! Pure, regex-based mining of free text and URLs.
//!
//! Every function here is a pure string -> data transform: no I/O, no
//! fallible parsing that can panic. Per the failure semantics, no source
//! string is ever allowed to raise — timestamp and URL parsing failures
//! are swallowed and simply excluded from the result.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::model::Platform;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?:https?://|www\.)[^\s<>\[\]\x22\x27]+").unwrap()
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\+?\d[\d\s().-]{5,}\d").unwrap()
});

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"#[A-Za-z0-9_]{2,100}").unwrap()
});

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"@[A-Za-z0-9_.]{2,50}").unwrap()
});

/// Known social/code-host domains, mapped to the platform name `identify_platform`
/// returns. Kept as a flat table rather than per-adapter logic so link discovery
/// can classify a URL without depending on any concrete adapter.
const KNOWN_PLATFORM_DOMAINS: &[(&str, &str)] = &[
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("reddit.com", "reddit"),
    ("instagram.com", "instagram"),
    ("tiktok.com", "tiktok"),
    ("facebook.com", "facebook"),
    ("linkedin.com", "linkedin"),
    ("youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("github.com", "github"),
    ("medium.com", "medium"),
    ("bsky.app", "bluesky"),
    ("discord.com", "discord"),
    ("discord.gg", "discord"),
    ("twitch.tv", "twitch"),
];

/// Extract and return sorted, deduplicated, lowercased email addresses.
#[must_use]
pub fn emails(text: &str) -> Vec<String> {
    let mut found: Vec<String> = EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Extract and return sorted, deduplicated URLs. Bare `www.` matches are
/// normalized to carry an explicit `https://` scheme.
#[must_use]
pub fn urls(text: &str) -> Vec<String> {
    let mut found: Vec<String> = URL_RE
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str().trim_end_matches(|c: char| ".,;:!?)\"'".contains(c));
            if raw.starts_with("www.") {
                format!("https://{raw}")
            } else {
                raw.to_string()
            }
        })
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Extract and return sorted, deduplicated phone-number candidates: runs of
/// digits (with separators) containing at least 7 digits.
///
/// The original implementation normalizes to E.164 via a phone-number
/// library when one is available. No such library is part of this crate's
/// dependency stack, so candidates are kept verbatim once they clear the
/// digit-count bar.
#[must_use]
pub fn phones(text: &str) -> Vec<String> {
    let mut found: Vec<String> = PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|candidate| candidate.chars().filter(char::is_ascii_digit).count() >= 7)
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Extract and return sorted, deduplicated `#hashtags`, without the leading `#`.
#[must_use]
pub fn hashtags(text: &str) -> Vec<String> {
    let mut found: Vec<String> = HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str()[1..].to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Extract and return sorted, deduplicated `@mentions`, without the leading `@`.
#[must_use]
pub fn mentions(text: &str) -> Vec<String> {
    let mut found: Vec<String> = MENTION_RE
        .find_iter(text)
        .map(|m| m.as_str()[1..].to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Classify a URL's host against the known platform table.
///
/// Hosts that expose a `/@user`-shaped path on an otherwise unrecognized
/// domain are tagged `mastodon`, since that path convention is specific to
/// the ActivityPub fediverse and self-hosted instances vastly outnumber any
/// fixed domain list.
#[must_use]
pub fn identify_platform(url: &str) -> Option<Platform> {
    let parsed = parse_url(url)?;
    let host = parsed.host_str()?.trim_start_matches("www.");

    for (domain, platform) in KNOWN_PLATFORM_DOMAINS {
        if host == *domain || host.ends_with(&format!(".{domain}")) {
            return Some(Platform::new(*platform));
        }
    }

    if parsed.path().starts_with("/@") {
        return Some(Platform::new("mastodon"));
    }

    None
}

/// Parse a URL that may be missing its scheme (bare `www.` or bare domain).
fn parse_url(url: &str) -> Option<Url> {
    Url::parse(url)
        .or_else(|_| Url::parse(&format!("https://{url}")))
        .ok()
}

/// Pull a platform handle out of a URL whose host has already been
/// classified by [`identify_platform`].
///
/// Returns `None` when the platform's path shape isn't recognized, which is
/// treated as "no username extractable" by callers rather than an error.
#[must_use]
pub fn username_from_url(platform: &Platform, url: &str) -> Option<String> {
    let parsed = parse_url(url)?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match platform.as_str() {
        "reddit" => match segments.as_slice() {
            ["user" | "u", name, ..] => Some((*name).to_string()),
            _ => None,
        },
        "linkedin" => match segments.as_slice() {
            ["in", name, ..] => Some((*name).to_string()),
            _ => None,
        },
        "youtube" => match segments.first() {
            Some(seg) if seg.starts_with('@') => Some(seg[1..].to_string()),
            Some(&("c" | "user")) => segments.get(1).map(|s| (*s).to_string()),
            _ => None,
        },
        "medium" => segments.first().map(|seg| seg.trim_start_matches('@').to_string()),
        "mastodon" => segments
            .first()
            .filter(|seg| seg.starts_with('@'))
            .map(|seg| seg[1..].to_string()),
        "discord" => match segments.as_slice() {
            ["users", id] => Some((*id).to_string()),
            _ => None,
        },
        "twitter" | "instagram" | "tiktok" | "facebook" | "github" | "twitch" | "bluesky" => {
            segments.first().map(|seg| seg.trim_start_matches('@').to_string())
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_lowercased_emails() {
        let out = emails("Contact: test@example.com and TEST@example.com.");
        assert_eq!(out, vec!["test@example.com".to_string()]);
    }

    #[test]
    fn extracts_sorted_deduplicated_urls() {
        let out = urls("See https://github.com/foo and www.twitter.com/bar");
        assert!(out.contains(&"https://github.com/foo".to_string()));
        assert!(out.contains(&"https://www.twitter.com/bar".to_string()));
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(out, sorted);
    }

    #[test]
    fn phone_candidates_require_seven_digits() {
        assert!(phones("call 555-1234").is_empty());
        assert_eq!(phones("call 415-555-1234"), vec!["415-555-1234".to_string()]);
    }

    #[test]
    fn hashtags_strip_leading_hash() {
        assert_eq!(hashtags("loving #rustlang and #osint2024"), vec!["osint2024", "rustlang"]);
    }

    #[test]
    fn mentions_strip_leading_at() {
        assert_eq!(mentions("ping @alice_w and @bob.dev"), vec!["alice_w", "bob.dev"]);
    }

    #[test]
    fn identifies_known_platforms() {
        assert_eq!(identify_platform("https://github.com/octocat"), Some(Platform::new("github")));
        assert_eq!(identify_platform("https://x.com/alice"), Some(Platform::new("twitter")));
        assert_eq!(identify_platform("https://example.social/@carol"), Some(Platform::new("mastodon")));
        assert_eq!(identify_platform("https://example.com/nope"), None);
    }

    #[test]
    fn extracts_platform_specific_usernames() {
        assert_eq!(
            username_from_url(&Platform::new("reddit"), "https://www.reddit.com/user/alice/"),
            Some("alice".to_string())
        );
        assert_eq!(
            username_from_url(&Platform::new("linkedin"), "https://www.linkedin.com/in/bob-smith/"),
            Some("bob-smith".to_string())
        );
        assert_eq!(
            username_from_url(&Platform::new("youtube"), "https://www.youtube.com/@carol"),
            Some("carol".to_string())
        );
        assert_eq!(
            username_from_url(&Platform::new("medium"), "https://medium.com/@dave"),
            Some("dave".to_string())
        );
    }
}
