//! Shared DDL and the `results` payload shape for `store_search_results`.
//!
//! Both backends carry the same six tables: the three profile/post/link
//! tables mirrored from each platform fetch, and the three identity-layer
//! tables used for cross-platform resolution. Column types differ
//! (`TIMESTAMPTZ`/`JSONB` vs `TEXT`), so the `CREATE TABLE` statements are
//! kept separately per backend rather than templated.

use osint_core::model::{AttributeType, Platform, SourceStatus};
use serde_json::Value;

/// `CREATE TABLE IF NOT EXISTS` statements run in order against Postgres.
pub const POSTGRES_DDL: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS social_media_profiles (
        id BIGSERIAL PRIMARY KEY,
        platform TEXT NOT NULL,
        username TEXT NOT NULL,
        profile_url TEXT NOT NULL,
        display_name TEXT,
        bio TEXT,
        location TEXT,
        verified BOOLEAN,
        follower_count BIGINT,
        following_count BIGINT,
        post_count BIGINT,
        profile_image_url TEXT,
        banner_image_url TEXT,
        created_at TIMESTAMPTZ,
        raw JSONB NOT NULL DEFAULT 'null',
        last_updated TIMESTAMPTZ NOT NULL,
        UNIQUE (platform, username)
    )",
    r"
    CREATE TABLE IF NOT EXISTS social_media_posts (
        id BIGSERIAL PRIMARY KEY,
        profile_id BIGINT NOT NULL REFERENCES social_media_profiles(id) ON DELETE CASCADE,
        platform TEXT NOT NULL,
        username TEXT NOT NULL,
        post_id TEXT,
        url TEXT,
        content TEXT,
        title TEXT,
        created_at TIMESTAMPTZ,
        like_count BIGINT,
        comment_count BIGINT,
        share_count BIGINT,
        view_count BIGINT,
        media_urls JSONB,
        hashtags JSONB,
        mentions JSONB,
        raw JSONB NOT NULL DEFAULT 'null'
    )",
    "CREATE INDEX IF NOT EXISTS idx_social_media_posts_profile_id ON social_media_posts (profile_id)",
    r"
    CREATE TABLE IF NOT EXISTS linked_accounts (
        id BIGSERIAL PRIMARY KEY,
        from_platform TEXT NOT NULL,
        from_username TEXT NOT NULL,
        linked_platform TEXT NOT NULL,
        linked_username TEXT NOT NULL,
        confidence DOUBLE PRECISION NOT NULL,
        evidence JSONB NOT NULL DEFAULT 'null',
        UNIQUE (from_platform, from_username, linked_platform, linked_username)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identities (
        id TEXT PRIMARY KEY,
        primary_username TEXT,
        primary_email TEXT,
        primary_phone TEXT,
        confidence_score DOUBLE PRECISION NOT NULL DEFAULT 0,
        verification_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_attributes (
        identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        attribute_type TEXT NOT NULL,
        attribute_value TEXT NOT NULL,
        attribute_value_lower TEXT NOT NULL,
        is_primary BOOLEAN NOT NULL DEFAULT false,
        is_verified BOOLEAN NOT NULL DEFAULT false,
        confidence DOUBLE PRECISION NOT NULL DEFAULT 0,
        discovered_from TEXT,
        UNIQUE (attribute_type, attribute_value_lower)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_sources (
        identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        platform TEXT NOT NULL,
        profile_url TEXT,
        status TEXT NOT NULL,
        confidence DOUBLE PRECISION NOT NULL,
        http_status INT,
        response_time_ms BIGINT,
        detection_method TEXT,
        profile_data JSONB,
        last_checked TIMESTAMPTZ NOT NULL,
        UNIQUE (identity_id, platform)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_relationships (
        from_identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        to_identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        relationship_type TEXT NOT NULL,
        evidence JSONB NOT NULL DEFAULT 'null',
        UNIQUE (from_identity_id, to_identity_id, relationship_type)
    )",
    r"
    CREATE TABLE IF NOT EXISTS search_cache (
        key TEXT PRIMARY KEY,
        search_type TEXT NOT NULL,
        results JSONB NOT NULL,
        platform_count BIGINT NOT NULL,
        duration_ms BIGINT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        hit_count BIGINT NOT NULL DEFAULT 0
    )",
];

/// `CREATE TABLE IF NOT EXISTS` statements run in order against `SQLite`.
pub const SQLITE_DDL: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS social_media_profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform TEXT NOT NULL,
        username TEXT NOT NULL,
        profile_url TEXT NOT NULL,
        display_name TEXT,
        bio TEXT,
        location TEXT,
        verified BOOLEAN,
        follower_count INTEGER,
        following_count INTEGER,
        post_count INTEGER,
        profile_image_url TEXT,
        banner_image_url TEXT,
        created_at TEXT,
        raw TEXT NOT NULL DEFAULT 'null',
        last_updated TEXT NOT NULL,
        UNIQUE (platform, username)
    )",
    r"
    CREATE TABLE IF NOT EXISTS social_media_posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL REFERENCES social_media_profiles(id) ON DELETE CASCADE,
        platform TEXT NOT NULL,
        username TEXT NOT NULL,
        post_id TEXT,
        url TEXT,
        content TEXT,
        title TEXT,
        created_at TEXT,
        like_count INTEGER,
        comment_count INTEGER,
        share_count INTEGER,
        view_count INTEGER,
        media_urls TEXT,
        hashtags TEXT,
        mentions TEXT,
        raw TEXT NOT NULL DEFAULT 'null'
    )",
    "CREATE INDEX IF NOT EXISTS idx_social_media_posts_profile_id ON social_media_posts (profile_id)",
    r"
    CREATE TABLE IF NOT EXISTS linked_accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_platform TEXT NOT NULL,
        from_username TEXT NOT NULL,
        linked_platform TEXT NOT NULL,
        linked_username TEXT NOT NULL,
        confidence REAL NOT NULL,
        evidence TEXT NOT NULL DEFAULT 'null',
        UNIQUE (from_platform, from_username, linked_platform, linked_username)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identities (
        id TEXT PRIMARY KEY,
        primary_username TEXT,
        primary_email TEXT,
        primary_phone TEXT,
        confidence_score REAL NOT NULL DEFAULT 0,
        verification_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_attributes (
        identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        attribute_type TEXT NOT NULL,
        attribute_value TEXT NOT NULL,
        attribute_value_lower TEXT NOT NULL,
        is_primary BOOLEAN NOT NULL DEFAULT 0,
        is_verified BOOLEAN NOT NULL DEFAULT 0,
        confidence REAL NOT NULL DEFAULT 0,
        discovered_from TEXT,
        UNIQUE (attribute_type, attribute_value_lower)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_sources (
        identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        platform TEXT NOT NULL,
        profile_url TEXT,
        status TEXT NOT NULL,
        confidence REAL NOT NULL,
        http_status INTEGER,
        response_time_ms INTEGER,
        detection_method TEXT,
        profile_data TEXT,
        last_checked TEXT NOT NULL,
        UNIQUE (identity_id, platform)
    )",
    r"
    CREATE TABLE IF NOT EXISTS identity_relationships (
        from_identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        to_identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
        relationship_type TEXT NOT NULL,
        evidence TEXT NOT NULL DEFAULT 'null',
        UNIQUE (from_identity_id, to_identity_id, relationship_type)
    )",
    r"
    CREATE TABLE IF NOT EXISTS search_cache (
        key TEXT PRIMARY KEY,
        search_type TEXT NOT NULL,
        results TEXT NOT NULL,
        platform_count INTEGER NOT NULL,
        duration_ms INTEGER NOT NULL,
        expires_at TEXT NOT NULL,
        hit_count INTEGER NOT NULL DEFAULT 0
    )",
];

/// Map a `store_search_results`/`cache_search_results` `search_type` string
/// onto the closed attribute-kind enum. Unrecognized values fall back to
/// [`AttributeType::Other`] rather than erroring, since the store is not the
/// layer responsible for validating search input.
#[must_use]
pub fn attribute_type(search_type: &str) -> AttributeType {
    match search_type {
        "username" => AttributeType::Username,
        "email" => AttributeType::Email,
        "phone" => AttributeType::Phone,
        _ => AttributeType::Other,
    }
}

/// One element of the `results` array passed to `store_search_results`:
/// the per-platform outcome of a single fan-out check.
pub struct SourceRecord {
    /// Platform checked.
    pub platform: Platform,
    /// Profile URL produced for the check, if any.
    pub profile_url: Option<String>,
    /// Outcome of the check.
    pub status: SourceStatus,
    /// Confidence contributed by this source in `[0, 1]`.
    pub confidence: f64,
    /// HTTP status observed, if applicable.
    pub http_status: Option<u16>,
    /// Response latency in milliseconds.
    pub response_time_ms: Option<u64>,
    /// How the match was made, if recorded.
    pub detection_method: Option<String>,
    /// Opaque profile data captured at check time.
    pub profile_data: Option<Value>,
}

/// Parse the `results` JSON array into [`SourceRecord`]s. Each element is
/// expected to carry `platform` and `status`; everything else is optional
/// and defaults conservatively (confidence 0, no timing, no method).
#[must_use]
pub fn parse_source_records(results: &Value) -> Vec<SourceRecord> {
    let Some(items) = results.as_array() else { return Vec::new() };
    items.iter().filter_map(parse_one).collect()
}

fn parse_one(item: &Value) -> Option<SourceRecord> {
    let platform = item.get("platform")?.as_str()?;
    let status = match item.get("status").and_then(Value::as_str).unwrap_or("unknown") {
        "found" => SourceStatus::Found,
        "not_found" => SourceStatus::NotFound,
        "timeout" => SourceStatus::Timeout,
        "error" => SourceStatus::Error,
        "blocked" => SourceStatus::Blocked,
        _ => SourceStatus::Unknown,
    };
    Some(SourceRecord {
        platform: Platform::new(platform),
        profile_url: item.get("profile_url").and_then(Value::as_str).map(str::to_string),
        status,
        confidence: item.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
        http_status: item.get("http_status").and_then(Value::as_u64).map(|v| v as u16),
        response_time_ms: item.get("response_time_ms").and_then(Value::as_u64),
        detection_method: item.get("detection_method").and_then(Value::as_str).map(str::to_string),
        profile_data: item.get("profile_data").cloned(),
    })
}

/// Confidence scores of the `Found` records, the input to the aggregate
/// confidence formula.
#[must_use]
pub fn found_confidences(sources: &[SourceRecord]) -> Vec<f64> {
    sources.iter().filter(|s| s.status == SourceStatus::Found).map(|s| s.confidence).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_type_falls_back_to_other() {
        assert_eq!(attribute_type("username"), AttributeType::Username);
        assert_eq!(attribute_type("carrier_pigeon"), AttributeType::Other);
    }

    #[test]
    fn parse_source_records_skips_malformed_entries() {
        let results = serde_json::json!([
            {"platform": "github", "status": "found", "confidence": 0.9},
            {"status": "found"},
            {"platform": "reddit", "status": "not_found"},
        ]);
        let records = parse_source_records(&results);
        assert_eq!(records.len(), 2);
        assert_eq!(found_confidences(&records), vec![0.9]);
    }
}
