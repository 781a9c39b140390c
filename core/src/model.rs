//! Canonical domain types shared by every layer of the aggregation engine.
//!
//! Everything here is plain data: adapters produce it, the extraction and
//! matching layers consume it, and the store crates persist it. None of
//! these types know how they are fetched or where they are stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The set of platforms a [`crate::adapter::SourceAdapter`] can target.
///
/// Kept as a string newtype rather than a closed enum: new platforms are
/// added by registering an adapter, not by extending this type, and the
/// extraction layer frequently needs to carry platform names it has never
/// seen a concrete adapter for (e.g. a linked account discovered on a host
/// nobody has written an adapter for yet).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Platform(pub String);

impl Platform {
    /// Build a platform identifier, lowercasing for canonical comparisons.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_lowercase())
    }

    /// Borrow the platform name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A platform-agnostic view of a social / code-hosting profile.
///
/// `(platform, username)` is the composite identity. `username` is stored
/// lowercased for lookups; the verbatim casing from the source is preserved
/// in `display_name` or the original adapter call, never reconstructed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProfile {
    /// Source platform, e.g. `"github"`.
    pub platform: Platform,
    /// Lowercased handle used as the lookup key.
    pub username: String,
    /// Canonical profile URL, as produced by `SourceAdapter::profile_url`.
    pub profile_url: String,
    /// Display name as shown by the source, verbatim casing.
    pub display_name: Option<String>,
    /// Free-text biography / about section.
    pub bio: Option<String>,
    /// Self-reported location string.
    pub location: Option<String>,
    /// Whether the source marks this account as verified.
    pub verified: Option<bool>,
    /// Follower count, when the source exposes it.
    pub follower_count: Option<u64>,
    /// Following count, when the source exposes it.
    pub following_count: Option<u64>,
    /// Total post / content count, when the source exposes it.
    pub post_count: Option<u64>,
    /// Avatar / profile image URL.
    pub profile_image_url: Option<String>,
    /// Banner / header image URL.
    pub banner_image_url: Option<String>,
    /// Account creation timestamp, when parseable.
    pub created_at: Option<DateTime<Utc>>,
    /// Opaque source payload, kept verbatim for downstream mining.
    pub raw: Value,
}

impl NormalizedProfile {
    /// Start building a profile for `(platform, username)` with nothing else filled in.
    ///
    /// `profile_url` must be supplied by the caller since it is platform-specific
    /// (see `SourceAdapter::profile_url`); this constructor only normalizes the key.
    #[must_use]
    pub fn new(platform: impl Into<Platform>, username: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            username: username.into().to_lowercase(),
            profile_url: profile_url.into(),
            display_name: None,
            bio: None,
            location: None,
            verified: None,
            follower_count: None,
            following_count: None,
            post_count: None,
            profile_image_url: None,
            banner_image_url: None,
            created_at: None,
            raw: Value::Null,
        }
    }
}

/// A single piece of content (tweet, submission, video, article, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPost {
    /// Source platform this post came from.
    pub platform: Platform,
    /// Owning account's lowercased handle.
    pub username: String,
    /// Source-native post identifier, when the source has one.
    pub post_id: Option<String>,
    /// Canonical URL of the post.
    pub url: Option<String>,
    /// Post body / caption text.
    pub content: Option<String>,
    /// Title, for platforms that separate title from body.
    pub title: Option<String>,
    /// Publication timestamp, when parseable.
    pub created_at: Option<DateTime<Utc>>,
    /// Like / upvote count.
    pub like_count: Option<u64>,
    /// Comment / reply count.
    pub comment_count: Option<u64>,
    /// Share / repost count.
    pub share_count: Option<u64>,
    /// View / play count.
    pub view_count: Option<u64>,
    /// Attached media URLs.
    pub media_urls: Vec<String>,
    /// Hashtags mined from the content.
    pub hashtags: Vec<String>,
    /// Mentions mined from the content.
    pub mentions: Vec<String>,
    /// Opaque source payload.
    pub raw: Value,
}

impl NormalizedPost {
    /// Start building a post owned by `(platform, username)`.
    #[must_use]
    pub fn new(platform: impl Into<Platform>, username: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            username: username.into().to_lowercase(),
            post_id: None,
            url: None,
            content: None,
            title: None,
            created_at: None,
            like_count: None,
            comment_count: None,
            share_count: None,
            view_count: None,
            media_urls: Vec::new(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            raw: Value::Null,
        }
    }
}

/// A directed edge asserting that one account is linked to another.
///
/// The edge key `(from_platform, from_username, linked_platform, linked_username)`
/// is unique; on collision the higher-confidence record wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Platform of the account the link was discovered on.
    pub from_platform: Platform,
    /// Lowercased handle of the account the link was discovered on.
    pub from_username: String,
    /// Platform the link points to.
    pub linked_platform: Platform,
    /// Lowercased handle the link points to.
    pub linked_username: String,
    /// Confidence in `[0, 1]` that the link is genuine.
    pub confidence: f64,
    /// Evidence for the link, e.g. `{"url": "..."}` or `{"mention": "..."}`.
    pub evidence: Value,
}

impl LinkedAccount {
    /// The dedup key: `(linked_platform, lowercased linked_username)`.
    #[must_use]
    pub fn dedup_key(&self) -> (Platform, String) {
        (self.linked_platform.clone(), self.linked_username.to_lowercase())
    }
}

/// The kind of value an [`IdentityAttribute`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A platform handle.
    Username,
    /// An email address.
    Email,
    /// A phone number.
    Phone,
    /// Any other attribute kind (full name, alias, ...).
    Other,
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Status of a per-platform check performed while resolving an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The platform confirmed the account exists.
    Found,
    /// The platform confirmed the account does not exist.
    NotFound,
    /// The check timed out.
    Timeout,
    /// The check raised a non-recoverable error.
    Error,
    /// The platform is believed to be blocking automated checks.
    Blocked,
    /// Outcome could not be determined.
    Unknown,
}

/// The kind of relationship recorded between two identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Strong evidence the two identities are the same person/entity.
    SamePerson,
    /// The identities are linked but not necessarily the same entity.
    Linked,
    /// Weak, unconfirmed association.
    Possible,
}

/// An aggregated person/entity built up from matches across platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Surrogate identifier assigned by the store.
    pub id: String,
    /// Primary username, if one has been selected.
    pub primary_username: Option<String>,
    /// Primary email, if one has been selected.
    pub primary_email: Option<String>,
    /// Primary phone, if one has been selected.
    pub primary_phone: Option<String>,
    /// Aggregate confidence in `[0, 1]`.
    pub confidence_score: f64,
    /// Number of sources that have contributed evidence.
    pub verification_count: u32,
    /// When the identity was first created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A single attribute value attached to an [`Identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAttribute {
    /// Owning identity id.
    pub identity_id: String,
    /// The kind of attribute.
    pub attribute_type: AttributeType,
    /// Verbatim attribute value.
    pub attribute_value: String,
    /// Lowercased value, used as the uniqueness key alongside `attribute_type`.
    pub attribute_value_lower: String,
    /// Whether this is the identity's primary value of this type.
    pub is_primary: bool,
    /// Whether the attribute has been independently verified.
    pub is_verified: bool,
    /// Confidence in `[0, 1]` for this specific attribute.
    pub confidence: f64,
    /// Platform or process the attribute was discovered from.
    pub discovered_from: Option<String>,
}

/// One row per platform check performed against an [`Identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySource {
    /// Owning identity id.
    pub identity_id: String,
    /// Platform checked.
    pub platform: Platform,
    /// Profile URL produced for the check.
    pub profile_url: Option<String>,
    /// Outcome of the check.
    pub status: SourceStatus,
    /// Confidence contributed by this source in `[0, 1]`.
    pub confidence: f64,
    /// HTTP status observed, if applicable.
    pub http_status: Option<u16>,
    /// Response latency in milliseconds.
    pub response_time_ms: Option<u64>,
    /// How the match was made (exact, variation, fuzzy, ...).
    pub detection_method: Option<String>,
    /// Opaque profile data captured at check time.
    pub profile_data: Option<Value>,
    /// When this source was last checked.
    pub last_checked: DateTime<Utc>,
}

/// A relationship recorded between two identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRelationship {
    /// Identity the relationship originates from.
    pub from_identity_id: String,
    /// Identity the relationship points to.
    pub to_identity_id: String,
    /// Kind of relationship.
    pub relationship_type: RelationshipType,
    /// Supporting evidence.
    pub evidence: Value,
}

/// A persisted, time-bound bundle of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCache {
    /// Cache key, typically `(search_type, identifier)` joined.
    pub key: String,
    /// The kind of search this bundle came from.
    pub search_type: String,
    /// Raw results payload.
    pub results: Value,
    /// Number of distinct platforms represented in `results`.
    pub platform_count: u32,
    /// How long the original search took, in milliseconds.
    pub duration_ms: u64,
    /// When this entry expires.
    pub expires_at: DateTime<Utc>,
    /// Number of times this entry has been served from cache.
    pub hit_count: u64,
}

/// Tags an extracted or synthesized [`NormalizedProfile`]'s provenance.
///
/// Adapters that fall back to Open Graph scraping stamp this onto `raw` so
/// downstream consumers can tell a best-effort scrape from a real API hit.
pub const SCRAPE_FALLBACK_KEY: &str = "scrape_fallback";

/// Convenience for building a `BTreeMap`-backed JSON object, used by adapters
/// assembling `raw` payloads from scraped fragments rather than a native JSON body.
#[must_use]
pub fn raw_object(fields: BTreeMap<String, Value>) -> Value {
    Value::Object(fields.into_iter().collect())
}
