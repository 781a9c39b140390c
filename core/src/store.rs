//! The `RelationalStore` boundary.
//!
//! Modeled as a trait with a concrete implementation selected once at
//! construction time (embedded single-file backend or a server backend),
//! never switched per call. See `osint-store` for the `sqlx`-backed
//! implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{Identity, LinkedAccount, NormalizedPost, NormalizedProfile, Platform, SearchCache};

/// A profile row as returned by the store, carrying surrogate identity.
#[derive(Debug, Clone)]
pub struct StoredProfile {
    /// Surrogate row id.
    pub id: i64,
    /// The normalized profile as stored.
    pub profile: NormalizedProfile,
    /// Last time this row was written.
    pub last_updated: DateTime<Utc>,
}

/// Profiles, posts, linked accounts, and the identity-resolution tables.
pub trait RelationalStore: Send + Sync {
    /// Insert-or-update a profile by `(platform, username)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn upsert_profile(
        &self,
        profile: &NormalizedProfile,
    ) -> impl std::future::Future<Output = Result<StoredProfile, CoreError>> + Send;

    /// Replace a profile's posts as a set, inside a single transaction.
    /// `posts` may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn replace_posts(
        &self,
        profile_id: i64,
        posts: &[NormalizedPost],
    ) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;

    /// Replace the linked accounts discovered from `(from_platform, from_username)`
    /// as a set, inside a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn replace_linked_accounts(
        &self,
        from_platform: &Platform,
        from_username: &str,
        accounts: &[LinkedAccount],
    ) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;

    /// Look up a stored profile.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn get_profile(
        &self,
        platform: &Platform,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<StoredProfile>, CoreError>> + Send;

    /// Page over a profile's posts in descending insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn get_posts(
        &self,
        profile_id: i64,
        offset: u32,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<NormalizedPost>, CoreError>> + Send;

    /// Fetch linked accounts in descending confidence order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn get_linked_accounts(
        &self,
        from_platform: &Platform,
        from_username: &str,
    ) -> impl std::future::Future<Output = Result<Vec<LinkedAccount>, CoreError>> + Send;

    /// Find-or-create an `Identity` by `(attribute_type, lower(value))`, record
    /// one `IdentitySource` row per result, and recompute `confidence_score`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn store_search_results(
        &self,
        identifier: &str,
        search_type: &str,
        results: &Value,
        duration_ms: u64,
    ) -> impl std::future::Future<Output = Result<Identity, CoreError>> + Send;

    /// Persist a search-results bundle under `key` with a `ttl_hours` expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn cache_search_results(
        &self,
        key: &str,
        search_type: &str,
        results: &Value,
        platform_count: u32,
        duration_ms: u64,
        ttl_hours: i64,
    ) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;

    /// Fetch a cached bundle, provided it has not expired. Bumps `hit_count` on a hit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on any persistence failure.
    fn get_cached_results(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<SearchCache>, CoreError>> + Send;
}
