//! # OSINT Store
//!
//! [`osint_core::store::RelationalStore`] implemented over two backends:
//! embedded `SQLite` ([`sqlite::SqliteStore`]) for a single-node deployment,
//! and server-backed `PostgreSQL` ([`postgres::PostgresStore`]) for anything
//! larger. The backend is chosen once, at construction
//! ([`Store::from_env`] or [`Store::connect`]), never per call.
//!
//! `RelationalStore` declares its methods as `async fn`, which makes the
//! trait object-incompatible. [`Store`] is therefore a closed enum over the
//! two concrete backends rather than a `Box<dyn RelationalStore>`; its own
//! `RelationalStore` impl just matches and delegates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod postgres;
pub mod schema;
pub mod sqlite;

use osint_core::error::CoreError;
use osint_core::model::{Identity, LinkedAccount, NormalizedPost, NormalizedProfile, Platform, SearchCache};
use osint_core::store::{RelationalStore, StoredProfile};
use serde_json::Value;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Default path for the embedded `SQLite` database when
/// `SOCIAL_MEDIA_SQLITE_PATH` is unset.
pub const DEFAULT_SQLITE_PATH: &str = "/tmp/social_media.sqlite";

/// The relational store, backed by whichever of the two concrete
/// implementations was selected at construction.
#[derive(Clone)]
pub enum Store {
    /// Server-backed `PostgreSQL`.
    Postgres(PostgresStore),
    /// Embedded, single-file `SQLite`.
    Sqlite(SqliteStore),
}

impl Store {
    /// Select a backend from the process environment: `DATABASE_URL` or
    /// `POSTGRES_DSN` (checked in that order) selects `PostgreSQL`;
    /// otherwise an embedded `SQLite` file is opened at
    /// `SOCIAL_MEDIA_SQLITE_PATH`, defaulting to [`DEFAULT_SQLITE_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the selected backend fails to connect.
    pub async fn from_env() -> Result<Self, CoreError> {
        if let Ok(dsn) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("POSTGRES_DSN")) {
            return Ok(Self::Postgres(PostgresStore::connect(&dsn).await?));
        }
        let path = std::env::var("SOCIAL_MEDIA_SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());
        Ok(Self::Sqlite(SqliteStore::open(&path).await?))
    }
}

impl RelationalStore for Store {
    async fn upsert_profile(&self, profile: &NormalizedProfile) -> Result<StoredProfile, CoreError> {
        match self {
            Self::Postgres(store) => store.upsert_profile(profile).await,
            Self::Sqlite(store) => store.upsert_profile(profile).await,
        }
    }

    async fn replace_posts(&self, profile_id: i64, posts: &[NormalizedPost]) -> Result<(), CoreError> {
        match self {
            Self::Postgres(store) => store.replace_posts(profile_id, posts).await,
            Self::Sqlite(store) => store.replace_posts(profile_id, posts).await,
        }
    }

    async fn replace_linked_accounts(
        &self,
        from_platform: &Platform,
        from_username: &str,
        accounts: &[LinkedAccount],
    ) -> Result<(), CoreError> {
        match self {
            Self::Postgres(store) => store.replace_linked_accounts(from_platform, from_username, accounts).await,
            Self::Sqlite(store) => store.replace_linked_accounts(from_platform, from_username, accounts).await,
        }
    }

    async fn get_profile(&self, platform: &Platform, username: &str) -> Result<Option<StoredProfile>, CoreError> {
        match self {
            Self::Postgres(store) => store.get_profile(platform, username).await,
            Self::Sqlite(store) => store.get_profile(platform, username).await,
        }
    }

    async fn get_posts(&self, profile_id: i64, offset: u32, limit: u32) -> Result<Vec<NormalizedPost>, CoreError> {
        match self {
            Self::Postgres(store) => store.get_posts(profile_id, offset, limit).await,
            Self::Sqlite(store) => store.get_posts(profile_id, offset, limit).await,
        }
    }

    async fn get_linked_accounts(&self, from_platform: &Platform, from_username: &str) -> Result<Vec<LinkedAccount>, CoreError> {
        match self {
            Self::Postgres(store) => store.get_linked_accounts(from_platform, from_username).await,
            Self::Sqlite(store) => store.get_linked_accounts(from_platform, from_username).await,
        }
    }

    async fn store_search_results(
        &self,
        identifier: &str,
        search_type: &str,
        results: &Value,
        duration_ms: u64,
    ) -> Result<Identity, CoreError> {
        match self {
            Self::Postgres(store) => store.store_search_results(identifier, search_type, results, duration_ms).await,
            Self::Sqlite(store) => store.store_search_results(identifier, search_type, results, duration_ms).await,
        }
    }

    async fn cache_search_results(
        &self,
        key: &str,
        search_type: &str,
        results: &Value,
        platform_count: u32,
        duration_ms: u64,
        ttl_hours: i64,
    ) -> Result<(), CoreError> {
        match self {
            Self::Postgres(store) => store.cache_search_results(key, search_type, results, platform_count, duration_ms, ttl_hours).await,
            Self::Sqlite(store) => store.cache_search_results(key, search_type, results, platform_count, duration_ms, ttl_hours).await,
        }
    }

    async fn get_cached_results(&self, key: &str) -> Result<Option<SearchCache>, CoreError> {
        match self {
            Self::Postgres(store) => store.get_cached_results(key).await,
            Self::Sqlite(store) => store.get_cached_results(key).await,
        }
    }
}
