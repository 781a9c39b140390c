//! Embedded `SQLite` backend, used when no `DATABASE_URL` / `POSTGRES_DSN`
//! is configured. Single file on disk, one connection at a time is all the
//! concurrency model needs since the orchestrator already serializes writes
//! per `(platform, username)`.

use chrono::{DateTime, Utc};
use osint_core::error::CoreError;
use osint_core::model::{Identity, LinkedAccount, NormalizedPost, NormalizedProfile, Platform};
use osint_core::store::{RelationalStore, StoredProfile};
use serde_json::Value;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::schema::{self, found_confidences, SourceRecord};

/// Embedded, single-file relational store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if absent) the database at `path` and ensure the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the file cannot be opened or any
    /// `CREATE TABLE` statement fails.
    pub async fn open(path: &str) -> Result<Self, CoreError> {
        let url = if path == ":memory:" { "sqlite::memory:".to_string() } else { format!("sqlite://{path}?mode=rwc") };
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(|e| CoreError::Store(format!("connect: {e}")))?;
        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(%path, "sqlite store opened and migrated");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CoreError> {
        for statement in schema::SQLITE_DDL {
            sqlx::query(statement).execute(&self.pool).await.map_err(|e| CoreError::Store(format!("migrate: {e}")))?;
        }
        Ok(())
    }
}

impl RelationalStore for SqliteStore {
    async fn upsert_profile(&self, profile: &NormalizedProfile) -> Result<StoredProfile, CoreError> {
        let now = Utc::now();
        let raw = serde_json::to_string(&profile.raw).unwrap_or_else(|_| "null".to_string());

        sqlx::query(
            r"
            INSERT INTO social_media_profiles
                (platform, username, profile_url, display_name, bio, location, verified,
                 follower_count, following_count, post_count, profile_image_url,
                 banner_image_url, created_at, raw, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (platform, username) DO UPDATE SET
                profile_url = excluded.profile_url, display_name = excluded.display_name,
                bio = excluded.bio, location = excluded.location, verified = excluded.verified,
                follower_count = excluded.follower_count, following_count = excluded.following_count,
                post_count = excluded.post_count, profile_image_url = excluded.profile_image_url,
                banner_image_url = excluded.banner_image_url, raw = excluded.raw,
                last_updated = excluded.last_updated
            ",
        )
        .bind(profile.platform.as_str())
        .bind(&profile.username)
        .bind(&profile.profile_url)
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(profile.verified)
        .bind(profile.follower_count.map(|v| v as i64))
        .bind(profile.following_count.map(|v| v as i64))
        .bind(profile.post_count.map(|v| v as i64))
        .bind(&profile.profile_image_url)
        .bind(&profile.banner_image_url)
        .bind(profile.created_at.map(|t| t.to_rfc3339()))
        .bind(raw)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("upsert_profile: {e}")))?;

        let row = sqlx::query("SELECT id FROM social_media_profiles WHERE platform = ? AND username = ?")
            .bind(profile.platform.as_str())
            .bind(&profile.username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("upsert_profile reload: {e}")))?;

        Ok(StoredProfile { id: row.get("id"), profile: profile.clone(), last_updated: now })
    }

    async fn replace_posts(&self, profile_id: i64, posts: &[NormalizedPost]) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(format!("begin: {e}")))?;
        sqlx::query("DELETE FROM social_media_posts WHERE profile_id = ?")
            .bind(profile_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("replace_posts delete: {e}")))?;

        for post in posts {
            sqlx::query(
                r"
                INSERT INTO social_media_posts
                    (profile_id, platform, username, post_id, url, content, title, created_at, like_count,
                     comment_count, share_count, view_count, media_urls, hashtags, mentions, raw)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(profile_id)
            .bind(post.platform.as_str())
            .bind(&post.username)
            .bind(&post.post_id)
            .bind(&post.url)
            .bind(&post.content)
            .bind(&post.title)
            .bind(post.created_at.map(|t| t.to_rfc3339()))
            .bind(post.like_count.map(|v| v as i64))
            .bind(post.comment_count.map(|v| v as i64))
            .bind(post.share_count.map(|v| v as i64))
            .bind(post.view_count.map(|v| v as i64))
            .bind(serde_json::to_string(&post.media_urls).unwrap_or_else(|_| "null".to_string()))
            .bind(serde_json::to_string(&post.hashtags).unwrap_or_else(|_| "null".to_string()))
            .bind(serde_json::to_string(&post.mentions).unwrap_or_else(|_| "null".to_string()))
            .bind(serde_json::to_string(&post.raw).unwrap_or_else(|_| "null".to_string()))
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("replace_posts insert: {e}")))?;
        }

        tx.commit().await.map_err(|e| CoreError::Store(format!("commit: {e}")))
    }

    async fn replace_linked_accounts(
        &self,
        from_platform: &Platform,
        from_username: &str,
        accounts: &[LinkedAccount],
    ) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(format!("begin: {e}")))?;
        sqlx::query("DELETE FROM linked_accounts WHERE from_platform = ? AND from_username = ?")
            .bind(from_platform.as_str())
            .bind(from_username)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("replace_linked_accounts delete: {e}")))?;

        for account in accounts {
            sqlx::query(
                r"
                INSERT INTO linked_accounts
                    (from_platform, from_username, linked_platform, linked_username, confidence, evidence)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (from_platform, from_username, linked_platform, linked_username)
                DO UPDATE SET confidence = MAX(linked_accounts.confidence, excluded.confidence), evidence = excluded.evidence
                ",
            )
            .bind(account.from_platform.as_str())
            .bind(&account.from_username)
            .bind(account.linked_platform.as_str())
            .bind(&account.linked_username)
            .bind(account.confidence)
            .bind(serde_json::to_string(&account.evidence).unwrap_or_else(|_| "null".to_string()))
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("replace_linked_accounts insert: {e}")))?;
        }

        tx.commit().await.map_err(|e| CoreError::Store(format!("commit: {e}")))
    }

    async fn get_profile(&self, platform: &Platform, username: &str) -> Result<Option<StoredProfile>, CoreError> {
        let row = sqlx::query("SELECT * FROM social_media_profiles WHERE platform = ? AND username = ?")
            .bind(platform.as_str())
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_profile: {e}")))?;

        row.map(profile_from_row).transpose()
    }

    async fn get_posts(&self, profile_id: i64, offset: u32, limit: u32) -> Result<Vec<NormalizedPost>, CoreError> {
        let rows = sqlx::query("SELECT * FROM social_media_posts WHERE profile_id = ? ORDER BY id DESC LIMIT ? OFFSET ?")
            .bind(profile_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_posts: {e}")))?;

        rows.into_iter().map(post_from_row).collect()
    }

    async fn get_linked_accounts(&self, from_platform: &Platform, from_username: &str) -> Result<Vec<LinkedAccount>, CoreError> {
        let rows = sqlx::query(
            "SELECT * FROM linked_accounts WHERE from_platform = ? AND from_username = ? ORDER BY confidence DESC",
        )
        .bind(from_platform.as_str())
        .bind(from_username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("get_linked_accounts: {e}")))?;

        rows.into_iter().map(linked_account_from_row).collect()
    }

    async fn store_search_results(
        &self,
        identifier: &str,
        search_type: &str,
        results: &Value,
        duration_ms: u64,
    ) -> Result<Identity, CoreError> {
        let attribute_type = schema::attribute_type(search_type);
        let lower = identifier.to_lowercase();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(format!("begin: {e}")))?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT identity_id FROM identity_attributes WHERE attribute_type = ? AND attribute_value_lower = ?",
        )
        .bind(attribute_type.to_string())
        .bind(&lower)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CoreError::Store(format!("store_search_results lookup: {e}")))?;

        let identity_id = if let Some((id,)) = existing {
            id
        } else {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO identities (id, confidence_score, verification_count, created_at, updated_at) VALUES (?, 0, 0, ?, ?)",
            )
            .bind(&id)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results create identity: {e}")))?;

            sqlx::query(
                r"
                INSERT INTO identity_attributes
                    (identity_id, attribute_type, attribute_value, attribute_value_lower, is_primary, is_verified, confidence, discovered_from)
                VALUES (?, ?, ?, ?, 1, 0, 0.5, NULL)
                ",
            )
            .bind(&id)
            .bind(attribute_type.to_string())
            .bind(identifier)
            .bind(&lower)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results create attribute: {e}")))?;
            id
        };

        let sources: Vec<SourceRecord> = schema::parse_source_records(results);
        for source in &sources {
            let profile_data = source.profile_data.as_ref().map(|v| serde_json::to_string(v).unwrap_or_else(|_| "null".to_string()));
            sqlx::query(
                r"
                INSERT INTO identity_sources
                    (identity_id, platform, profile_url, status, confidence, http_status,
                     response_time_ms, detection_method, profile_data, last_checked)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (identity_id, platform) DO UPDATE SET
                    profile_url = excluded.profile_url, status = excluded.status, confidence = excluded.confidence,
                    http_status = excluded.http_status, response_time_ms = excluded.response_time_ms,
                    detection_method = excluded.detection_method, profile_data = excluded.profile_data,
                    last_checked = excluded.last_checked
                ",
            )
            .bind(&identity_id)
            .bind(source.platform.as_str())
            .bind(&source.profile_url)
            .bind(source.status.to_string())
            .bind(source.confidence)
            .bind(source.http_status.map(i32::from))
            .bind(source.response_time_ms.map(|v| v as i64))
            .bind(&source.detection_method)
            .bind(profile_data)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results upsert source: {e}")))?;
        }

        let confidence_score = osint_matcher::confidence::aggregate_confidence(&found_confidences(&sources));
        #[allow(clippy::cast_possible_truncation)]
        let verification_count = sources.iter().filter(|s| s.status == osint_core::model::SourceStatus::Found).count() as i64;

        let primary_column = match attribute_type {
            osint_core::model::AttributeType::Username => Some("primary_username"),
            osint_core::model::AttributeType::Email => Some("primary_email"),
            osint_core::model::AttributeType::Phone => Some("primary_phone"),
            osint_core::model::AttributeType::Other => None,
        };

        if let Some(column) = primary_column {
            let sql = format!(
                "UPDATE identities SET confidence_score = ?, verification_count = ?, updated_at = ?, {column} = COALESCE({column}, ?) WHERE id = ?"
            );
            sqlx::query(&sql)
                .bind(confidence_score)
                .bind(verification_count)
                .bind(now.to_rfc3339())
                .bind(identifier)
                .bind(&identity_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CoreError::Store(format!("store_search_results update identity: {e}")))?;
        } else {
            sqlx::query("UPDATE identities SET confidence_score = ?, verification_count = ?, updated_at = ? WHERE id = ?")
                .bind(confidence_score)
                .bind(verification_count)
                .bind(now.to_rfc3339())
                .bind(&identity_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CoreError::Store(format!("store_search_results update identity: {e}")))?;
        }

        let _ = duration_ms;

        let row = sqlx::query("SELECT * FROM identities WHERE id = ?")
            .bind(&identity_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results reload: {e}")))?;

        tx.commit().await.map_err(|e| CoreError::Store(format!("commit: {e}")))?;
        identity_from_row(row)
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
        let expires_at = Utc::now() + chrono::Duration::hours(ttl_hours);
        let results_json = serde_json::to_string(results).unwrap_or_else(|_| "null".to_string());
        sqlx::query(
            r"
            INSERT INTO search_cache (key, search_type, results, platform_count, duration_ms, expires_at, hit_count)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            ON CONFLICT (key) DO UPDATE SET
                search_type = excluded.search_type, results = excluded.results,
                platform_count = excluded.platform_count, duration_ms = excluded.duration_ms,
                expires_at = excluded.expires_at, hit_count = 0
            ",
        )
        .bind(key)
        .bind(search_type)
        .bind(results_json)
        .bind(i64::from(platform_count))
        .bind(duration_ms as i64)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("cache_search_results: {e}")))?;
        Ok(())
    }

    async fn get_cached_results(&self, key: &str) -> Result<Option<osint_core::model::SearchCache>, CoreError> {
        let row = sqlx::query("SELECT * FROM search_cache WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(Utc::now().to_rfc3339())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_cached_results: {e}")))?;

        let Some(row) = row else { return Ok(None) };
        let hit_count: i64 = row.get("hit_count");
        sqlx::query("UPDATE search_cache SET hit_count = ? WHERE key = ?")
            .bind(hit_count + 1)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_cached_results bump: {e}")))?;

        search_cache_from_row(row, hit_count as u64 + 1).map(Some)
    }
}

fn parse_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>, CoreError> {
    s.map(|s| DateTime::parse_from_rfc3339(&s).map(|t| t.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| CoreError::Store(format!("timestamp parse: {e}")))
}

fn profile_from_row(row: SqliteRow) -> Result<StoredProfile, CoreError> {
    let mut profile = NormalizedProfile::new(
        row.get::<String, _>("platform"),
        row.get::<String, _>("username"),
        row.get::<String, _>("profile_url"),
    );
    profile.display_name = row.get("display_name");
    profile.bio = row.get("bio");
    profile.location = row.get("location");
    profile.verified = row.get("verified");
    profile.follower_count = row.get::<Option<i64>, _>("follower_count").map(|v| v as u64);
    profile.following_count = row.get::<Option<i64>, _>("following_count").map(|v| v as u64);
    profile.post_count = row.get::<Option<i64>, _>("post_count").map(|v| v as u64);
    profile.profile_image_url = row.get("profile_image_url");
    profile.banner_image_url = row.get("banner_image_url");
    profile.created_at = parse_dt(row.get("created_at"))?;
    profile.raw = serde_json::from_str(&row.get::<String, _>("raw")).unwrap_or(Value::Null);

    let last_updated = parse_dt(Some(row.get::<String, _>("last_updated")))?.unwrap_or_else(Utc::now);
    Ok(StoredProfile { id: row.get("id"), last_updated, profile })
}

fn post_from_row(row: SqliteRow) -> Result<NormalizedPost, CoreError> {
    let mut post = NormalizedPost::new(Platform::new(row.get::<String, _>("platform")), row.get::<String, _>("username"));
    post.post_id = row.get("post_id");
    post.url = row.get("url");
    post.content = row.get("content");
    post.title = row.get("title");
    post.created_at = parse_dt(row.get("created_at"))?;
    post.like_count = row.get::<Option<i64>, _>("like_count").map(|v| v as u64);
    post.comment_count = row.get::<Option<i64>, _>("comment_count").map(|v| v as u64);
    post.share_count = row.get::<Option<i64>, _>("share_count").map(|v| v as u64);
    post.view_count = row.get::<Option<i64>, _>("view_count").map(|v| v as u64);
    post.media_urls = row.get::<Option<String>, _>("media_urls").and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default();
    post.hashtags = row.get::<Option<String>, _>("hashtags").and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default();
    post.mentions = row.get::<Option<String>, _>("mentions").and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default();
    post.raw = serde_json::from_str(&row.get::<String, _>("raw")).unwrap_or(Value::Null);
    Ok(post)
}

fn linked_account_from_row(row: SqliteRow) -> Result<LinkedAccount, CoreError> {
    Ok(LinkedAccount {
        from_platform: Platform::new(row.get::<String, _>("from_platform")),
        from_username: row.get("from_username"),
        linked_platform: Platform::new(row.get::<String, _>("linked_platform")),
        linked_username: row.get("linked_username"),
        confidence: row.get("confidence"),
        evidence: serde_json::from_str(&row.get::<String, _>("evidence")).unwrap_or(Value::Null),
    })
}

fn identity_from_row(row: SqliteRow) -> Result<Identity, CoreError> {
    Ok(Identity {
        id: row.get("id"),
        primary_username: row.get("primary_username"),
        primary_email: row.get("primary_email"),
        primary_phone: row.get("primary_phone"),
        confidence_score: row.get("confidence_score"),
        #[allow(clippy::cast_sign_loss)]
        verification_count: row.get::<i64, _>("verification_count") as u32,
        created_at: parse_dt(Some(row.get::<String, _>("created_at")))?.unwrap_or_else(Utc::now),
        updated_at: parse_dt(Some(row.get::<String, _>("updated_at")))?.unwrap_or_else(Utc::now),
    })
}

fn search_cache_from_row(row: SqliteRow, hit_count: u64) -> Result<osint_core::model::SearchCache, CoreError> {
    Ok(osint_core::model::SearchCache {
        key: row.get("key"),
        search_type: row.get("search_type"),
        results: serde_json::from_str(&row.get::<String, _>("results")).unwrap_or(Value::Null),
        #[allow(clippy::cast_sign_loss)]
        platform_count: row.get::<i64, _>("platform_count") as u32,
        #[allow(clippy::cast_sign_loss)]
        duration_ms: row.get::<i64, _>("duration_ms") as u64,
        expires_at: parse_dt(Some(row.get::<String, _>("expires_at")))?.unwrap_or_else(Utc::now),
        hit_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_and_migrates_an_in_memory_database() {
        let store = SqliteStore::open(":memory:").await;
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn round_trips_a_profile() {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let mut profile = NormalizedProfile::new("github", "carol", "https://github.com/carol");
        profile.display_name = Some("Carol".to_string());

        let stored = store.upsert_profile(&profile).await.unwrap();
        let fetched = store.get_profile(&Platform::new("github"), "carol").await.unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.profile.display_name.as_deref(), Some("Carol"));
    }

    #[tokio::test]
    async fn store_search_results_creates_an_identity_and_aggregates_confidence() {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let results = serde_json::json!([
            {"platform": "github", "status": "found", "confidence": 0.9},
            {"platform": "reddit", "status": "found", "confidence": 0.7},
        ]);
        let identity = store.store_search_results("carol", "username", &results, 120).await.unwrap();
        assert_eq!(identity.primary_username.as_deref(), Some("carol"));
        assert_eq!(identity.verification_count, 2);
        assert!(identity.confidence_score > 0.0);
    }

    #[tokio::test]
    async fn cache_round_trip_bumps_hit_count() {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let results = serde_json::json!({"ok": true});
        store.cache_search_results("k1", "username", &results, 1, 10, 24).await.unwrap();

        let first = store.get_cached_results("k1").await.unwrap().unwrap();
        assert_eq!(first.hit_count, 1);
        let second = store.get_cached_results("k1").await.unwrap().unwrap();
        assert_eq!(second.hit_count, 2);
    }
}
