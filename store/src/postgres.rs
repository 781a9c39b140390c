//! `PostgreSQL` backend, selected when `DATABASE_URL` / `POSTGRES_DSN` is set.

use chrono::Utc;
use osint_core::error::CoreError;
use osint_core::model::{Identity, LinkedAccount, NormalizedPost, NormalizedProfile, Platform};
use osint_core::store::{RelationalStore, StoredProfile};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::schema::{self, found_confidences, SourceRecord};

/// Server-backed relational store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the connection or any `CREATE TABLE`
    /// statement fails.
    pub async fn connect(dsn: &str) -> Result<Self, CoreError> {
        let pool = PgPool::connect(dsn).await.map_err(|e| CoreError::Store(format!("connect: {e}")))?;
        let store = Self { pool };
        store.migrate().await?;
        tracing::info!("postgres store connected and migrated");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CoreError> {
        for statement in schema::POSTGRES_DDL {
            sqlx::query(statement).execute(&self.pool).await.map_err(|e| CoreError::Store(format!("migrate: {e}")))?;
        }
        Ok(())
    }
}

impl RelationalStore for PostgresStore {
    #[tracing::instrument(skip(self, profile), fields(platform = %profile.platform, username = %profile.username))]
    async fn upsert_profile(&self, profile: &NormalizedProfile) -> Result<StoredProfile, CoreError> {
        let now = Utc::now();
        let row = sqlx::query(
            r"
            INSERT INTO social_media_profiles
                (platform, username, profile_url, display_name, bio, location, verified,
                 follower_count, following_count, post_count, profile_image_url,
                 banner_image_url, created_at, raw, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (platform, username) DO UPDATE SET
                profile_url = $3, display_name = $4, bio = $5, location = $6, verified = $7,
                follower_count = $8, following_count = $9, post_count = $10,
                profile_image_url = $11, banner_image_url = $12, raw = $14, last_updated = $15
            RETURNING id
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
        .bind(profile.created_at)
        .bind(&profile.raw)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("upsert_profile: {e}")))?;

        Ok(StoredProfile { id: row.get("id"), profile: profile.clone(), last_updated: now })
    }

    async fn replace_posts(&self, profile_id: i64, posts: &[NormalizedPost]) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(format!("begin: {e}")))?;
        sqlx::query("DELETE FROM social_media_posts WHERE profile_id = $1")
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
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ",
            )
            .bind(profile_id)
            .bind(post.platform.as_str())
            .bind(&post.username)
            .bind(&post.post_id)
            .bind(&post.url)
            .bind(&post.content)
            .bind(&post.title)
            .bind(post.created_at)
            .bind(post.like_count.map(|v| v as i64))
            .bind(post.comment_count.map(|v| v as i64))
            .bind(post.share_count.map(|v| v as i64))
            .bind(post.view_count.map(|v| v as i64))
            .bind(serde_json::to_value(&post.media_urls).unwrap_or(Value::Null))
            .bind(serde_json::to_value(&post.hashtags).unwrap_or(Value::Null))
            .bind(serde_json::to_value(&post.mentions).unwrap_or(Value::Null))
            .bind(&post.raw)
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
        sqlx::query("DELETE FROM linked_accounts WHERE from_platform = $1 AND from_username = $2")
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
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (from_platform, from_username, linked_platform, linked_username)
                DO UPDATE SET confidence = GREATEST(linked_accounts.confidence, $5), evidence = $6
                ",
            )
            .bind(account.from_platform.as_str())
            .bind(&account.from_username)
            .bind(account.linked_platform.as_str())
            .bind(&account.linked_username)
            .bind(account.confidence)
            .bind(&account.evidence)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("replace_linked_accounts insert: {e}")))?;
        }

        tx.commit().await.map_err(|e| CoreError::Store(format!("commit: {e}")))
    }

    async fn get_profile(&self, platform: &Platform, username: &str) -> Result<Option<StoredProfile>, CoreError> {
        let row = sqlx::query("SELECT * FROM social_media_profiles WHERE platform = $1 AND username = $2")
            .bind(platform.as_str())
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_profile: {e}")))?;

        Ok(row.map(profile_from_row))
    }

    async fn get_posts(&self, profile_id: i64, offset: u32, limit: u32) -> Result<Vec<NormalizedPost>, CoreError> {
        let rows = sqlx::query(
            "SELECT * FROM social_media_posts WHERE profile_id = $1 ORDER BY id DESC OFFSET $2 LIMIT $3",
        )
        .bind(profile_id)
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("get_posts: {e}")))?;

        Ok(rows.into_iter().map(post_from_row).collect())
    }

    async fn get_linked_accounts(&self, from_platform: &Platform, from_username: &str) -> Result<Vec<LinkedAccount>, CoreError> {
        let rows = sqlx::query(
            "SELECT * FROM linked_accounts WHERE from_platform = $1 AND from_username = $2 ORDER BY confidence DESC",
        )
        .bind(from_platform.as_str())
        .bind(from_username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("get_linked_accounts: {e}")))?;

        Ok(rows.into_iter().map(linked_account_from_row).collect())
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
            "SELECT identity_id FROM identity_attributes WHERE attribute_type = $1 AND attribute_value_lower = $2",
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
                "INSERT INTO identities (id, confidence_score, verification_count, created_at, updated_at) VALUES ($1, 0, 0, $2, $2)",
            )
            .bind(&id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results create identity: {e}")))?;

            sqlx::query(
                r"
                INSERT INTO identity_attributes
                    (identity_id, attribute_type, attribute_value, attribute_value_lower, is_primary, is_verified, confidence, discovered_from)
                VALUES ($1, $2, $3, $4, true, false, 0.5, NULL)
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
            sqlx::query(
                r"
                INSERT INTO identity_sources
                    (identity_id, platform, profile_url, status, confidence, http_status,
                     response_time_ms, detection_method, profile_data, last_checked)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (identity_id, platform) DO UPDATE SET
                    profile_url = $3, status = $4, confidence = $5, http_status = $6,
                    response_time_ms = $7, detection_method = $8, profile_data = $9, last_checked = $10
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
            .bind(&source.profile_data)
            .bind(now)
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
                "UPDATE identities SET confidence_score = $1, verification_count = $2, updated_at = $3, {column} = COALESCE({column}, $4) WHERE id = $5"
            );
            sqlx::query(&sql)
                .bind(confidence_score)
                .bind(verification_count)
                .bind(now)
                .bind(identifier)
                .bind(&identity_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CoreError::Store(format!("store_search_results update identity: {e}")))?;
        } else {
            sqlx::query("UPDATE identities SET confidence_score = $1, verification_count = $2, updated_at = $3 WHERE id = $4")
                .bind(confidence_score)
                .bind(verification_count)
                .bind(now)
                .bind(&identity_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CoreError::Store(format!("store_search_results update identity: {e}")))?;
        }

        let _ = duration_ms;

        let row = sqlx::query("SELECT * FROM identities WHERE id = $1")
            .bind(&identity_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| CoreError::Store(format!("store_search_results reload: {e}")))?;

        tx.commit().await.map_err(|e| CoreError::Store(format!("commit: {e}")))?;
        Ok(identity_from_row(row))
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
        sqlx::query(
            r"
            INSERT INTO search_cache (key, search_type, results, platform_count, duration_ms, expires_at, hit_count)
            VALUES ($1, $2, $3, $4, $5, $6, 0)
            ON CONFLICT (key) DO UPDATE SET
                search_type = $2, results = $3, platform_count = $4, duration_ms = $5, expires_at = $6, hit_count = 0
            ",
        )
        .bind(key)
        .bind(search_type)
        .bind(results)
        .bind(i64::from(platform_count))
        .bind(duration_ms as i64)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Store(format!("cache_search_results: {e}")))?;
        Ok(())
    }

    async fn get_cached_results(&self, key: &str) -> Result<Option<osint_core::model::SearchCache>, CoreError> {
        let row = sqlx::query("SELECT * FROM search_cache WHERE key = $1 AND expires_at > $2")
            .bind(key)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_cached_results: {e}")))?;

        let Some(row) = row else { return Ok(None) };
        let hit_count: i64 = row.get("hit_count");
        sqlx::query("UPDATE search_cache SET hit_count = $1 WHERE key = $2")
            .bind(hit_count + 1)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Store(format!("get_cached_results bump: {e}")))?;

        Ok(Some(search_cache_from_row(row, hit_count as u64 + 1)))
    }
}

fn profile_from_row(row: PgRow) -> StoredProfile {
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
    profile.created_at = row.get("created_at");
    profile.raw = row.get("raw");

    StoredProfile { id: row.get("id"), last_updated: row.get("last_updated"), profile }
}

fn post_from_row(row: PgRow) -> NormalizedPost {
    let mut post = NormalizedPost::new(Platform::new(row.get::<String, _>("platform")), row.get::<String, _>("username"));
    post.post_id = row.get("post_id");
    post.url = row.get("url");
    post.content = row.get("content");
    post.title = row.get("title");
    post.created_at = row.get("created_at");
    post.like_count = row.get::<Option<i64>, _>("like_count").map(|v| v as u64);
    post.comment_count = row.get::<Option<i64>, _>("comment_count").map(|v| v as u64);
    post.share_count = row.get::<Option<i64>, _>("share_count").map(|v| v as u64);
    post.view_count = row.get::<Option<i64>, _>("view_count").map(|v| v as u64);
    post.media_urls = row.get::<Option<Value>, _>("media_urls").and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default();
    post.hashtags = row.get::<Option<Value>, _>("hashtags").and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default();
    post.mentions = row.get::<Option<Value>, _>("mentions").and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default();
    post.raw = row.get("raw");
    post
}

fn linked_account_from_row(row: PgRow) -> LinkedAccount {
    LinkedAccount {
        from_platform: Platform::new(row.get::<String, _>("from_platform")),
        from_username: row.get("from_username"),
        linked_platform: Platform::new(row.get::<String, _>("linked_platform")),
        linked_username: row.get("linked_username"),
        confidence: row.get("confidence"),
        evidence: row.get("evidence"),
    }
}

fn identity_from_row(row: PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        primary_username: row.get("primary_username"),
        primary_email: row.get("primary_email"),
        primary_phone: row.get("primary_phone"),
        confidence_score: row.get("confidence_score"),
        #[allow(clippy::cast_sign_loss)]
        verification_count: row.get::<i64, _>("verification_count") as u32,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn search_cache_from_row(row: PgRow, hit_count: u64) -> osint_core::model::SearchCache {
    osint_core::model::SearchCache {
        key: row.get("key"),
        search_type: row.get("search_type"),
        results: row.get("results"),
        #[allow(clippy::cast_sign_loss)]
        platform_count: row.get::<i64, _>("platform_count") as u32,
        #[allow(clippy::cast_sign_loss)]
        duration_ms: row.get::<i64, _>("duration_ms") as u64,
        expires_at: row.get("expires_at"),
        hit_count,
    }
}
