//! An in-memory [`RelationalStore`] double, adequate for orchestrator tests
//! that don't need to exercise real SQL.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use osint_core::error::CoreError;
use osint_core::model::{AttributeType, Identity, LinkedAccount, NormalizedPost, NormalizedProfile, Platform, SearchCache};
use osint_core::store::{RelationalStore, StoredProfile};
use serde_json::Value;

#[derive(Default)]
struct Inner {
    next_id: i64,
    profiles: HashMap<(String, String), StoredProfile>,
    posts: HashMap<i64, Vec<NormalizedPost>>,
    linked: HashMap<(String, String), Vec<LinkedAccount>>,
    identities_by_attr: HashMap<(AttributeType, String), String>,
    identities: HashMap<String, Identity>,
    cache: HashMap<String, SearchCache>,
}

/// In-memory `RelationalStore`. Cheap to construct, safe to share across
/// tasks via `Clone` (an `Arc` around the same lock).
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    /// A fresh, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RelationalStore for InMemoryStore {
    async fn upsert_profile(&self, profile: &NormalizedProfile) -> Result<StoredProfile, CoreError> {
        let mut inner = self.lock();
        let key = (profile.platform.as_str().to_string(), profile.username.clone());
        let id = inner.profiles.get(&key).map_or_else(
            || {
                inner.next_id += 1;
                inner.next_id
            },
            |existing| existing.id,
        );
        let stored = StoredProfile { id, profile: profile.clone(), last_updated: Utc::now() };
        inner.profiles.insert(key, stored.clone());
        Ok(stored)
    }

    async fn replace_posts(&self, profile_id: i64, posts: &[NormalizedPost]) -> Result<(), CoreError> {
        self.lock().posts.insert(profile_id, posts.to_vec());
        Ok(())
    }

    async fn replace_linked_accounts(&self, from_platform: &Platform, from_username: &str, accounts: &[LinkedAccount]) -> Result<(), CoreError> {
        let key = (from_platform.as_str().to_string(), from_username.to_string());
        self.lock().linked.insert(key, accounts.to_vec());
        Ok(())
    }

    async fn get_profile(&self, platform: &Platform, username: &str) -> Result<Option<StoredProfile>, CoreError> {
        let key = (platform.as_str().to_string(), username.to_string());
        Ok(self.lock().profiles.get(&key).cloned())
    }

    async fn get_posts(&self, profile_id: i64, offset: u32, limit: u32) -> Result<Vec<NormalizedPost>, CoreError> {
        let inner = self.lock();
        let posts = inner.posts.get(&profile_id).cloned().unwrap_or_default();
        Ok(posts.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn get_linked_accounts(&self, from_platform: &Platform, from_username: &str) -> Result<Vec<LinkedAccount>, CoreError> {
        let key = (from_platform.as_str().to_string(), from_username.to_string());
        let mut accounts = self.lock().linked.get(&key).cloned().unwrap_or_default();
        accounts.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        Ok(accounts)
    }

    async fn store_search_results(&self, identifier: &str, search_type: &str, results: &Value, _duration_ms: u64) -> Result<Identity, CoreError> {
        let attribute_type = match search_type {
            "username" => AttributeType::Username,
            "email" => AttributeType::Email,
            "phone" => AttributeType::Phone,
            _ => AttributeType::Other,
        };
        let lower = identifier.to_lowercase();
        let mut inner = self.lock();
        let attr_key = (attribute_type, lower);
        let now = Utc::now();

        let id = inner.identities_by_attr.get(&attr_key).cloned().unwrap_or_else(|| {
            let id = format!("mem-{}", inner.identities.len() + 1);
            inner.identities_by_attr.insert(attr_key.clone(), id.clone());
            inner.identities.insert(
                id.clone(),
                Identity {
                    id: id.clone(),
                    primary_username: None,
                    primary_email: None,
                    primary_phone: None,
                    confidence_score: 0.0,
                    verification_count: 0,
                    created_at: now,
                    updated_at: now,
                },
            );
            id
        });

        let found_scores: Vec<f64> = results
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.get("status").and_then(Value::as_str) == Some("found"))
                    .filter_map(|item| item.get("confidence").and_then(Value::as_f64))
                    .collect()
            })
            .unwrap_or_default();

        let identity = inner.identities.get_mut(&id).expect("identity just inserted or looked up");
        identity.confidence_score = osint_matcher::confidence::aggregate_confidence(&found_scores);
        #[allow(clippy::cast_possible_truncation)]
        {
            identity.verification_count = found_scores.len() as u32;
        }
        identity.updated_at = now;
        match attribute_type {
            AttributeType::Username => {
                identity.primary_username.get_or_insert_with(|| identifier.to_string());
            },
            AttributeType::Email => {
                identity.primary_email.get_or_insert_with(|| identifier.to_string());
            },
            AttributeType::Phone => {
                identity.primary_phone.get_or_insert_with(|| identifier.to_string());
            },
            AttributeType::Other => {},
        }

        Ok(identity.clone())
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
        self.lock().cache.insert(
            key.to_string(),
            SearchCache {
                key: key.to_string(),
                search_type: search_type.to_string(),
                results: results.clone(),
                platform_count,
                duration_ms,
                expires_at: Utc::now() + chrono::Duration::hours(ttl_hours),
                hit_count: 0,
            },
        );
        Ok(())
    }

    async fn get_cached_results(&self, key: &str) -> Result<Option<SearchCache>, CoreError> {
        let mut inner = self.lock();
        let Some(entry) = inner.cache.get_mut(key) else { return Ok(None) };
        if entry.expires_at <= Utc::now() {
            return Ok(None);
        }
        entry.hit_count += 1;
        Ok(Some(entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_profile_assigns_a_stable_id() {
        let store = InMemoryStore::new();
        let profile = NormalizedProfile::new("github", "carol", "https://github.com/carol");
        let first = store.upsert_profile(&profile).await.unwrap();
        let second = store.upsert_profile(&profile).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn cached_results_expire() {
        let store = InMemoryStore::new();
        store.cache_search_results("k", "username", &Value::Null, 1, 5, -1).await.unwrap();
        assert!(store.get_cached_results("k").await.unwrap().is_none());
    }
}
