//! Concurrency-safe, TTL-expiring key-value cache.
//!
//! Expiry is lazy: a read that finds an expired entry removes it on the
//! spot. A periodic sweep additionally reclaims entries nobody has touched
//! since they expired, so memory doesn't grow unbounded behind cold keys.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry<V> {
    value: Arc<V>,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// A `TTLCache<V>` shared across an adapter's callers. Values are handed out
/// as `Arc<V>`; the cache never copies a value on `get`.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    default_ttl: Option<Duration>,
}

impl<V> TtlCache<V> {
    /// Build a cache with no default TTL (entries live forever unless given
    /// one explicitly in [`set`](Self::set)).
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()), default_ttl: None }
    }

    /// Build a cache whose entries expire after `ttl` unless overridden per call.
    #[must_use]
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), default_ttl: Some(ttl) }
    }

    /// Fetch a value, removing it first if it has expired.
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            },
            Some(entry) => Some(Arc::clone(&entry.value)),
            None => None,
        }
    }

    /// Insert or replace a value, optionally overriding the cache's default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.or(self.default_ttl).map(|d| Instant::now() + d);
        let mut entries = self.entries.lock().await;
        entries.insert(key.into(), Entry { value: Arc::new(value), expires_at });
    }

    /// Remove a single key.
    pub async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Reclaim all entries that have expired but haven't been touched since.
    /// Intended to be driven by a periodic background tick.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(now));
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = TtlCache::new();
        cache.set("k", 42, None).await;
        assert_eq!(*cache.get("k").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = TtlCache::new();
        cache.set("k", 42, Some(Duration::from_millis(10))).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_key() {
        let cache = TtlCache::new();
        cache.set("k", 1, None).await;
        cache.delete("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = TtlCache::new();
        cache.set("a", 1, None).await;
        cache.set("b", 2, None).await;
        cache.clear().await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn sweep_reclaims_expired_entries() {
        let cache = TtlCache::new();
        cache.set("k", 1, Some(Duration::from_millis(5))).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.sweep().await;
        assert_eq!(cache.entries.lock().await.len(), 0);
    }
}
