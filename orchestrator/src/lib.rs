//! # OSINT Orchestrator
//!
//! The engine's single entry point: [`FanoutOrchestrator`] dispatches across
//! every registered [`osint_core::adapter::SourceAdapter`] with a bounded
//! concurrency budget, folds results through `osint-matcher`'s link
//! discovery, and persists the outcome to a [`osint_core::store::RelationalStore`]
//! and (optionally) a [`osint_core::graph::GraphStore`].
//!
//! Every public operation here corresponds to one externally observable call:
//! [`FanoutOrchestrator::search_profiles`], [`FanoutOrchestrator::detailed_profile`],
//! [`FanoutOrchestrator::recent_posts`], [`FanoutOrchestrator::find_linked`],
//! [`FanoutOrchestrator::refresh`], and the supplemental
//! [`FanoutOrchestrator::search_identity`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapters;
pub mod composite;
pub mod config;
pub mod graph;
pub mod identity;

use std::sync::Arc;
use std::time::Duration;

use osint_adapters::opengraph;
use osint_adapters::AdapterGuard;
use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::graph::{GraphNode, GraphStore, RelationshipKind};
use osint_core::model::{LinkedAccount, NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::store::RelationalStore;
use osint_core::transport::Transport;
use serde_json::json;
use tokio::sync::Semaphore;

pub use adapters::{AdapterRegistry, AnyAdapter};
pub use composite::DetailedProfile;
pub use config::{build_from_env, Config, ProductionOrchestrator};
pub use graph::AnyGraph;

/// Posts fetched per `detailed_profile`/`refresh` call, before pagination
/// applies. Pagination reads back what was stored, it never re-fetches the
/// live source per page.
pub const DEFAULT_POST_FETCH_LIMIT: usize = 50;

/// Smallest/largest `page_size` `recent_posts` accepts; out-of-range values
/// are clamped rather than rejected.
pub const MIN_PAGE_SIZE: u32 = 1;
/// See [`MIN_PAGE_SIZE`].
pub const MAX_PAGE_SIZE: u32 = 200;

/// `ttl_hours` applied to a `search_identity` result cached via
/// `RelationalStore::cache_search_results`.
pub const SEARCH_CACHE_TTL_HOURS: i64 = 24;

/// Rate policy applied to the shared Open Graph scrape fallback, used when a
/// registered adapter reports no account found via its native API.
const OPENGRAPH_RATE_POLICY: RateLimitPolicy = RateLimitPolicy::new(60, 60.0);

/// Bounded-concurrency dispatcher across every registered source adapter,
/// with cache, store, and (optional) graph coordination.
///
/// `T`/`C` are the transport and credential-provider types shared by every
/// adapter in `registry`; `S`/`G` are the relational and graph store
/// backends. See [`config`] for the production instantiation built from the
/// process environment.
pub struct FanoutOrchestrator<T, C, S, G> {
    registry: AdapterRegistry<T, C>,
    store: S,
    graph: G,
    transport: T,
    opengraph_guard: AdapterGuard,
    semaphore: Arc<Semaphore>,
    profile_cache: osint_tools::TtlCache<NormalizedProfile>,
    posts_cache: osint_tools::TtlCache<Vec<NormalizedPost>>,
    linked_cache: osint_tools::TtlCache<Vec<LinkedAccount>>,
    cache_ttl: Duration,
}

impl<T, C, S, G> FanoutOrchestrator<T, C, S, G>
where
    T: Transport + Clone + Send + Sync,
    C: CredentialProvider + Clone + Send + Sync,
    S: RelationalStore,
    G: GraphStore,
{
    /// Build an orchestrator around an already-populated `registry` and the
    /// selected store backends. `transport` drives the Open Graph fallback
    /// and should be the same handle wrapped into `registry`'s adapters, so
    /// the fallback shares connection pooling with the real adapters.
    #[must_use]
    pub fn new(registry: AdapterRegistry<T, C>, store: S, graph: G, transport: T, max_concurrency: usize, cache_ttl: Duration) -> Self {
        Self {
            registry,
            store,
            graph,
            transport,
            opengraph_guard: AdapterGuard::new(OPENGRAPH_RATE_POLICY),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            profile_cache: osint_tools::TtlCache::new(),
            posts_cache: osint_tools::TtlCache::new(),
            linked_cache: osint_tools::TtlCache::new(),
            cache_ttl,
        }
    }

    /// Run `fut` under the outbound-call concurrency bound. Cache hits never
    /// call this; only adapter/Open Graph I/O does.
    async fn gated<Fut, O>(&self, fut: Fut) -> Result<O, CoreError>
    where
        Fut: std::future::Future<Output = Result<O, CoreError>>,
    {
        let _permit = self.semaphore.acquire().await.map_err(|e| CoreError::Transient(e.to_string()))?;
        fut.await
    }

    /// Fetch a profile through the registered adapter, falling back to an
    /// Open Graph scrape of the adapter's canonical URL when the adapter
    /// itself reports no account.
    async fn fetch_profile_with_fallback(&self, adapter: &AnyAdapter<T, C>, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let native = self.gated(adapter.fetch_profile(username)).await?;
        if native.is_some() {
            return Ok(native);
        }
        let platform = adapter.platform();
        let url = adapter.profile_url(username);
        self.gated(opengraph::scrape_profile(&self.transport, &self.opengraph_guard, &platform, username, &url)).await
    }

    /// Search every platform in `platforms` (or every registered platform
    /// when `None`) for `username`. Per-platform failures are logged and
    /// swallowed: this call always "succeeds", possibly with an empty list.
    ///
    /// # Errors
    ///
    /// This call does not itself fail; the `Result` wrapper exists so the
    /// signature is uniform with the rest of the engine's operations.
    pub async fn search_profiles(&self, username: &str, platforms: Option<&[String]>) -> Result<Vec<NormalizedProfile>, CoreError> {
        let resolved = self.registry.resolve(platforms);
        let fetches = resolved.into_iter().map(|platform| async move {
            let adapter = self.registry.get(platform)?;
            match self.fetch_profile_with_fallback(adapter, username).await {
                Ok(profile) => profile,
                Err(err) => {
                    tracing::warn!(platform, username, error = %err, "search_profiles: adapter failed, skipping");
                    None
                },
            }
        });
        Ok(futures::future::join_all(fetches).await.into_iter().flatten().collect())
    }

    fn cache_keys(platform: &str, username: &str) -> (String, String, String) {
        (format!("profile:{platform}:{username}"), format!("posts:{platform}:{username}"), format!("linked:{platform}:{username}"))
    }

    /// Fetch, cross-reference, and persist everything known about
    /// `(platform, username)`: the profile, its recent posts, and the
    /// linked accounts discovered in them.
    ///
    /// Cache hit (all three of profile/posts/linked already cached, and
    /// `force_refresh` is `false`) short-circuits straight to a
    /// [`DetailedProfile`] built from the cached values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the source confirms no such
    /// account, and propagates [`CoreError::ConfigError`] or an adapter
    /// [`CoreError::SourceError`]/[`CoreError::Transient`] left after
    /// retries. A failure persisting posts or linked accounts after a
    /// successful profile write is logged and does not fail the call.
    pub async fn detailed_profile(&self, username: &str, platform: &str, force_refresh: bool) -> Result<DetailedProfile, CoreError> {
        let (profile_key, posts_key, linked_key) = Self::cache_keys(platform, username);

        if !force_refresh {
            if let (Some(profile), Some(posts), Some(linked)) =
                (self.profile_cache.get(&profile_key).await, self.posts_cache.get(&posts_key).await, self.linked_cache.get(&linked_key).await)
            {
                return Ok(DetailedProfile {
                    profile: (*profile).clone(),
                    posts: (*posts).clone(),
                    linked_accounts: (*linked).clone(),
                    last_updated: chrono::Utc::now(),
                });
            }
        }

        let adapter = self
            .registry
            .get(platform)
            .ok_or_else(|| CoreError::ConfigError(format!("no adapter registered for platform {platform}")))?;

        let profile = self
            .fetch_profile_with_fallback(adapter, username)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("{platform}:{username}")))?;

        let posts = self.gated(adapter.fetch_posts(username, DEFAULT_POST_FETCH_LIMIT)).await?;
        let linked_accounts = osint_matcher::discover_linked_accounts(&profile, &posts);

        let stored = self.store.upsert_profile(&profile).await?;

        if let Err(err) = self.store.replace_posts(stored.id, &posts).await {
            tracing::warn!(platform, username, error = %err, "detailed_profile: posts write failed, profile write stands");
        }
        if let Err(err) = self.store.replace_linked_accounts(&profile.platform, &profile.username, &linked_accounts).await {
            tracing::warn!(platform, username, error = %err, "detailed_profile: linked-account write failed, profile write stands");
        }

        if let Err(err) = self.write_graph(&profile, &linked_accounts).await {
            tracing::warn!(platform, username, error = %err, "detailed_profile: graph write failed, relational write stands");
        }

        self.profile_cache.set(profile_key, profile.clone(), Some(self.cache_ttl)).await;
        self.posts_cache.set(posts_key, posts.clone(), Some(self.cache_ttl)).await;
        self.linked_cache.set(linked_key, linked_accounts.clone(), Some(self.cache_ttl)).await;

        Ok(DetailedProfile { profile, posts, linked_accounts, last_updated: stored.last_updated })
    }

    /// Upsert the graph nodes/relationships for a freshly fetched profile and
    /// its linked accounts. A linked account's platform need not have a
    /// registered adapter; its profile URL is still derivable.
    async fn write_graph(&self, profile: &NormalizedProfile, linked_accounts: &[LinkedAccount]) -> Result<(), CoreError> {
        self.graph
            .upsert_node(GraphNode::Username { value: profile.username.clone(), platform: profile.platform.clone() })
            .await?;
        self.graph.upsert_node(GraphNode::Platform { name: profile.platform.clone() }).await?;
        self.graph
            .upsert_node(GraphNode::Profile { url: profile.profile_url.clone(), platform: profile.platform.clone(), confidence: 1.0 })
            .await?;
        self.graph.upsert_relationship(&profile.username, profile.platform.as_str(), RelationshipKind::FoundOn).await?;

        for link in linked_accounts {
            let linked_url = canonical_profile_url(&link.linked_platform, &link.linked_username);
            self.graph
                .upsert_node(GraphNode::Profile { url: linked_url.clone(), platform: link.linked_platform.clone(), confidence: link.confidence })
                .await?;
            self.graph.upsert_relationship(&profile.profile_url, &linked_url, RelationshipKind::LinkedTo).await?;
        }
        Ok(())
    }

    /// Ensure `(platform, username)` has a stored profile, hydrating it via
    /// [`Self::detailed_profile`] if necessary.
    async fn ensure_hydrated(&self, username: &str, platform: &str) -> Result<osint_core::store::StoredProfile, CoreError> {
        let platform_key = Platform::new(platform);
        if let Some(stored) = self.store.get_profile(&platform_key, &username.to_lowercase()).await? {
            return Ok(stored);
        }
        self.detailed_profile(username, platform, false).await?;
        self.store
            .get_profile(&platform_key, &username.to_lowercase())
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("{platform}:{username}")))
    }

    /// Page through a profile's stored posts. `page` is 1-indexed and
    /// clamped to at least `1`; `page_size` is clamped to
    /// `[`[`MIN_PAGE_SIZE`]`, `[`MAX_PAGE_SIZE`]`]`.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`Self::detailed_profile`] when the
    /// profile has not been fetched yet, plus [`CoreError::Store`] on a
    /// persistence failure.
    pub async fn recent_posts(&self, username: &str, platform: &str, page: u32, page_size: u32) -> Result<Vec<NormalizedPost>, CoreError> {
        let page = page.max(1);
        let page_size = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        let stored = self.ensure_hydrated(username, platform).await?;
        let offset = (page - 1) * page_size;
        self.store.get_posts(stored.id, offset, page_size).await
    }

    /// Linked accounts discovered for `(platform, username)`, descending by confidence.
    ///
    /// # Errors
    ///
    /// Same as [`Self::recent_posts`].
    pub async fn find_linked(&self, username: &str, platform: &str) -> Result<Vec<LinkedAccount>, CoreError> {
        let platform_key = Platform::new(platform);
        self.ensure_hydrated(username, platform).await?;
        self.store.get_linked_accounts(&platform_key, &username.to_lowercase()).await
    }

    /// Force a live refetch of `(platform, username)`, bypassing the cache.
    /// Equivalent to `detailed_profile(username, platform, true)`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::detailed_profile`].
    pub async fn refresh(&self, username: &str, platform: &str) -> Result<DetailedProfile, CoreError> {
        self.detailed_profile(username, platform, true).await
    }

    /// Enumerate `identifier` (a username, email, phone number, or bare
    /// name, per `search_type`) across every registered platform, probing a
    /// handful of generated variations alongside the seed.
    ///
    /// Not part of the per-platform fetch flow: this never writes to the
    /// graph store, and results are cached/retrieved through
    /// `RelationalStore::store_search_results`/`cache_search_results`/`get_cached_results`
    /// rather than the orchestrator's own TTL caches.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if persisting the result fails.
    pub async fn search_identity(
        &self,
        identifier: &str,
        search_type: &str,
        platforms: Option<&[String]>,
    ) -> Result<osint_core::model::Identity, CoreError> {
        let cache_key = format!("{search_type}:{}", identifier.to_lowercase());
        if let Some(cached) = self.store.get_cached_results(&cache_key).await? {
            return self.store.store_search_results(identifier, search_type, &cached.results, cached.duration_ms).await;
        }

        let started = std::time::Instant::now();
        let candidates = identity::candidate_handles(identifier, search_type);
        let resolved = self.registry.resolve(platforms);

        let probes = resolved.into_iter().flat_map(|platform| candidates.iter().map(move |candidate| (platform, candidate.clone())));

        let records = futures::future::join_all(probes.map(|(platform, candidate)| async move {
            let adapter = self.registry.get(platform)?;
            let probe_started = std::time::Instant::now();
            let outcome = self.fetch_profile_with_fallback(adapter, &candidate).await;
            let response_time_ms = u64::try_from(probe_started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let (method, confidence) = identity::detection(identifier, &candidate);

            let record = match outcome {
                Ok(Some(profile)) => json!({
                    "platform": platform,
                    "status": "found",
                    "confidence": confidence,
                    "profile_url": profile.profile_url,
                    "http_status": 200,
                    "response_time_ms": response_time_ms,
                    "detection_method": method,
                    "profile_data": profile.raw,
                }),
                Ok(None) => json!({
                    "platform": platform,
                    "status": "not_found",
                    "confidence": 0.0,
                    "profile_url": Option::<String>::None,
                    "http_status": 404,
                    "response_time_ms": response_time_ms,
                    "detection_method": method,
                    "profile_data": Option::<serde_json::Value>::None,
                }),
                Err(err) => {
                    tracing::warn!(platform, candidate, error = %err, "search_identity: probe failed");
                    json!({
                        "platform": platform,
                        "status": "error",
                        "confidence": 0.0,
                        "profile_url": Option::<String>::None,
                        "http_status": Option::<u16>::None,
                        "response_time_ms": response_time_ms,
                        "detection_method": method,
                        "profile_data": Option::<serde_json::Value>::None,
                    })
                },
            };
            Some(record)
        }))
        .await;

        let results: Vec<serde_json::Value> = records.into_iter().flatten().collect();
        let platform_count = {
            let mut platforms: Vec<&str> =
                results.iter().filter_map(|r| r.get("platform").and_then(serde_json::Value::as_str)).collect();
            platforms.sort_unstable();
            platforms.dedup();
            u32::try_from(platforms.len()).unwrap_or(u32::MAX)
        };
        let results_value = serde_json::Value::Array(results);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let identity = self.store.store_search_results(identifier, search_type, &results_value, duration_ms).await?;
        self.store
            .cache_search_results(&cache_key, search_type, &results_value, platform_count, duration_ms, SEARCH_CACHE_TTL_HOURS)
            .await?;
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use osint_testing::{InMemoryStore, MapCredentials, RecordingGraphStore, ScriptedTransport};

    use super::*;

    fn orchestrator() -> FanoutOrchestrator<Arc<ScriptedTransport>, Arc<MapCredentials>, InMemoryStore, RecordingGraphStore> {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response("api.github.com/users/carol", 200, r#"{"login":"carol","id":1,"html_url":"https://github.com/carol"}"#)
                .with_response("github.com/carol", 200, r#"{"login":"carol","id":1,"html_url":"https://github.com/carol"}"#),
        );
        let credentials = Arc::new(MapCredentials::new(HashMap::new()));
        let registry = AdapterRegistry::new(transport.clone(), credentials, "client-id", "client-secret");
        FanoutOrchestrator::new(registry, InMemoryStore::new(), RecordingGraphStore::new(), transport, 5, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn detailed_profile_not_found_propagates() {
        let orchestrator = orchestrator();
        let err = orchestrator.detailed_profile("nobody", "github", false).await;
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn detailed_profile_unknown_platform_is_config_error() {
        let orchestrator = orchestrator();
        let err = orchestrator.detailed_profile("carol", "not-a-platform", false).await;
        assert!(matches!(err, Err(CoreError::ConfigError(_))));
    }

    #[tokio::test]
    async fn search_profiles_never_fails_on_adapter_errors() {
        let orchestrator = orchestrator();
        let results = orchestrator.search_profiles("nobody", Some(&["github".to_string()])).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn recent_posts_nonexistent_profile_propagates_not_found() {
        let orchestrator = orchestrator();
        let err = orchestrator.recent_posts("nobody", "github", 0, 10_000).await;
        assert!(err.is_err());
    }
}
