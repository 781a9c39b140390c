//! Process bootstrap: read §6's environment-like configuration once at
//! startup and build an immutable [`crate::FanoutOrchestrator`] from it.
//!
//! Per the "optional backends selected at construction" rule, nothing here
//! is re-evaluated per call: the relational store and graph store backends
//! are picked exactly once, here.

use std::sync::Arc;
use std::time::Duration;

use osint_adapters::EnvCredentialProvider;
use osint_core::error::CoreError;
use osint_store::Store;
use osint_tools::ReqwestTransport;

use crate::adapters::AdapterRegistry;
use crate::graph::AnyGraph;

/// Default bound on concurrent outbound adapter calls (§5).
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
/// Default TTL applied to the orchestrator's own `profile`/`posts`/`linked`
/// cache entries, distinct from `SearchCache`'s `ttl_hours`.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Everything [`crate::FanoutOrchestrator::from_env`] needs, gathered from
/// the process environment.
pub struct Config {
    /// Bound on concurrent outbound adapter calls.
    pub max_concurrency: usize,
    /// TTL applied to cached profiles/posts/linked-accounts.
    pub cache_ttl: Duration,
}

impl Config {
    /// Read `MAX_CONCURRENCY` (default [`DEFAULT_MAX_CONCURRENCY`]) and
    /// `CACHE_TTL_SECONDS` (default [`DEFAULT_CACHE_TTL`]) from the process
    /// environment. Unparseable values fall back to the default rather than
    /// erroring, matching the tolerant-config posture the rest of the engine uses.
    #[must_use]
    pub fn from_env() -> Self {
        let max_concurrency =
            std::env::var("MAX_CONCURRENCY").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MAX_CONCURRENCY);
        let cache_ttl = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(DEFAULT_CACHE_TTL, Duration::from_secs);
        Self { max_concurrency, cache_ttl }
    }
}

/// The concrete types a production orchestrator, built from the process
/// environment, is instantiated with.
pub type ProductionOrchestrator =
    crate::FanoutOrchestrator<Arc<ReqwestTransport>, Arc<EnvCredentialProvider>, Store, AnyGraph>;

/// Build a production [`crate::FanoutOrchestrator`] by reading every
/// environment key named in §6: platform tokens (via [`EnvCredentialProvider`]),
/// `TWITCH_CLIENT_ID`/`TWITCH_CLIENT_SECRET`, the relational store's
/// `DATABASE_URL`/`POSTGRES_DSN`/`SOCIAL_MEDIA_SQLITE_PATH`, and the graph
/// store's `NEO4J_*` triple.
///
/// # Errors
///
/// Returns [`CoreError::ConfigError`] if credential decryption fails, and
/// [`CoreError::Store`]/[`CoreError::Graph`] if the selected backends fail
/// to connect.
pub async fn build_from_env() -> Result<ProductionOrchestrator, CoreError> {
    let config = Config::from_env();
    let transport = Arc::new(ReqwestTransport::new());
    let credentials = Arc::new(EnvCredentialProvider::from_env()?);
    let twitch_client_id = std::env::var("TWITCH_CLIENT_ID").unwrap_or_default();
    let twitch_client_secret = std::env::var("TWITCH_CLIENT_SECRET").unwrap_or_default();

    let registry = AdapterRegistry::new(Arc::clone(&transport), credentials, twitch_client_id, twitch_client_secret);
    let store = Store::from_env().await?;
    let graph = AnyGraph::from_env().await?;

    Ok(crate::FanoutOrchestrator::new(registry, store, graph, transport, config.max_concurrency, config.cache_ttl))
}
