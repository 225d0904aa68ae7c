//! Verification result store.
//!
//! Verification is idempotent, so re-verifying an identical (track,
//! constraints) pair is pure waste. The orchestrator consults an injected
//! store before dispatching work. The store is an explicit interface, not
//! a module-level map: the pipeline itself stays stateless and tests can
//! inject [`NoopStore`] to disable caching entirely.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use attune_core::{ProtocolConstraints, VerificationResult};
use moka::future::Cache;

use crate::config::StoreConfig;

/// Store key for one (track, constraints) evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
    catalog_id: String,
    constraints_hash: u64,
}

impl StoreKey {
    /// Build a key from a track identity and the constraints it will be
    /// evaluated against.
    pub fn new(catalog_id: &str, constraints: &ProtocolConstraints) -> Self {
        Self {
            catalog_id: catalog_id.to_string(),
            constraints_hash: hash_constraints(constraints),
        }
    }
}

fn hash_constraints(constraints: &ProtocolConstraints) -> u64 {
    let mut hasher = DefaultHasher::new();
    // Serialized form gives a stable, total view of the value; field order
    // is fixed by the struct definition.
    serde_json::to_string(constraints)
        .unwrap_or_default()
        .hash(&mut hasher);
    hasher.finish()
}

/// Injected cache of verification results.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Fetch a cached result.
    async fn get(&self, key: &StoreKey) -> Option<VerificationResult>;

    /// Store a result.
    async fn put(&self, key: StoreKey, result: VerificationResult);

    /// Drop every cached entry.
    fn invalidate_all(&self);
}

/// Moka-backed store with size and TTL bounds.
pub struct MokaStore {
    cache: Cache<StoreKey, VerificationResult>,
}

impl MokaStore {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

#[async_trait]
impl VerificationStore for MokaStore {
    async fn get(&self, key: &StoreKey) -> Option<VerificationResult> {
        self.cache.get(key).await
    }

    async fn put(&self, key: StoreKey, result: VerificationResult) {
        self.cache.insert(key, result).await;
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Store that remembers nothing. Every lookup misses.
pub struct NoopStore;

#[async_trait]
impl VerificationStore for NoopStore {
    async fn get(&self, _key: &StoreKey) -> Option<VerificationResult> {
        None
    }

    async fn put(&self, _key: StoreKey, _result: VerificationResult) {}

    fn invalidate_all(&self) {}
}
