//! Query-result memoization.
//!
//! Entries never expire and are never invalidated by writes; staleness is an
//! accepted trade-off of this layer, and callers needing fresh data bypass
//! the cache. An optional entry cap bounds memory without changing that
//! contract.

use crate::domain::types::{QueryResult, QuerySignature};
use crate::domain::StoreError;
use dashmap::DashMap;
use std::future::Future;
use tracing::debug;

/// Bound on cache growth. The default keeps every entry forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Never evict (matches the layer's no-invalidation contract).
    #[default]
    None,
    /// Stop storing new entries once the cache holds this many. Existing
    /// entries keep serving hits; nothing is removed.
    MaxEntries(usize),
}

/// Memoizes read-only operation results keyed by exact query signature.
///
/// Safe under concurrent miss-then-populate races: divergent misses may both
/// compute, the last writer wins, and readers only ever observe fully
/// populated entries.
pub struct QueryCache {
    entries: DashMap<QuerySignature, QueryResult>,
    policy: EvictionPolicy,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_policy(EvictionPolicy::None)
    }

    pub fn with_policy(policy: EvictionPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    /// Stored result for a signature, if any.
    pub fn lookup(&self, signature: &QuerySignature) -> Option<QueryResult> {
        self.entries.get(signature).map(|entry| entry.clone())
    }

    /// Return the cached result, or run the read and cache its result.
    ///
    /// Only successful results are stored, so an entry is either absent or
    /// fully populated. Failures propagate uncached.
    pub async fn get_or_run<F, Fut>(
        &self,
        signature: QuerySignature,
        run: F,
    ) -> Result<QueryResult, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryResult, StoreError>>,
    {
        if let Some(hit) = self.lookup(&signature) {
            debug!(signature = signature.as_str(), "query cache hit");
            return Ok(hit);
        }

        let result = run().await?;
        self.store(signature, result.clone());
        Ok(result)
    }

    fn store(&self, signature: QuerySignature, result: QueryResult) {
        if let EvictionPolicy::MaxEntries(cap) = self.policy {
            if self.entries.len() >= cap && !self.entries.contains_key(&signature) {
                debug!(
                    signature = signature.as_str(),
                    cap, "query cache at capacity; result not stored"
                );
                return;
            }
        }
        self.entries.insert(signature, result);
    }

    /// Drop one entry (manual invalidation hook).
    pub fn remove(&self, signature: &QuerySignature) -> Option<QueryResult> {
        self.entries.remove(signature).map(|(_, result)| result)
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
