//! Decision cache: bounded, TTL-based memoization of access results.
//!
//! The cache key is deliberately coarse — domain, subject id, object id,
//! action verb, client IP, and the request *date* (day granularity). Two
//! contexts sharing that tuple collide even if other attributes differ,
//! including time of day; rules such as `env.time = business_hours` can
//! therefore be served a stale decision within the TTL window. Known
//! trade-off, kept as designed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use super::context::AccessContext;
use super::result::{AccessResult, Decision};

/// Derives the cache key for a request.
pub fn fingerprint(domain: &str, context: &AccessContext) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}",
        domain,
        context.subject().get_id(),
        context.object().get_id(),
        context.action().get_verb(),
        context.environment().get_client_ip(),
        context.environment().get_request_time().format("%Y-%m-%d"),
    )
}

struct CacheEntry {
    result: AccessResult,
    inserted_at: Instant,
}

/// Counters and size figures for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that fell through to evaluation
    pub misses: u64,
    /// Total lookups
    pub total: u64,
    /// hits / total, 0.0 when the cache was never consulted
    pub hit_rate: f64,
    /// Entries currently stored
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
}

/// Bounded TTL cache for access decisions.
///
/// Safe for concurrent lookups and inserts; eviction removes entries by
/// key, so in-flight readers are never corrupted, and the hit/miss
/// counters are atomic.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use abac_engine_core::access::AccessCache;
///
/// let cache = AccessCache::new()
///     .max_size(500)
///     .ttl(Duration::from_secs(30));
/// ```
pub struct AccessCache {
    entries: DashMap<String, CacheEntry>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for AccessCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessCache {
    /// Creates a cache with the default capacity (1000 entries) and TTL
    /// (5 minutes).
    pub fn new() -> Self {
        AccessCache {
            entries: DashMap::new(),
            max_size: 1000,
            ttl: Duration::from_secs(300),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Sets the capacity (builder pattern).
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the entry time-to-live (builder pattern).
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Looks up a decision.
    ///
    /// Counts a hit or a miss on every call; an entry found past its TTL
    /// is purged and counted as a miss.
    pub fn get(&self, key: &str) -> Option<AccessResult> {
        let mut expired = false;
        let fresh = {
            match self.entries.get(key) {
                Some(entry) => {
                    if entry.inserted_at.elapsed() < self.ttl {
                        Some(entry.result.clone())
                    } else {
                        expired = true;
                        None
                    }
                }
                None => None,
            }
        };

        match fresh {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            None => {
                if expired {
                    self.entries.remove(key);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a decision.
    ///
    /// Error (INDETERMINATE) results are never cached. At capacity the
    /// oldest tenth of the entries is evicted first.
    pub fn put(&self, key: String, result: AccessResult) {
        if result.decision() == Decision::Indeterminate {
            return;
        }
        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes the oldest ~10% of entries (at least one) by insertion
    /// timestamp.
    fn evict_oldest(&self) {
        let batch = std::cmp::max(1, self.max_size / 10);
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

        let evicted = by_age.len().min(batch);
        for (key, _) in by_age.into_iter().take(batch) {
            self.entries.remove(&key);
        }
        debug!(evicted, "cache at capacity, evicted oldest entries");
    }

    /// Drops every entry; counters are unaffected.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache so far.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that missed so far.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters and sizes.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            total,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            size: self.entries.len(),
            max_size: self.max_size,
        }
    }
}
