//! Bounded, TTL-expiring store of completed responses.
//!
//! [`ResponseCache`] keeps at most `max_entries` responses. Each entry
//! carries its own TTL so prefetched answers can outlive interactive ones.
//! Expiry is lazy: an expired entry is removed by the lookup that finds
//! it; there is no background sweep.
//!
//! # Eviction order
//!
//! Eviction is by insertion order, not recency of use. Reading an entry
//! never protects it; writing a key again replaces the entry wholesale
//! and moves it to the newest position.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::CacheKey;
use crate::telemetry;
use crate::types::QueryResponse;

/// Configuration for the response cache.
///
/// ```rust
/// # use hermod::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(60));
/// assert_eq!(config.prefetch_ttl, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. 0 disables caching. Default: 100.
    pub max_entries: usize,
    /// Time-to-live for interactively cached responses. Default: 5 minutes.
    pub ttl: Duration,
    /// Time-to-live for prefetched responses. Default: 10 minutes.
    pub prefetch_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(5 * 60),
            prefetch_ttl: Duration::from_secs(10 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for interactive entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the time-to-live for prefetched entries.
    pub fn prefetch_ttl(mut self, ttl: Duration) -> Self {
        self.prefetch_ttl = ttl;
        self
    }
}

struct CacheEntry {
    response: QueryResponse,
    inserted_at: Instant,
    ttl: Duration,
    /// Position in [`Store::order`].
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }
}

#[derive(Default)]
struct Store {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Keys by insertion sequence, oldest first. Always holds exactly the
    /// keys of `entries`.
    order: BTreeMap<u64, CacheKey>,
    next_seq: u64,
}

impl Store {
    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn insert(&mut self, key: CacheKey, response: QueryResponse, ttl: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
                ttl,
                seq,
            },
        );
        self.order.insert(seq, key);
    }

    /// Return the live entry for `key`, dropping it first if it has expired.
    fn live(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        let expired = self.entries.get(key)?.is_expired(Instant::now());
        if expired {
            self.remove(key);
            debug!(%key, "cache entry expired");
            return None;
        }
        self.entries.get(key)
    }
}

/// In-memory response cache.
///
/// Thread-safe: all operations take a short internal lock and never
/// hold it across an await point.
pub struct ResponseCache {
    store: Mutex<Store>,
    config: CacheConfig,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            config: config.clone(),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Default TTL for interactive writes.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// TTL for prefetched writes.
    pub fn prefetch_ttl(&self) -> Duration {
        self.config.prefetch_ttl
    }

    /// Configured capacity.
    pub fn max_entries(&self) -> usize {
        self.config.max_entries
    }

    /// Look up a response.
    ///
    /// Hits come back marked `cached` with zero latency. Expired entries
    /// are removed and reported as a miss. Emits cache hit/miss metrics.
    pub fn get(&self, key: &CacheKey) -> Option<QueryResponse> {
        let hit = self.store().live(key).map(|entry| entry.response.as_cached());
        match hit {
            Some(response) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(response)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Whether a fresh entry exists, without counting a hit or miss.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.store().live(key).is_some()
    }

    /// Store a response under `key` for `ttl`.
    ///
    /// At capacity, the oldest-inserted entry is evicted first.
    pub fn put(&self, key: CacheKey, response: QueryResponse, ttl: Duration) {
        if self.config.max_entries == 0 {
            return;
        }

        let mut store = self.store();
        store.remove(&key);
        while store.entries.len() >= self.config.max_entries {
            let Some((_, oldest)) = store.order.pop_first() else {
                break;
            };
            store.entries.remove(&oldest);
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
            debug!(key = %oldest, "cache entry evicted");
        }

        store.insert(key, response, ttl);
    }

    /// Drop a single entry. Returns whether one was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.store().remove(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet touched.
    pub fn len(&self) -> usize {
        self.store().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        let mut store = self.store();
        store.entries.clear();
        store.order.clear();
    }
}
