//! In-flight request deduplication.
//!
//! While a remote call for a key is outstanding, identical queries share
//! its outcome instead of dispatching again. Each pending entry wraps the
//! dispatch future in a [`Shared`] future, so every waiter receives a clone
//! of the same [`QueryResponse`].
//!
//! # Lifecycle
//!
//! Registering a future spawns a watcher task. The watcher drives the
//! future to completion even if every caller drops out, waits the grace
//! period, then removes the entry. The grace window means a caller that
//! raced past the cache write still finds the settled outcome instead of
//! starting a new call. Removal only happens if the entry still carries
//! the watcher's generation, so a newer registration under the same key
//! is never dropped by an old watcher.
//!
//! An entry older than the staleness bound is discarded on lookup.

use std::collections::HashMap;
use std::future::IntoFuture;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::debug;

use super::CacheKey;
use crate::types::QueryResponse;

/// A dispatch future that any number of callers can await.
pub type SharedQuery = Shared<BoxFuture<'static, QueryResponse>>;

/// Configuration for in-flight deduplication.
///
/// ```rust
/// # use hermod::InflightConfig;
/// # use std::time::Duration;
/// let config = InflightConfig::new().stale_after(Duration::from_secs(60));
/// assert_eq!(config.grace, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct InflightConfig {
    /// Age after which a pending entry is no longer trusted. Default: 30s.
    pub stale_after: Duration,
    /// How long a settled entry stays visible. Default: 1s.
    pub grace: Duration,
}

impl Default for InflightConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            grace: Duration::from_secs(1),
        }
    }
}

impl InflightConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staleness bound.
    pub fn stale_after(mut self, after: Duration) -> Self {
        self.stale_after = after;
        self
    }

    /// Set the post-settle grace period.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

/// Handle to an in-flight query. Await it for the shared response.
#[derive(Clone)]
pub struct PendingQuery {
    future: SharedQuery,
    generation: u64,
}

impl PendingQuery {
    /// Registration number; equal for every handle to the same dispatch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the underlying call has already settled.
    pub fn is_settled(&self) -> bool {
        self.future.peek().is_some()
    }
}

impl IntoFuture for PendingQuery {
    type Output = QueryResponse;
    type IntoFuture = SharedQuery;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

/// Whether [`Deduplicator::join_or_register`] started a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRole {
    /// No usable entry existed; the supplied future was registered.
    Leader,
    /// An outstanding entry was reused.
    Follower,
}

struct PendingEntry {
    future: SharedQuery,
    created_at: Instant,
    generation: u64,
}

impl PendingEntry {
    fn handle(&self) -> PendingQuery {
        PendingQuery {
            future: self.future.clone(),
            generation: self.generation,
        }
    }
}

struct Inner {
    pending: Mutex<HashMap<CacheKey, PendingEntry>>,
    next_generation: AtomicU64,
    config: InflightConfig,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, HashMap<CacheKey, PendingEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh entry for `key`, discarding it first if stale.
    fn fresh(
        &self,
        pending: &mut HashMap<CacheKey, PendingEntry>,
        key: &CacheKey,
    ) -> Option<PendingQuery> {
        let entry = pending.get(key)?;
        if entry.created_at.elapsed() > self.config.stale_after {
            debug!(%key, generation = entry.generation, "discarding stale pending entry");
            pending.remove(key);
            return None;
        }
        Some(entry.handle())
    }

    fn insert(
        &self,
        pending: &mut HashMap<CacheKey, PendingEntry>,
        key: CacheKey,
        future: BoxFuture<'static, QueryResponse>,
    ) -> PendingQuery {
        let entry = PendingEntry {
            future: future.shared(),
            created_at: Instant::now(),
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
        };
        let handle = entry.handle();
        pending.insert(key, entry);
        handle
    }

    fn remove_generation(&self, key: &CacheKey, generation: u64) {
        let mut pending = self.pending();
        if pending.get(key).is_some_and(|e| e.generation == generation) {
            pending.remove(key);
        }
    }
}

/// Tracks outstanding dispatches by [`CacheKey`].
///
/// Cheap to clone; clones share the same table. Registration needs a
/// tokio runtime (it spawns the cleanup watcher).
#[derive(Clone)]
pub struct Deduplicator {
    inner: Arc<Inner>,
}

impl Deduplicator {
    /// Create an empty deduplicator.
    pub fn new(config: &InflightConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                config: config.clone(),
            }),
        }
    }

    /// Outstanding (or recently settled) query for `key`, if still fresh.
    pub fn find_pending(&self, key: &CacheKey) -> Option<PendingQuery> {
        let mut pending = self.inner.pending();
        self.inner.fresh(&mut pending, key)
    }

    /// Track `future` as the in-flight query for `key`.
    ///
    /// Replaces any existing entry for the key.
    pub fn register_pending(
        &self,
        key: CacheKey,
        future: BoxFuture<'static, QueryResponse>,
    ) -> PendingQuery {
        let handle = {
            let mut pending = self.inner.pending();
            self.inner.insert(&mut pending, key, future)
        };
        self.watch(key, &handle);
        handle
    }

    /// Reuse the fresh entry for `key`, or register the future built by
    /// `make` if there is none.
    ///
    /// Lookup and registration happen under one lock, so concurrent
    /// callers for the same key get exactly one leader. `make` is only
    /// called for the leader and must not block.
    pub fn join_or_register<F>(&self, key: CacheKey, make: F) -> (PendingQuery, JoinRole)
    where
        F: FnOnce() -> BoxFuture<'static, QueryResponse>,
    {
        let handle = {
            let mut pending = self.inner.pending();
            if let Some(existing) = self.inner.fresh(&mut pending, &key) {
                return (existing, JoinRole::Follower);
            }
            self.inner.insert(&mut pending, key, make())
        };
        self.watch(key, &handle);
        (handle, JoinRole::Leader)
    }

    fn watch(&self, key: CacheKey, handle: &PendingQuery) {
        let inner = Arc::clone(&self.inner);
        let future = handle.future.clone();
        let generation = handle.generation;
        tokio::spawn(async move {
            // A panicked dispatch still has to leave the table.
            let _ = AssertUnwindSafe(future).catch_unwind().await;
            tokio::time::sleep(inner.config.grace).await;
            inner.remove_generation(&key, generation);
        });
    }

    /// Number of tracked entries (including settled ones inside their grace period).
    pub fn len(&self) -> usize {
        self.inner.pending().len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all entries. Outstanding calls keep running for their waiters.
    pub fn clear(&self) {
        self.inner.pending().clear();
    }
}
