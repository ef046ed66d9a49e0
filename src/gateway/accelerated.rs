//! AcceleratedGateway - the query facade

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{FutureExt, Stream};
use tokio::task::JoinHandle;
use tracing::debug;

use super::stream::{StreamConfig, StreamEvent, progressive};
use crate::cache::{CacheKey, Deduplicator, JoinRole, ResponseCache};
use crate::dispatch::Dispatcher;
use crate::prefetch::{PrefetchConfig, PrefetchSummary, Prefetcher};
use crate::telemetry;
use crate::traits::QueryGateway;
use crate::types::{QueryRequest, QueryResponse};

struct Inner {
    cache: ResponseCache,
    inflight: Deduplicator,
    dispatcher: Dispatcher,
    prefetcher: Prefetcher,
    prefetch: PrefetchConfig,
    prefetch_scheduled: AtomicBool,
    stream: StreamConfig,
}

/// Single entry point for queries.
///
/// Every query runs the same pipeline: cache lookup, in-flight lookup,
/// dispatch, cache write, in-flight cleanup. There are no retries here;
/// the dispatcher already turns every failure into a terminal response.
///
/// Cheap to clone; clones share the cache and the in-flight table.
/// Build one with [`Hermod::builder()`](crate::Hermod::builder).
#[derive(Clone)]
pub struct AcceleratedGateway {
    inner: Arc<Inner>,
}

impl AcceleratedGateway {
    pub(crate) fn new(
        cache: ResponseCache,
        inflight: Deduplicator,
        dispatcher: Dispatcher,
        prefetch: PrefetchConfig,
        stream: StreamConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                inflight,
                dispatcher,
                prefetcher: Prefetcher::new(&prefetch),
                prefetch,
                prefetch_scheduled: AtomicBool::new(false),
                stream,
            }),
        }
    }

    /// Answer a query, from cache when possible.
    pub async fn query(&self, request: &QueryRequest) -> QueryResponse {
        self.resolve(request, self.inner.cache.ttl()).await
    }

    /// The pipeline behind [`query()`](Self::query); `ttl` applies to the
    /// cache write if this call ends up dispatching.
    pub(crate) async fn resolve(&self, request: &QueryRequest, ttl: Duration) -> QueryResponse {
        let key = CacheKey::derive(request);
        if let Some(hit) = self.inner.cache.get(&key) {
            debug!(%key, "cache hit");
            return hit;
        }

        let (pending, role) = self.inner.inflight.join_or_register(key, || {
            let inner = Arc::clone(&self.inner);
            let request = request.clone();
            async move {
                let response = inner.dispatcher.dispatch(&request).await;
                if response.is_success() {
                    inner.cache.put(key, response.clone(), ttl);
                }
                response
            }
            .boxed()
        });

        match role {
            JoinRole::Leader => debug!(%key, "dispatching"),
            JoinRole::Follower => {
                metrics::counter!(telemetry::DEDUP_JOINS_TOTAL).increment(1);
                debug!(%key, generation = pending.generation(), "joined in-flight request");
            }
        }

        pending.await
    }

    /// Warm the cache in the background. The handle may be ignored.
    pub fn prefetch(&self, requests: Vec<QueryRequest>) -> JoinHandle<()> {
        let gateway = self.clone();
        tokio::spawn(async move {
            gateway.warm(&requests).await;
        })
    }

    /// Warm the cache and wait for it to finish.
    pub async fn warm(&self, requests: &[QueryRequest]) -> PrefetchSummary {
        self.inner.prefetcher.run(self, requests).await
    }

    /// Warm the configured anticipated queries once, after the start delay.
    ///
    /// Returns `None` if a prefetch was already scheduled on this gateway.
    pub fn schedule_prefetch(&self) -> Option<JoinHandle<()>> {
        if self.inner.prefetch_scheduled.swap(true, Ordering::AcqRel) {
            return None;
        }
        let gateway = self.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(gateway.inner.prefetch.start_delay).await;
            gateway.warm(&gateway.inner.prefetch.queries).await;
        }))
    }

    /// Answer a query as a word-by-word stream ending in the full response.
    pub fn query_stream(
        &self,
        request: QueryRequest,
    ) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
        let gateway = self.clone();
        progressive(
            async move { gateway.query(&request).await },
            &self.inner.stream,
        )
    }

    /// Whether a fresh cached response exists for `request`.
    pub fn is_cached(&self, request: &QueryRequest) -> bool {
        self.inner.cache.contains(&CacheKey::derive(request))
    }

    /// Drop every cached response and forget in-flight entries.
    pub fn clear(&self) {
        self.inner.cache.clear();
        self.inner.inflight.clear();
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// The in-flight table.
    pub fn inflight(&self) -> &Deduplicator {
        &self.inner.inflight
    }
}

#[async_trait]
impl QueryGateway for AcceleratedGateway {
    async fn query(&self, request: &QueryRequest) -> QueryResponse {
        AcceleratedGateway::query(self, request).await
    }

    fn prefetch(&self, requests: Vec<QueryRequest>) {
        AcceleratedGateway::prefetch(self, requests);
    }

    fn clear(&self) {
        AcceleratedGateway::clear(self);
    }
}
