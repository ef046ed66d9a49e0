//! Low-priority cache warm-up.
//!
//! The prefetcher pushes anticipated queries through the same facade path
//! as real callers, so in-flight deduplication still applies. Requests
//! already fresh in the cache are skipped. The rest go out in small
//! concurrent batches with a pause between batches, and successful
//! answers are cached with the longer prefetch TTL.
//!
//! Prefetching never surfaces a failure. Timeout and offline outcomes are
//! logged at debug level and counted, nothing more.

use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::cache::CacheKey;
use crate::gateway::AcceleratedGateway;
use crate::telemetry;
use crate::types::{Outcome, QueryRequest};

/// Configuration for prefetching.
///
/// ```rust
/// # use hermod::{PrefetchConfig, QueryRequest};
/// # use std::time::Duration;
/// let config = PrefetchConfig::new()
///     .batch_size(2)
///     .queries(vec![QueryRequest::new("What is this?")]);
/// assert_eq!(config.batch_delay, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Requests dispatched concurrently per batch. Default: 3.
    pub batch_size: usize,
    /// Pause between batches. Default: 100ms.
    pub batch_delay: Duration,
    /// Delay before a scheduled prefetch starts. Default: 2s.
    pub start_delay: Duration,
    /// Anticipated queries warmed by
    /// [`schedule_prefetch()`](crate::AcceleratedGateway::schedule_prefetch).
    pub queries: Vec<QueryRequest>,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_delay: Duration::from_millis(100),
            start_delay: Duration::from_secs(2),
            queries: default_queries(),
        }
    }
}

impl PrefetchConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size (values below 1 are treated as 1).
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Set the pause between batches.
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Set the delay before a scheduled prefetch starts.
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Replace the anticipated query set.
    pub fn queries(mut self, queries: Vec<QueryRequest>) -> Self {
        self.queries = queries;
        self
    }
}

/// The landing-page questions visitors ask first.
pub fn default_queries() -> Vec<QueryRequest> {
    vec![
        QueryRequest::new("What is APEX OS?")
            .system_prompt("Brief 2-sentence explanation for landing page")
            .preferred_model("fast"),
        QueryRequest::new("How does the AI orchestration work?")
            .system_prompt("Simple technical explanation")
            .preferred_model("fast"),
        QueryRequest::new("What makes this different from other AI tools?")
            .system_prompt("Differentiation focus")
            .preferred_model("fast"),
    ]
}

/// Tally of one prefetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    /// Already fresh in the cache; not dispatched.
    pub skipped: usize,
    /// Resolved successfully (and cached).
    pub warmed: usize,
    /// Resolved with a timeout or offline response; not cached.
    pub failed: usize,
}

/// Batches anticipated queries through a gateway.
#[derive(Debug, Clone)]
pub struct Prefetcher {
    batch_size: usize,
    batch_delay: Duration,
}

impl Prefetcher {
    pub fn new(config: &PrefetchConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
        }
    }

    /// Warm the cache for every request that is not already fresh.
    pub async fn run(
        &self,
        gateway: &AcceleratedGateway,
        requests: &[QueryRequest],
    ) -> PrefetchSummary {
        let mut summary = PrefetchSummary::default();
        let cold: Vec<&QueryRequest> = requests
            .iter()
            .filter(|request| {
                let warm = gateway.is_cached(request);
                if warm {
                    debug!(key = %CacheKey::derive(request), "prefetch skipped, already cached");
                    summary.skipped += 1;
                }
                !warm
            })
            .collect();

        if cold.is_empty() {
            return summary;
        }
        info!(
            count = cold.len(),
            skipped = summary.skipped,
            "prefetching anticipated queries"
        );

        let ttl = gateway.cache().prefetch_ttl();
        let mut batches = cold.chunks(self.batch_size).peekable();
        while let Some(batch) = batches.next() {
            let outcomes = join_all(batch.iter().map(|request| async move {
                let response = gateway.resolve(request, ttl).await;
                (CacheKey::derive(request), response.outcome())
            }))
            .await;

            for (key, outcome) in outcomes {
                metrics::counter!(telemetry::PREFETCH_TOTAL, "outcome" => outcome.as_str())
                    .increment(1);
                if outcome == Outcome::Completed {
                    summary.warmed += 1;
                } else {
                    debug!(%key, outcome = outcome.as_str(), "prefetch failed, ignoring");
                    summary.failed += 1;
                }
            }

            if batches.peek().is_some() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!(
            warmed = summary.warmed,
            failed = summary.failed,
            "prefetch finished"
        );
        summary
    }
}
