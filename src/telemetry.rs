//! Telemetry metric name constants.
//!
//! Centralised metric names for hermod operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hermod_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `outcome`: dispatch result: "ok", "timeout" or "offline"

/// Total cache hits served without a remote call.
pub const CACHE_HITS_TOTAL: &str = "hermod_cache_hits_total";

/// Total cache misses (including lookups that found an expired entry).
pub const CACHE_MISSES_TOTAL: &str = "hermod_cache_misses_total";

/// Total entries evicted because the cache was at capacity.
pub const CACHE_EVICTIONS_TOTAL: &str = "hermod_cache_evictions_total";

/// Total callers that joined an in-flight request instead of dispatching.
pub const DEDUP_JOINS_TOTAL: &str = "hermod_dedup_joins_total";

/// Total remote calls issued by the dispatcher.
///
/// Labels: `outcome` ("ok" | "timeout" | "offline").
pub const DISPATCH_TOTAL: &str = "hermod_dispatch_total";

/// Remote call duration in seconds, including timed-out calls.
///
/// Labels: `outcome`.
pub const DISPATCH_DURATION_SECONDS: &str = "hermod_dispatch_duration_seconds";

/// Total prefetch attempts.
///
/// Labels: `outcome` ("ok" | "timeout" | "offline").
pub const PREFETCH_TOTAL: &str = "hermod_prefetch_total";
