//! Caching subsystem.
//!
//! Two stores, both keyed by [`CacheKey`]:
//!
//! - [`response::ResponseCache`]: bounded, TTL-expiring responses from
//!   completed calls. Insertion-order eviction, lazy expiry.
//!
//! - [`inflight::Deduplicator`]: calls still awaiting the endpoint, so
//!   identical concurrent queries share one dispatch.
//!
//! The facade always consults the response cache first and the
//! deduplicator only on a miss.

pub mod inflight;
pub mod key;
pub mod response;

pub use inflight::{Deduplicator, InflightConfig, JoinRole, PendingQuery, SharedQuery};
pub use key::CacheKey;
pub use response::{CacheConfig, ResponseCache};
