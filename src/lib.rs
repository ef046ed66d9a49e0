//! Hermod - client-side acceleration for AI completion endpoints
//!
//! Hermod sits between UI callers and a remote text-completion endpoint.
//! Bursty, repetitive callers (a chat-style terminal firing the same prompt
//! several times in one session) get:
//!
//! - a bounded, TTL-expiring response cache,
//! - in-flight deduplication, so identical concurrent queries share one call,
//! - dispatch under a hard timeout that always yields a displayable response,
//! - batched, low-priority prefetching of anticipated queries.
//!
//! # Example
//!
//! ```rust,no_run
//! use hermod::{Hermod, QueryRequest};
//!
//! #[tokio::main]
//! async fn main() -> hermod::Result<()> {
//!     let gateway = Hermod::builder()
//!         .endpoint_url("https://apex.example")
//!         .build()?;
//!
//!     // Warm the landing-page questions in the background.
//!     gateway.schedule_prefetch();
//!
//!     let response = gateway
//!         .query(&QueryRequest::new("What is APEX OS?").preferred_model("fast"))
//!         .await;
//!
//!     println!("[{}] {}", response.provider, response.content);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod prefetch;
pub mod telemetry;
pub mod traits;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheKey, InflightConfig};
pub use config::Config;
pub use dispatch::DispatchConfig;
pub use endpoint::{CompletionEndpoint, HttpEndpoint};
pub use error::{HermodError, Result};
pub use gateway::stream::{StreamConfig, StreamEvent};
pub use gateway::{AcceleratedGateway, Hermod, HermodBuilder};
pub use prefetch::{PrefetchConfig, PrefetchSummary};
pub use traits::QueryGateway;
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{HistoryMessage, Outcome, ProviderAttempt, QueryRequest, QueryResponse, Role};
