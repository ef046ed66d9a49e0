//! The remote completion call.
//!
//! Everything above this module treats "ask the AI" as one opaque call.
//! [`CompletionEndpoint`] is that call; [`HttpEndpoint`] is the production
//! implementation speaking the unified JSON contract over HTTP.
//!
//! Endpoints report failures as [`HermodError`](crate::HermodError). They do
//! not enforce a deadline themselves: the [`Dispatcher`](crate::dispatch::Dispatcher)
//! owns the timeout and drops the call future when it elapses.

mod http;
pub(crate) mod wire;

use async_trait::async_trait;

use crate::Result;
use crate::types::{QueryRequest, QueryResponse};

pub use http::{DEFAULT_BASE_URL, DEFAULT_PATH, HttpEndpoint};

/// A remote text-completion service.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    /// Endpoint name for logging/debugging.
    fn name(&self) -> &str;

    /// Perform one remote call.
    ///
    /// The returned response is treated as uncached regardless of its flag.
    async fn complete(&self, request: &QueryRequest) -> Result<QueryResponse>;
}
