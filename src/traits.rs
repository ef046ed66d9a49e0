//! Core QueryGateway trait

use async_trait::async_trait;

use crate::{QueryRequest, QueryResponse};

/// The surface UI collaborators program against.
///
/// Implemented by [`AcceleratedGateway`](crate::AcceleratedGateway); tests
/// and alternative front-ends can supply their own.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Answer a query. Always yields a displayable response.
    async fn query(&self, request: &QueryRequest) -> QueryResponse;

    /// Warm the cache in the background (fire-and-forget).
    fn prefetch(&self, requests: Vec<QueryRequest>);

    /// Drop all cached state.
    fn clear(&self);
}
