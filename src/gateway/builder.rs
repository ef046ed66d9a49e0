//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::AcceleratedGateway;
use super::stream::StreamConfig;
use crate::cache::{CacheConfig, Deduplicator, InflightConfig, ResponseCache};
use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::endpoint::{CompletionEndpoint, HttpEndpoint};
use crate::prefetch::PrefetchConfig;
use crate::{HermodError, Result};

/// Main entry point for creating gateway instances.
pub struct Hermod;

impl Hermod {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> HermodBuilder {
        HermodBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// An endpoint is required: either a base URL for the built-in
/// [`HttpEndpoint`] or a custom [`CompletionEndpoint`]. A custom endpoint
/// wins if both are set.
pub struct HermodBuilder {
    endpoint_url: Option<String>,
    endpoint_path: Option<String>,
    endpoint: Option<Arc<dyn CompletionEndpoint>>,
    cache: CacheConfig,
    inflight: InflightConfig,
    dispatch: DispatchConfig,
    prefetch: PrefetchConfig,
    stream: StreamConfig,
}

impl HermodBuilder {
    pub fn new() -> Self {
        Self {
            endpoint_url: None,
            endpoint_path: None,
            endpoint: None,
            cache: CacheConfig::default(),
            inflight: InflightConfig::default(),
            dispatch: DispatchConfig::default(),
            prefetch: PrefetchConfig::default(),
            stream: StreamConfig::default(),
        }
    }

    /// Base URL of the unified completion endpoint.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Route path appended to the base URL (default: `/api/ai-unified`).
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    /// Use a custom endpoint implementation.
    pub fn endpoint(mut self, endpoint: Arc<dyn CompletionEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Configure the response cache.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Configure in-flight deduplication.
    pub fn inflight(mut self, config: InflightConfig) -> Self {
        self.inflight = config;
        self
    }

    /// Configure dispatch.
    pub fn dispatch(mut self, config: DispatchConfig) -> Self {
        self.dispatch = config;
        self
    }

    /// Shorthand for the dispatch timeout budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.dispatch.timeout = timeout;
        self
    }

    /// Configure prefetching.
    pub fn prefetch(mut self, config: PrefetchConfig) -> Self {
        self.prefetch = config;
        self
    }

    /// Configure progressive streaming.
    pub fn stream(mut self, config: StreamConfig) -> Self {
        self.stream = config;
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<AcceleratedGateway> {
        let endpoint: Arc<dyn CompletionEndpoint> = match (self.endpoint, self.endpoint_url) {
            (Some(endpoint), _) => endpoint,
            (None, Some(url)) => {
                let mut http = HttpEndpoint::new(url)?;
                if let Some(path) = self.endpoint_path {
                    http = http.path(path);
                }
                Arc::new(http)
            }
            (None, None) => return Err(HermodError::NoEndpoint),
        };

        Ok(AcceleratedGateway::new(
            ResponseCache::new(&self.cache),
            Deduplicator::new(&self.inflight),
            Dispatcher::new(endpoint, &self.dispatch),
            self.prefetch,
            self.stream,
        ))
    }
}

impl Default for HermodBuilder {
    fn default() -> Self {
        Self::new()
    }
}
