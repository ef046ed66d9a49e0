//! Bounded-timeout dispatch.
//!
//! [`Dispatcher`] is the single boundary where endpoint errors stop. It
//! issues exactly one remote call per [`dispatch()`](Dispatcher::dispatch)
//! and always returns a [`QueryResponse`]:
//!
//! 1. success within budget → the endpoint's response, `cached = false`
//! 2. budget elapsed → [`QueryResponse::timed_out`]
//! 3. any other failure → [`QueryResponse::offline`]
//!
//! A panicking endpoint counts as case 3; the panic does not propagate.
//!
//! The timeout drops the call future, which cancels the outstanding
//! request on the client side. The remote side may keep working.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;
use tracing::warn;

use crate::endpoint::CompletionEndpoint;
use crate::telemetry;
use crate::types::{QueryRequest, QueryResponse};

/// Configuration for remote dispatch.
///
/// ```rust
/// # use hermod::DispatchConfig;
/// # use std::time::Duration;
/// let config = DispatchConfig::new().timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Budget for one remote call. Default: 45s.
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45),
        }
    }
}

impl DispatchConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Issues remote calls under a timeout and normalizes every outcome.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: Arc<dyn CompletionEndpoint>,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher for `endpoint`.
    pub fn new(endpoint: Arc<dyn CompletionEndpoint>, config: &DispatchConfig) -> Self {
        Self {
            endpoint,
            timeout: config.timeout,
        }
    }

    /// Per-call budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one remote call. Never fails.
    pub async fn dispatch(&self, request: &QueryRequest) -> QueryResponse {
        let start = Instant::now();
        let call = AssertUnwindSafe(self.endpoint.complete(request)).catch_unwind();
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(mut response))) => {
                response.cached = false;
                response
            }
            Ok(Ok(Err(e))) => {
                warn!(
                    endpoint = self.endpoint.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "completion request failed, serving fallback"
                );
                QueryResponse::offline(start.elapsed())
            }
            Ok(Err(panic)) => {
                warn!(
                    endpoint = self.endpoint.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    panic = panic_message(panic.as_ref()),
                    "completion request panicked, serving fallback"
                );
                QueryResponse::offline(start.elapsed())
            }
            Err(_) => {
                warn!(
                    endpoint = self.endpoint.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "completion request timed out"
                );
                QueryResponse::timed_out(start.elapsed())
            }
        };

        let outcome = response.outcome().as_str();
        metrics::counter!(telemetry::DISPATCH_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(telemetry::DISPATCH_DURATION_SECONDS, "outcome" => outcome)
            .record(start.elapsed().as_secs_f64());

        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
