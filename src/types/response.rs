//! Query response types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provider marker on responses synthesized by the dispatcher.
pub const OFFLINE_PROVIDER: &str = "offline";

/// Model marker for a remote call that exceeded its timeout budget.
pub const TIMEOUT_MODEL: &str = "timeout";

/// Model marker for a remote call that failed for any other reason.
pub const FALLBACK_MODEL: &str = "fallback";

const TIMEOUT_CONTENT: &str =
    "⚠️ REQUEST_TIMEOUT: The AI provider took too long to respond. Please try again.";

const FALLBACK_CONTENT: &str =
    "I'm currently experiencing connectivity issues. Please try again in a moment.";

/// One provider attempt reported by the endpoint in debug mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// A displayable answer, always present even when the remote call failed.
///
/// Timeouts and transport failures are encoded through the
/// [`OFFLINE_PROVIDER`] marker rather than as errors; use
/// [`outcome()`](Self::outcome) to tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    /// Round-trip latency. Always 0 when served from cache.
    pub latency_ms: u64,
    #[serde(default)]
    pub tier: u32,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<ProviderAttempt>>,
}

impl QueryResponse {
    /// Response for a call cancelled after exceeding its budget.
    pub fn timed_out(elapsed: Duration) -> Self {
        Self::offline_with(TIMEOUT_MODEL, TIMEOUT_CONTENT, elapsed)
    }

    /// Response for a call that failed before the budget elapsed.
    pub fn offline(elapsed: Duration) -> Self {
        Self::offline_with(FALLBACK_MODEL, FALLBACK_CONTENT, elapsed)
    }

    fn offline_with(model: &str, content: &str, elapsed: Duration) -> Self {
        Self {
            content: content.to_string(),
            provider: OFFLINE_PROVIDER.to_string(),
            model: model.to_string(),
            latency_ms: elapsed.as_millis() as u64,
            tier: 0,
            cached: false,
            request_id: None,
            attempts: None,
        }
    }

    /// Classify this response by the dispatcher's markers.
    pub fn outcome(&self) -> Outcome {
        if self.provider != OFFLINE_PROVIDER {
            Outcome::Completed
        } else if self.model == TIMEOUT_MODEL {
            Outcome::TimedOut
        } else {
            Outcome::Offline
        }
    }

    /// Whether this response came from a real completion (and may be cached).
    pub fn is_success(&self) -> bool {
        self.outcome() == Outcome::Completed
    }

    /// The copy handed out on a cache hit.
    pub(crate) fn as_cached(&self) -> Self {
        Self {
            cached: true,
            latency_ms: 0,
            ..self.clone()
        }
    }
}

/// How a query was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The endpoint answered within budget.
    Completed,
    /// The timeout budget elapsed first.
    TimedOut,
    /// Network, status or payload failure (or the endpoint itself reported offline).
    Offline,
}

impl Outcome {
    /// Metric label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Completed => "ok",
            Outcome::TimedOut => "timeout",
            Outcome::Offline => "offline",
        }
    }
}
