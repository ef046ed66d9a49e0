//! JSON bodies exchanged with the completion endpoint.

use serde::{Deserialize, Serialize};

use crate::types::{HistoryMessage, ProviderAttempt, QueryRequest, QueryResponse};

/// Request body, borrowed from a [`QueryRequest`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionRequest<'a> {
    message: &'a str,
    history: &'a [HistoryMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_hints: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    debug: bool,
}

impl<'a> From<&'a QueryRequest> for CompletionRequest<'a> {
    fn from(request: &'a QueryRequest) -> Self {
        Self {
            message: &request.message,
            history: &request.history,
            context: request.context.as_deref(),
            system_prompt: request.system_prompt.as_deref(),
            preferred_provider: request.preferred_provider.as_deref(),
            preferred_model: request.preferred_model.as_deref(),
            user_email: request.user_email.as_deref(),
            user_id: request.user_id.as_deref(),
            session_id: request.session_id.as_deref(),
            state_hints: request.state_hints.as_ref(),
            debug: request.debug,
        }
    }
}

/// Success body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionReply {
    content: String,
    provider: String,
    model: String,
    /// Milliseconds; some providers report fractional values.
    #[serde(default)]
    latency: f64,
    #[serde(default)]
    tier: u32,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    debug: Option<DebugTrace>,
}

#[derive(Debug, Deserialize)]
struct DebugTrace {
    #[serde(default)]
    attempts: Vec<ProviderAttempt>,
}

impl From<CompletionReply> for QueryResponse {
    fn from(reply: CompletionReply) -> Self {
        Self {
            content: reply.content,
            provider: reply.provider,
            model: reply.model,
            latency_ms: reply.latency.max(0.0).round() as u64,
            tier: reply.tier,
            cached: false,
            request_id: reply.request_id,
            attempts: reply.debug.map(|trace| trace.attempts),
        }
    }
}
