//! HTTP client for the unified completion endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::CompletionEndpoint;
use super::wire::{CompletionReply, CompletionRequest};
use crate::types::{QueryRequest, QueryResponse};
use crate::{HermodError, Result};

/// Default base URL (a locally served API).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Default path of the unified completion route.
pub const DEFAULT_PATH: &str = "/api/ai-unified";

/// Client for the unified completion endpoint.
///
/// Posts [`QueryRequest`]s as camelCase JSON to `{base_url}{path}`.
/// No client-level timeout is set; the dispatcher enforces the budget.
#[derive(Clone)]
pub struct HttpEndpoint {
    http: Client,
    base_url: String,
    path: String,
}

impl HttpEndpoint {
    /// Create an endpoint rooted at `base_url` using the default path.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("hermod/{}", crate::version_string()))
            .build()
            .map_err(|e| HermodError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create an endpoint sharing an existing HTTP client.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            path: DEFAULT_PATH.to_string(),
        }
    }

    /// Override the route path (default: `/api/ai-unified`).
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Full URL requests are posted to.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

#[async_trait]
impl CompletionEndpoint for HttpEndpoint {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn complete(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = self.url();
        let response = self
            .http
            .post(&url)
            .json(&CompletionRequest::from(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HermodError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(HermodError::EmptyResponse);
        }

        let reply: CompletionReply = serde_json::from_slice(&body)?;
        let response = QueryResponse::from(reply);
        debug!(
            url = %url,
            provider = %response.provider,
            model = %response.model,
            latency_ms = response.latency_ms,
            "completion received"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let endpoint = HttpEndpoint::new("https://apex.example/").unwrap();
        assert_eq!(endpoint.url(), "https://apex.example/api/ai-unified");
    }

    #[test]
    fn path_gains_leading_slash() {
        let endpoint = HttpEndpoint::new("http://localhost:8080")
            .unwrap()
            .path("v2/complete");
        assert_eq!(endpoint.url(), "http://localhost:8080/v2/complete");
    }
}
