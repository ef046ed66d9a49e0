//! Hermod error types
//!
//! Errors only travel as far as the dispatcher: [`Dispatcher`](crate::dispatch::Dispatcher)
//! turns every endpoint error into a typed fallback response, so the
//! facade never hands one to a caller. Configuration loading and endpoint
//! construction return them directly.

/// Hermod error types
#[derive(Debug, thiserror::Error)]
pub enum HermodError {
    // Endpoint/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("empty response from endpoint")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("no completion endpoint configured")]
    NoEndpoint,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for HermodError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HermodError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            HermodError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HermodError::Http(err.to_string())
        }
    }
}

/// Result type alias for Hermod operations
pub type Result<T> = std::result::Result<T, HermodError>;
