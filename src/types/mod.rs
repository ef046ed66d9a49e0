//! Public types for the Hermod API.

mod request;
mod response;

pub use request::{HistoryMessage, QueryRequest, Role};
pub use response::{
    FALLBACK_MODEL, OFFLINE_PROVIDER, Outcome, ProviderAttempt, QueryResponse, TIMEOUT_MODEL,
};
