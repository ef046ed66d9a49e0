//! Cache key derivation.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::QueryRequest;

/// Provider hint used when a request leaves it unset.
const AUTO_PROVIDER: &str = "auto";

/// Content hash identifying what a request asks for.
///
/// Derived from the message, the system prompt and the provider hint;
/// nothing else. Shared by the [`ResponseCache`](super::ResponseCache)
/// and the [`Deduplicator`](super::Deduplicator).
///
/// Uses `DefaultHasher` (SipHash-1-3, 64 bit). Each field is hashed as a
/// length-terminated string, so `("ab", "c")` and `("a", "bc")` do not
/// collide structurally. Two distinct prompts share a key with
/// probability around 2^-64 per pair; that is accepted rather than
/// guarded against. The hash is stable within a process lifetime, which
/// is all an in-memory cache needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Derive the key for a request.
    pub fn derive(request: &QueryRequest) -> Self {
        let mut hasher = DefaultHasher::new();
        request.message.hash(&mut hasher);
        request.system_prompt.as_deref().unwrap_or("").hash(&mut hasher);
        request
            .preferred_provider
            .as_deref()
            .unwrap_or(AUTO_PROVIDER)
            .hash(&mut hasher);
        CacheKey(hasher.finish())
    }

    /// Raw hash value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<&QueryRequest> for CacheKey {
    fn from(request: &QueryRequest) -> Self {
        Self::derive(request)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryMessage;

    #[test]
    fn cache_key_deterministic() {
        let k1 = CacheKey::derive(&QueryRequest::new("hello").system_prompt("brief"));
        let k2 = CacheKey::derive(&QueryRequest::new("hello").system_prompt("brief"));
        assert_eq!(k1, k2);
    }

    #[test]
    fn cache_key_differs_on_message() {
        let k1 = CacheKey::derive(&QueryRequest::new("hello"));
        let k2 = CacheKey::derive(&QueryRequest::new("world"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn cache_key_differs_on_system_prompt() {
        let k1 = CacheKey::derive(&QueryRequest::new("hello").system_prompt("a"));
        let k2 = CacheKey::derive(&QueryRequest::new("hello").system_prompt("b"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn cache_key_differs_on_provider() {
        let k1 = CacheKey::derive(&QueryRequest::new("hello").preferred_provider("groq"));
        let k2 = CacheKey::derive(&QueryRequest::new("hello").preferred_provider("cohere"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn missing_provider_means_auto() {
        let k1 = CacheKey::derive(&QueryRequest::new("hello"));
        let k2 = CacheKey::derive(&QueryRequest::new("hello").preferred_provider("auto"));
        assert_eq!(k1, k2);
    }

    #[test]
    fn field_boundaries_matter() {
        let k1 = CacheKey::derive(&QueryRequest::new("ab").system_prompt("c"));
        let k2 = CacheKey::derive(&QueryRequest::new("a").system_prompt("bc"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn session_fields_do_not_split_the_key() {
        let plain = CacheKey::derive(&QueryRequest::new("hello"));
        let decorated = CacheKey::derive(
            &QueryRequest::new("hello")
                .session_id("sess-1")
                .user_id("u-7")
                .user_email("a@b.c")
                .history(vec![HistoryMessage::user("earlier")])
                .state_hints(serde_json::json!({"page": "landing"}))
                .debug(true),
        );
        assert_eq!(plain, decorated);
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let key = CacheKey::derive(&QueryRequest::new("hello"));
        let rendered = key.to_string();
        assert_eq!(rendered.len(), 16);
        assert_eq!(u64::from_str_radix(&rendered, 16).unwrap(), key.as_u64());
    }
}
