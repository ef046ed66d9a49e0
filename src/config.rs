//! Configuration file loading.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. explicit path (e.g. the CLI's `--config <path>`)
//! 2. `~/.hermod/config.toml` (user)
//! 3. `/etc/hermod/config.toml` (system)
//! 4. built-in defaults
//!
//! Every section and field is optional:
//!
//! ```toml
//! [endpoint]
//! base_url = "https://apex.example"
//!
//! [cache]
//! max_entries = 200
//! ttl_secs = 120
//!
//! [dispatch]
//! timeout_secs = 20
//!
//! [[prefetch.queries]]
//! message = "What is APEX OS?"
//! system_prompt = "Brief 2-sentence explanation for landing page"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheConfig, InflightConfig};
use crate::dispatch::DispatchConfig;
use crate::endpoint::{DEFAULT_BASE_URL, DEFAULT_PATH};
use crate::gateway::HermodBuilder;
use crate::gateway::stream::StreamConfig;
use crate::prefetch::{self, PrefetchConfig};
use crate::types::QueryRequest;
use crate::{Hermod, HermodError, Result};

/// Hermod configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub inflight: InflightSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub prefetch: PrefetchSection,
    #[serde(default)]
    pub stream: StreamSection,
}

/// Where the completion endpoint lives.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Base URL (default: http://127.0.0.1:3000).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Route path (default: /api/ai-unified).
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

/// Response cache limits.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Maximum cached responses (default: 100).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// TTL for interactive responses in seconds (default: 300).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// TTL for prefetched responses in seconds (default: 600).
    #[serde(default = "default_prefetch_ttl_secs")]
    pub prefetch_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            prefetch_ttl_secs: default_prefetch_ttl_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    100
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_prefetch_ttl_secs() -> u64 {
    600
}

impl From<&CacheSection> for CacheConfig {
    fn from(section: &CacheSection) -> Self {
        CacheConfig::new()
            .max_entries(section.max_entries)
            .ttl(Duration::from_secs(section.ttl_secs))
            .prefetch_ttl(Duration::from_secs(section.prefetch_ttl_secs))
    }
}

/// In-flight deduplication timings.
#[derive(Debug, Clone, Deserialize)]
pub struct InflightSection {
    /// Staleness bound in seconds (default: 30).
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Post-settle grace period in milliseconds (default: 1000).
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

impl Default for InflightSection {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            grace_ms: default_grace_ms(),
        }
    }
}

fn default_stale_after_secs() -> u64 {
    30
}

fn default_grace_ms() -> u64 {
    1000
}

impl From<&InflightSection> for InflightConfig {
    fn from(section: &InflightSection) -> Self {
        InflightConfig::new()
            .stale_after(Duration::from_secs(section.stale_after_secs))
            .grace(Duration::from_millis(section.grace_ms))
    }
}

/// Remote call budget.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSection {
    /// Timeout in seconds (default: 45).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    45
}

impl From<&DispatchSection> for DispatchConfig {
    fn from(section: &DispatchSection) -> Self {
        DispatchConfig::new().timeout(Duration::from_secs(section.timeout_secs))
    }
}

/// Prefetch batching and the anticipated query set.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchSection {
    /// Requests per batch (default: 3).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches in milliseconds (default: 100).
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Delay before a scheduled prefetch in milliseconds (default: 2000).
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Anticipated queries (default: the landing-page questions).
    #[serde(default = "prefetch::default_queries")]
    pub queries: Vec<QueryRequest>,
}

impl Default for PrefetchSection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            start_delay_ms: default_start_delay_ms(),
            queries: prefetch::default_queries(),
        }
    }
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_start_delay_ms() -> u64 {
    2000
}

impl From<&PrefetchSection> for PrefetchConfig {
    fn from(section: &PrefetchSection) -> Self {
        PrefetchConfig::new()
            .batch_size(section.batch_size)
            .batch_delay(Duration::from_millis(section.batch_delay_ms))
            .start_delay(Duration::from_millis(section.start_delay_ms))
            .queries(section.queries.clone())
    }
}

/// Progressive stream pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSection {
    /// Pause after each word in milliseconds (default: 20).
    #[serde(default = "default_word_delay_ms")]
    pub word_delay_ms: u64,
    /// Buffered events (default: 64).
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            word_delay_ms: default_word_delay_ms(),
            buffer: default_buffer(),
        }
    }
}

fn default_word_delay_ms() -> u64 {
    20
}

fn default_buffer() -> usize {
    crate::gateway::stream::DEFAULT_STREAM_BUFFER
}

impl From<&StreamSection> for StreamConfig {
    fn from(section: &StreamSection) -> Self {
        StreamConfig::new()
            .word_delay(Duration::from_millis(section.word_delay_ms))
            .buffer(section.buffer)
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing
    /// standard file is used, or defaults if there is none.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HermodError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HermodError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HermodError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HermodError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hermod").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/hermod/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// A builder pre-populated from this configuration.
    pub fn builder(&self) -> HermodBuilder {
        Hermod::builder()
            .endpoint_url(&self.endpoint.base_url)
            .endpoint_path(&self.endpoint.path)
            .cache(CacheConfig::from(&self.cache))
            .inflight(InflightConfig::from(&self.inflight))
            .dispatch(DispatchConfig::from(&self.dispatch))
            .prefetch(PrefetchConfig::from(&self.prefetch))
            .stream(StreamConfig::from(&self.stream))
    }
}
