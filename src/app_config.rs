use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration module
/// This module handles the pipeline configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO, or "auto")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation engine config
    #[serde(default)]
    pub engines: EngineConfig,

    /// Retry policy shared by all engines
    #[serde(default)]
    pub common: CommonConfig,

    /// Chunk size limits
    #[serde(default)]
    pub splitter: SplitterConfig,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Job scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// SQLite database path; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    // @engine: Google web translation (no key required)
    #[default]
    Google,
    // @engine: DeepL API (key-gated)
    DeepL,
}

impl EngineKind {
    // @returns: Capitalized engine name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google",
            Self::DeepL => "DeepL",
        }
    }

    // @returns: Lowercase engine identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::DeepL => "deepl",
        }
    }

    /// Whether the engine refuses to work without an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::DeepL)
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "deepl" => Ok(Self::DeepL),
            _ => Err(anyhow!("Invalid engine type: {}", s)),
        }
    }
}

/// Per-engine configuration entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Engine type identifier
    #[serde(rename = "type")]
    pub engine_type: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param engine: Engine enum
    // @returns: Engine config with defaults
    pub fn new(engine: EngineKind) -> Self {
        Self {
            engine_type: engine.as_str().to_string(),
            api_key: String::new(),
            endpoint: match engine {
                EngineKind::Google => default_google_endpoint(),
                EngineKind::DeepL => String::new(),
            },
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Engine selection and per-engine settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Engine used when none is requested, and the fallback for all others
    #[serde(default)]
    pub default_engine: EngineKind,

    /// Configured engines
    #[serde(default)]
    pub available_engines: Vec<ProviderConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_engine: EngineKind::default(),
            available_engines: vec![
                ProviderConfig::new(EngineKind::Google),
                ProviderConfig::new(EngineKind::DeepL),
            ],
        }
    }
}

impl EngineConfig {
    /// Get a specific engine configuration by type
    pub fn get_engine_config(&self, engine: EngineKind) -> Option<&ProviderConfig> {
        self.available_engines
            .iter()
            .find(|p| p.engine_type.eq_ignore_ascii_case(engine.as_str()))
    }

    /// Get the API key for an engine, empty when not configured
    pub fn get_api_key(&self, engine: EngineKind) -> String {
        self.get_engine_config(engine)
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for an engine, empty means the engine's public default
    pub fn get_endpoint(&self, engine: EngineKind) -> String {
        self.get_engine_config(engine)
            .map(|p| p.endpoint.clone())
            .unwrap_or_default()
    }

    /// Get the request timeout for an engine
    pub fn get_timeout(&self, engine: EngineKind) -> Duration {
        let secs = self
            .get_engine_config(engine)
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }
}

/// Retry settings applicable to all engines
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommonConfig {
    /// Retry count for transient engine failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Chunk size limits, counted in characters
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Sentence accumulation stops before crossing this size
    #[serde(default = "default_soft_limit")]
    pub soft_limit: usize,

    /// No chunk handed to an engine may exceed this size
    #[serde(default = "default_hard_limit")]
    pub hard_limit: usize,

    /// Slice size used when a chunk is over the hard limit
    #[serde(default = "default_slice_size")]
    pub slice_size: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            soft_limit: default_soft_limit(),
            hard_limit: default_hard_limit(),
            slice_size: default_slice_size(),
        }
    }
}

/// Cache backend selection
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process map, lost on exit
    #[default]
    Memory,
    /// SQLite table in the application database
    Sqlite,
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether lookups and stores are performed at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Backing store
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::default(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Job scheduler configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of jobs processed simultaneously
    #[serde(default = "default_worker_slots")]
    pub worker_slots: usize,

    /// Maximum number of chunks of one chapter translated concurrently
    #[serde(default = "default_chunk_fan_out")]
    pub chunk_fan_out: usize,

    /// Scheduler wake-up interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Minimum seconds between two submissions of one submitter (0 disables)
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,

    /// Seconds between sweeps of expired cache entries and idle submitters
    #[serde(default = "default_housekeeping_interval_secs")]
    pub housekeeping_interval_secs: u64,

    /// Whether the job table is persisted to the database
    #[serde(default)]
    pub persist_jobs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_slots: default_worker_slots(),
            chunk_fan_out: default_chunk_fan_out(),
            poll_interval_ms: default_poll_interval_ms(),
            rate_limit_secs: default_rate_limit_secs(),
            housekeeping_interval_secs: default_housekeeping_interval_secs(),
            persist_jobs: false,
        }
    }
}

impl SchedulerConfig {
    /// Minimum interval between submissions
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    /// Scheduler wake-up interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Interval between housekeeping sweeps
    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs.max(1))
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500 // doubled on each retry
}

fn default_soft_limit() -> usize {
    3000
}

fn default_hard_limit() -> usize {
    5000
}

fn default_slice_size() -> usize {
    2500
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

fn default_worker_slots() -> usize {
    2
}

fn default_chunk_fan_out() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_rate_limit_secs() -> u64 {
    60
}

fn default_housekeeping_interval_secs() -> u64 {
    300
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_source_language(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        // Validate endpoints
        for engine in &self.engines.available_engines {
            let _kind: EngineKind = engine.engine_type.parse()?;
            if !engine.endpoint.is_empty() {
                url::Url::parse(&engine.endpoint)
                    .map_err(|e| anyhow!("Invalid endpoint '{}' for {}: {}", engine.endpoint, engine.engine_type, e))?;
            }
        }

        // The default engine is the last line of the fallback chain
        let default_engine = self.engines.default_engine;
        if default_engine.requires_api_key() && self.engines.get_api_key(default_engine).is_empty() {
            return Err(anyhow!(
                "An API key is required when {} is the default engine",
                default_engine.display_name()
            ));
        }

        let splitter = &self.splitter;
        if splitter.slice_size == 0 || splitter.soft_limit == 0 {
            return Err(anyhow!("Splitter limits must be greater than zero"));
        }
        if splitter.soft_limit > splitter.hard_limit || splitter.slice_size > splitter.hard_limit {
            return Err(anyhow!(
                "Splitter limits are inconsistent: soft {} / hard {} / slice {}",
                splitter.soft_limit, splitter.hard_limit, splitter.slice_size
            ));
        }

        if self.scheduler.worker_slots == 0 {
            return Err(anyhow!("At least one worker slot is required"));
        }
        if self.scheduler.chunk_fan_out == 0 {
            return Err(anyhow!("Chunk fan-out must be at least 1"));
        }

        Ok(())
    }

    /// Whether any component needs the SQLite database
    pub fn needs_database(&self) -> bool {
        self.scheduler.persist_jobs || self.cache.backend == CacheBackendKind::Sqlite
    }

    /// Resolved database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            engines: EngineConfig::default(),
            common: CommonConfig::default(),
            splitter: SplitterConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            database_path: None,
            log_level: LogLevel::default(),
        }
    }
}
