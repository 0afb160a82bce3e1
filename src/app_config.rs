use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::language_utils::Language;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language content is authored in
    #[serde(default = "default_native_language")]
    pub native_language: Language,

    /// Languages translations are maintained for
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<Language>,

    /// Translation provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Segment translation and orchestration settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// SQLite database path; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider endpoint receiving the translate POST
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,

    /// API key, sent in the request body when not empty
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_provider_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ProviderConfig {
    /// Per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key, or None when unset
    pub fn api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}

/// Cache backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local cache, lost on restart
    #[default]
    Memory,
    /// Cache table in the SQLite database
    Sqlite,
}

/// Cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Which backend stores cache entries
    #[serde(default)]
    pub backend: CacheBackend,

    /// Lifetime of cached provider translations in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub translation_ttl_secs: u64,

    /// Lifetime of shielded fragments in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub shield_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            translation_ttl_secs: default_cache_ttl_secs(),
            shield_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn translation_ttl(&self) -> Duration {
        Duration::from_secs(self.translation_ttl_secs)
    }

    pub fn shield_ttl(&self) -> Duration {
        Duration::from_secs(self.shield_ttl_secs)
    }
}

/// Pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum number of concurrent provider calls
    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Maximum characters of the generated short description
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,

    /// Only translate documents whose status is published
    #[serde(default = "default_true")]
    pub translate_only_published: bool,

    /// Background workers running queued document translations
    #[serde(default = "default_queue_workers")]
    pub queue_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrent_requests(),
            description_max_chars: default_description_max_chars(),
            translate_only_published: true,
            queue_workers: default_queue_workers(),
        }
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
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_native_language() -> Language {
    Language::Indonesian
}

fn default_target_languages() -> Vec<Language> {
    vec![Language::English, Language::Japanese]
}

fn default_provider_endpoint() -> String {
    // LibreTranslate-compatible server on the same host
    "http://127.0.0.1:5000/translate".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60 * 24
}

fn default_concurrent_requests() -> usize {
    6
}

fn default_queue_workers() -> usize {
    4
}

fn default_description_max_chars() -> usize {
    150
}

fn default_true() -> bool {
    true
}

/// Environment variable overriding the provider endpoint
pub const ENV_API_URL: &str = "TRANSLATE_API_URL";
/// Environment variable overriding the provider API key
pub const ENV_API_KEY: &str = "TRANSLATE_API_KEY";
/// Environment variable overriding the translation cache TTL (seconds)
pub const ENV_CACHE_TTL: &str = "TRANSLATION_CACHE_TTL";

/// Longest accepted cache TTL, ten years
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl Config {
    /// Load configuration from a JSON file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Configuration file {:?} not found, writing defaults", path);
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        Self::load(path)
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {:?}", path))?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {:?}", path))?;
        Ok(())
    }

    /// Apply deployment overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.provider.endpoint = url.trim().to_string();
        }

        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.provider.api_key = key.trim().to_string();
        }

        if let Some(ttl) = lookup(ENV_CACHE_TTL) {
            self.cache.translation_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_CACHE_TTL, ttl))?;
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.provider.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", self.provider.endpoint))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(anyhow!("Provider endpoint must use http or https: {}", endpoint));
        }

        if self.target_languages.contains(&self.native_language) {
            return Err(anyhow!(
                "Native language '{}' cannot also be a target language",
                self.native_language
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be greater than zero"));
        }

        if self.cache.translation_ttl_secs == 0 || self.cache.shield_ttl_secs == 0 {
            return Err(anyhow!("Cache TTLs must be greater than zero"));
        }

        if self.cache.translation_ttl_secs > MAX_CACHE_TTL_SECS || self.cache.shield_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(anyhow!("Cache TTLs must not exceed {} seconds", MAX_CACHE_TTL_SECS));
        }

        if self.pipeline.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be greater than zero"));
        }

        if self.pipeline.queue_workers == 0 {
            return Err(anyhow!("queue_workers must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            native_language: default_native_language(),
            target_languages: default_target_languages(),
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            pipeline: PipelineConfig::default(),
            database_path: None,
            log_level: LogLevel::default(),
        }
    }
}
