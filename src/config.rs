//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\bibfeed\config.toml
//! - macOS: ~/Library/Application Support/bibfeed/config.toml
//! - Linux: ~/.config/bibfeed/config.toml
//!
//! Every setting has a default, so the file only needs the values that
//! differ. Command-line flags and environment variables are applied on top
//! with [`Config::apply_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{
    CacheSettings, DEFAULT_DURATION_DAYS, DEFAULT_FAILURE_RETRY_DAYS, MetadataCache,
};
use crate::enrichment::{ClientSettings, EnrichmentConfig};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Per-source connection settings
    pub sources: Sources,

    /// Metadata cache settings
    pub cache: CacheConfig,

    /// Orchestrator acceptance rules
    pub enrichment: EnrichmentSettings,
}

/// API credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Semantic Scholar API key, sent as `x-api-key`
    pub semantic_scholar_api_key: Option<String>,

    /// Contact email for the OpenAlex polite pool, also added to user agents
    pub openalex_email: Option<String>,
}

/// Settings for every source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub crossref: SourceConfig,
    pub semantic_scholar: SourceConfig,
    pub openalex: SourceConfig,
    pub arxiv: SourceConfig,
}

impl Sources {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut SourceConfig> {
        [
            &mut self.crossref,
            &mut self.semantic_scholar,
            &mut self.openalex,
            &mut self.arxiv,
        ]
        .into_iter()
    }
}

/// Connection settings for one source.
///
/// Unset values fall back to the client's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
    /// Minimum seconds between requests
    pub rate_limit_secs: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub max_retries: Option<u32>,
    /// Base retry backoff in seconds, doubled on every attempt
    pub backoff_secs: Option<f64>,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            rate_limit_secs: None,
            timeout_secs: None,
            max_retries: None,
            backoff_secs: None,
            user_agent: None,
        }
    }
}

impl SourceConfig {
    /// Apply the configured values on top of a client's defaults.
    pub fn client_settings(&self, mut defaults: ClientSettings) -> ClientSettings {
        if let Some(base_url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            defaults.base_url = base_url.trim().to_string();
        }
        if let Some(rate_limit) = self.rate_limit_secs.and_then(seconds) {
            defaults.rate_limit = rate_limit;
        }
        if let Some(timeout) = self.timeout_secs.and_then(seconds) {
            defaults.timeout = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            defaults.max_retries = max_retries;
        }
        if let Some(backoff) = self.backoff_secs.and_then(seconds) {
            defaults.backoff = backoff;
        }
        if let Some(user_agent) = self.user_agent.as_deref().filter(|u| !u.trim().is_empty()) {
            defaults.user_agent = user_agent.to_string();
        }
        defaults
    }
}

/// Non-negative, finite seconds as a `Duration`
fn seconds(value: f64) -> Option<Duration> {
    let duration = Duration::try_from_secs_f64(value).ok();
    if duration.is_none() {
        tracing::warn!("Ignoring invalid duration {} in config", value);
    }
    duration
}

/// Metadata cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file (default: `<cache dir>/bibfeed/metadata_cache.json`)
    pub path: Option<PathBuf>,

    /// Days before a record expires
    pub duration_days: u32,

    /// Days before a failed entry is attempted again
    pub failure_retry_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            duration_days: DEFAULT_DURATION_DAYS,
            failure_retry_days: DEFAULT_FAILURE_RETRY_DAYS,
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Consecutive misses before a source is skipped for the rest of a run
    pub breaker_threshold: u32,
    pub crossref_title_threshold: f64,
    pub openalex_title_threshold: f64,
    pub semantic_scholar_title_threshold: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        let defaults = EnrichmentConfig::default();
        Self {
            breaker_threshold: defaults.breaker_threshold,
            crossref_title_threshold: defaults.crossref_title_threshold,
            openalex_title_threshold: defaults.openalex_title_threshold,
            semantic_scholar_title_threshold: defaults.semantic_scholar_title_threshold,
        }
    }
}

/// Values from the command line and environment that win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rate_limit_secs: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub semantic_scholar_api_key: Option<String>,
    pub openalex_email: Option<String>,
    pub cache_path: Option<PathBuf>,
}

impl Config {
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        for source in self.sources.iter_mut() {
            if let Some(rate_limit) = overrides.rate_limit_secs {
                source.rate_limit_secs = Some(rate_limit);
            }
            if let Some(timeout) = overrides.timeout_secs {
                source.timeout_secs = Some(timeout);
            }
        }
        if let Some(key) = non_blank(overrides.semantic_scholar_api_key.as_deref()) {
            self.credentials.semantic_scholar_api_key = Some(key);
        }
        if let Some(email) = non_blank(overrides.openalex_email.as_deref()) {
            self.credentials.openalex_email = Some(email);
        }
        if let Some(path) = &overrides.cache_path {
            self.cache.path = Some(path.clone());
        }
    }

    pub fn semantic_scholar_api_key(&self) -> Option<String> {
        non_blank(self.credentials.semantic_scholar_api_key.as_deref())
    }

    pub fn openalex_email(&self) -> Option<String> {
        non_blank(self.credentials.openalex_email.as_deref())
    }

    /// Configured cache file, else the OS cache directory, else the working directory.
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .or_else(MetadataCache::default_location)
            .unwrap_or_else(|| PathBuf::from("metadata_cache.json"))
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings::from_days(self.cache.duration_days, self.cache.failure_retry_days)
    }

    pub fn enrichment_config(&self) -> EnrichmentConfig {
        EnrichmentConfig {
            breaker_threshold: self.enrichment.breaker_threshold,
            crossref_title_threshold: self.enrichment.crossref_title_threshold,
            openalex_title_threshold: self.enrichment.openalex_title_threshold,
            semantic_scholar_title_threshold: self.enrichment.semantic_scholar_title_threshold,
        }
    }

    /// Copy with credentials masked, for display.
    pub fn masked(&self) -> Config {
        let mut config = self.clone();
        config.credentials.semantic_scholar_api_key = config
            .credentials
            .semantic_scholar_api_key
            .as_deref()
            .map(mask_secret);
        config
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `abcdefghij` becomes `******ghij`; short secrets are hidden entirely.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 8 {
        return "*".repeat(chars.len().max(4));
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bibfeed"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path.
///
/// Unlike [`load`], a missing or invalid file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to the default location
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to `path`, writing a temp file and renaming it.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
