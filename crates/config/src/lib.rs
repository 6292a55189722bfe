//! Configuration loading, validation, and management for the wardrobe assistant.
//!
//! Loads configuration from `~/.wardrobe/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`AppConfig`] is built once per process and treated as read-only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.wardrobe/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inference API key. Never logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Identity used to key the wardrobe store
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Inference endpoint and retry policy
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Prompt assembly settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Weather endpoint and default location
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Persistence backend
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP API server
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_user_id() -> String {
    "local".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("user_id", &self.user_id)
            .field("inference", &self.inference)
            .field("assistant", &self.assistant)
            .field("weather", &self.weather)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before retry `n` is `backoff_base_ms * 2^n`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Stop retrying on 4xx responses (other than 408 and 429)
    #[serde(default)]
    pub fail_fast_on_client_error: bool,
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_max_retries() -> u32 {
    5
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            fail_fast_on_client_error: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Most recent feedback records embedded in outfit prompts
    #[serde(default = "default_feedback_window")]
    pub feedback_window: usize,

    /// Most recent chat turns resent with each chat message
    #[serde(default = "default_chat_history_window")]
    pub chat_history_window: usize,

    #[serde(default = "default_style_preference")]
    pub style_preference: String,
}

fn default_feedback_window() -> usize {
    3
}
fn default_chat_history_window() -> usize {
    10
}
fn default_style_preference() -> String {
    "minimalist casual".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            feedback_window: default_feedback_window(),
            chat_history_window: default_chat_history_window(),
            style_preference: default_style_preference(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub api_url: String,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_location_label")]
    pub location_label: String,

    #[serde(default = "default_weather_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com".into()
}
fn default_latitude() -> f64 {
    31.23
}
fn default_longitude() -> f64 {
    121.47
}
fn default_location_label() -> String {
    "Shanghai".into()
}
fn default_weather_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_weather_url(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            location_label: default_location_label(),
            request_timeout_secs: default_weather_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "file" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Root directory for the file backend (default: `~/.wardrobe/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "file".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// Resolved root directory for the file backend.
    pub fn root_dir(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| AppConfig::config_dir().join("data"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Request body limit; scans carry base64 photos
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,

    /// Extra CORS origins allowed besides localhost
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_mb() -> usize {
    20
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_mb: default_max_body_mb(),
            allowed_origins: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.wardrobe/config.toml).
    ///
    /// Also checks environment variables:
    /// - `WARDROBE_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `WARDROBE_MODEL` overrides `inference.model`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    /// Blank values count as unset, in the file and in the environment.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if !self.has_api_key() {
            self.api_key = lookup("WARDROBE_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        }

        if let Some(model) = lookup("WARDROBE_MODEL") {
            self.inference.model = model.trim().to_string();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wardrobe")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inference.max_retries > 10 {
            return Err(ConfigError::ValidationError(
                "inference.max_retries must be at most 10".into(),
            ));
        }

        if self.inference.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "inference.model must not be empty".into(),
            ));
        }

        if self.assistant.feedback_window == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.feedback_window must be at least 1".into(),
            ));
        }

        if !(-90.0..=90.0).contains(&self.weather.latitude)
            || !(-180.0..=180.0).contains(&self.weather.longitude)
        {
            return Err(ConfigError::ValidationError(format!(
                "weather location ({}, {}) is out of range",
                self.weather.latitude, self.weather.longitude
            )));
        }

        if !matches!(self.store.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}' (expected \"file\" or \"memory\")",
                self.store.backend
            )));
        }

        if self.user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError("user_id must not be empty".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: default_user_id(),
            inference: InferenceConfig::default(),
            assistant: AssistantConfig::default(),
            weather: WeatherConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
