//! Configuration loading, validation, and management for docchat.
//!
//! Loads configuration from `~/.docchat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup;
//! a missing credential or endpoint is fatal.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Seed prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant that helps users write concise \
reports on sources provided according to a user query. You will provide reasoning for your \
summaries and deductions by describing your thought process. You will highlight any conflicting \
information between or within sources. Greet the user by asking what they'd like to investigate.";

/// The root configuration structure.
///
/// Maps directly to `~/.docchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API version query parameter (e.g. "2024-02-01")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Base URL of the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Deployment that serves chat completions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_deployment_name: Option<String>,

    /// Seed prompt for new and reset sessions
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Directory that receives `app.log`
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Flat price per 1000 tokens, in USD
    #[serde(default = "default_cost_per_1k_tokens")]
    pub cost_per_1k_tokens: f64,

    /// Transport timeout for a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_log_directory() -> PathBuf {
    PathBuf::from("./")
}
fn default_cost_per_1k_tokens() -> f64 {
    0.0015
}
fn default_request_timeout_secs() -> u64 {
    120
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
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("chat_deployment_name", &self.chat_deployment_name)
            .field("system_prompt", &self.system_prompt)
            .field("log_directory", &self.log_directory)
            .field("cost_per_1k_tokens", &self.cost_per_1k_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Settings the completion client needs, guaranteed present.
#[derive(Clone)]
pub struct ServiceSettings {
    pub api_key: String,
    pub api_version: String,
    pub endpoint: String,
    pub chat_deployment_name: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("chat_deployment_name", &self.chat_deployment_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path` (normally ~/.docchat/config.toml),
    /// then apply environment overrides:
    /// - `AZURE_OPENAI_KEY`
    /// - `AZURE_OPENAI_API_VERSION`
    /// - `AZURE_OPENAI_ENDPOINT`
    /// - `AZURE_OPENAI_CHATGPT_DEPLOYMENT`
    /// - `LOG_DIRECTORY`
    /// - `DOCCHAT_SYSTEM_PROMPT`
    pub fn load_with(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate_values()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
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

        config.validate_values()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.api_version = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_CHATGPT_DEPLOYMENT") {
            self.chat_deployment_name = Some(v);
        }
        if let Some(v) = get("LOG_DIRECTORY") {
            self.log_directory = PathBuf::from(v);
        }
        if let Some(v) = get("DOCCHAT_SYSTEM_PROMPT") {
            self.system_prompt = v;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docchat")
    }

    /// Path of the log file inside `log_directory`.
    pub fn log_file(&self) -> PathBuf {
        self.log_directory.join("app.log")
    }

    /// Check the values that are present.
    fn validate_values(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "endpoint must be an http(s) URL, got '{endpoint}'"
                )));
            }
        }

        if !self.cost_per_1k_tokens.is_finite() || self.cost_per_1k_tokens < 0.0 {
            return Err(ConfigError::ValidationError(
                "cost_per_1k_tokens must be a non-negative number".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Require every service setting, returning them unwrapped.
    pub fn service_settings(&self) -> Result<ServiceSettings, ConfigError> {
        self.validate_values()?;

        fn required(value: &Option<String>, field: &'static str) -> Result<String, ConfigError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .ok_or(ConfigError::Missing(field))
        }

        Ok(ServiceSettings {
            api_key: required(&self.api_key, "api_key")?,
            api_version: required(&self.api_version, "api_version")?,
            endpoint: required(&self.endpoint, "endpoint")?,
            chat_deployment_name: required(&self.chat_deployment_name, "chat_deployment_name")?,
            request_timeout_secs: self.request_timeout_secs,
        })
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a starter config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self {
            api_key: Some("<your-api-key>".into()),
            api_version: Some("2024-02-01".into()),
            endpoint: Some("https://<resource>.openai.azure.com".into()),
            chat_deployment_name: Some("gpt-35-turbo".into()),
            ..Self::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: None,
            endpoint: None,
            chat_deployment_name: None,
            system_prompt: default_system_prompt(),
            log_directory: default_log_directory(),
            cost_per_1k_tokens: default_cost_per_1k_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
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

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
