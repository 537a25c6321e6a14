//! Configuration loading, validation, and management for llmgate.
//!
//! Loads configuration from `~/.llmgate/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.llmgate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inference backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Prompt composition configuration
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Startup connectivity probe
    #[serde(default)]
    pub startup: StartupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Ollama-compatible server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Overall deadline for one generation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Deadline for health checks and model listing, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// "sqlite" (persistent) or "memory" (lost on exit)
    #[serde(default = "default_knowledge_backend")]
    pub backend: String,

    /// SQLite database file
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_backend() -> String {
    "sqlite".into()
}
fn default_knowledge_path() -> PathBuf {
    AppConfig::config_dir().join("knowledge.db")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: default_knowledge_backend(),
            path: default_knowledge_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Label language for composed prompts: "en" or "ja"
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// How many times to probe the backend before serving anyway
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    /// Fixed wait between probes, in seconds
    #[serde(default = "default_probe_backoff_secs")]
    pub probe_backoff_secs: u64,
}

fn default_probe_attempts() -> u32 {
    5
}
fn default_probe_backoff_secs() -> u64 {
    3
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            probe_attempts: default_probe_attempts(),
            probe_backoff_secs: default_probe_backoff_secs(),
        }
    }
}

/// Knowledge backends the workspace knows how to build.
pub const KNOWLEDGE_BACKENDS: &[&str] = &["sqlite", "memory"];

/// Prompt label locales the composer ships with.
pub const PROMPT_LOCALES: &[&str] = &["en", "ja"];

impl AppConfig {
    /// Load configuration from the default path (~/.llmgate/config.toml).
    ///
    /// Environment variables override file values:
    /// - `OLLAMA_BASE_URL`
    /// - `OLLAMA_MODEL`
    /// - `LLMGATE_DB_PATH`
    /// - `LLMGATE_LOCALE`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, apply overrides from `lookup`, then validate the result.
    pub fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parse the file at `path` without validating it.
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

        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.backend.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.backend.default_model = model;
        }
        if let Some(path) = lookup("LLMGATE_DB_PATH") {
            self.knowledge.path = PathBuf::from(path);
        }
        if let Some(locale) = lookup("LLMGATE_LOCALE") {
            self.prompt.locale = locale;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".llmgate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.base_url must not be empty".into(),
            ));
        }

        if self.backend.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.default_model must not be empty".into(),
            ));
        }

        if self.backend.timeout_secs == 0 || self.backend.probe_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend timeouts must be greater than 0".into(),
            ));
        }

        if self.startup.probe_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "startup.probe_attempts must be at least 1".into(),
            ));
        }

        if !KNOWLEDGE_BACKENDS.contains(&self.knowledge.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "knowledge.backend must be one of {KNOWLEDGE_BACKENDS:?}, got '{}'",
                self.knowledge.backend
            )));
        }

        if !PROMPT_LOCALES.contains(&self.prompt.locale.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "prompt.locale must be one of {PROMPT_LOCALES:?}, got '{}'",
                self.prompt.locale
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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
