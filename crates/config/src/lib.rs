//! Configuration loading, validation, and management for Verdant.
//!
//! Loads configuration from `~/.verdant/config.toml` (path overridable via
//! `VERDANT_CONFIG`) with environment variable overrides for secrets.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.verdant/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Perpetual scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,
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
            .field("engine", &self.engine)
            .field("retrieval", &self.retrieval)
            .field("scheduler", &self.scheduler)
            .field("notify", &self.notify)
            .field("agent", &self.agent)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the chat-completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key (env override: VERDANT_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "google/gemini-flash-1.5".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// How many documents to retrieve per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Retrieval deadline in milliseconds
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_ms: u64,

    /// Optional directory of seed documents to index at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_dir: Option<PathBuf>,
}

fn default_top_k() -> usize {
    3
}
fn default_retrieval_timeout() -> u64 {
    2000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            timeout_ms: default_retrieval_timeout(),
            corpus_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between pulses
    #[serde(default = "default_pulse_interval")]
    pub pulse_interval_secs: u64,

    /// Seconds to sleep after a failed pulse
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,

    /// Per-cycle probability of the market scan firing
    #[serde(default = "default_scan_probability")]
    pub scan_probability: f64,

    /// Send the executive brief every N cycles
    #[serde(default = "default_brief_cadence")]
    pub brief_every_cycles: u64,

    /// Recipient of scheduled briefs
    #[serde(default = "default_admin_recipient")]
    pub admin_recipient: String,
}

fn default_pulse_interval() -> u64 {
    600
}
fn default_backoff() -> u64 {
    60
}
fn default_scan_probability() -> f64 {
    0.3
}
fn default_brief_cadence() -> u64 {
    144
}
fn default_admin_recipient() -> String {
    "ops@verdant.run".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pulse_interval_secs: default_pulse_interval(),
            backoff_secs: default_backoff(),
            scan_probability: default_scan_probability(),
            brief_every_cycles: default_brief_cadence(),
            admin_recipient: default_admin_recipient(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Delivery mode: "log" or "http"
    #[serde(default = "default_notify_mode")]
    pub mode: String,

    /// Mail API endpoint (http mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Mail API key (env override: VERDANT_NOTIFY_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sender address
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("mode", &self.mode)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("sender", &self.sender)
            .finish()
    }
}

fn default_notify_mode() -> String {
    "log".into()
}
fn default_sender() -> String {
    "no-reply@verdant.run".into()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: default_notify_mode(),
            api_url: None,
            api_key: None,
            sender: default_sender(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Optional system prompt override (replaces the built-in directive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Per-invocation tool timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

impl AppConfig {
    /// The config directory (`~/.verdant`).
    pub fn config_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".verdant")
    }

    /// The config file path, honoring the `VERDANT_CONFIG` override.
    pub fn config_path() -> PathBuf {
        std::env::var_os("VERDANT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("config.toml"))
    }

    /// Load configuration from disk, falling back to defaults when the file
    /// is absent, then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (used by tests and embedders).
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VERDANT_API_KEY")
            && !key.is_empty()
        {
            self.engine.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("VERDANT_NOTIFY_KEY")
            && !key.is_empty()
        {
            self.notify.api_key = Some(key);
        }
    }

    /// Validate settings. Called by `load`; callers constructing configs by
    /// hand should call this before wiring the runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.scheduler.scan_probability) {
            return Err(ConfigError::Invalid(format!(
                "scheduler.scan_probability must be in [0, 1], got {}",
                self.scheduler.scan_probability
            )));
        }
        if self.scheduler.brief_every_cycles == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.brief_every_cycles must be at least 1".into(),
            ));
        }
        if self.scheduler.pulse_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.pulse_interval_secs must be at least 1".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.top_k must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.engine.temperature) {
            return Err(ConfigError::Invalid(format!(
                "engine.temperature must be in [0, 2], got {}",
                self.engine.temperature
            )));
        }
        if self.notify.mode == "http" && self.notify.api_url.is_none() {
            return Err(ConfigError::Invalid(
                "notify.mode = \"http\" requires notify.api_url".into(),
            ));
        }
        if self.notify.mode != "log" && self.notify.mode != "http" {
            return Err(ConfigError::Invalid(format!(
                "notify.mode must be \"log\" or \"http\", got {:?}",
                self.notify.mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.scheduler.brief_every_cycles, 144);
        assert!((config.scheduler.scan_probability - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [engine]
            model = "google/gemini-pro-1.5"

            [scheduler]
            pulse_interval_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.model, "google/gemini-pro-1.5");
        assert_eq!(config.scheduler.pulse_interval_secs, 30);
        // Untouched sections keep their defaults
        assert_eq!(config.retrieval.timeout_ms, 2000);
    }

    #[test]
    fn rejects_bad_probability() {
        let err = AppConfig::from_toml(
            r#"
            [scheduler]
            scan_probability = 1.5
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("scan_probability"));
    }

    #[test]
    fn rejects_http_notify_without_url() {
        let err = AppConfig::from_toml(
            r#"
            [notify]
            mode = "http"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn rejects_zero_cadence() {
        let err = AppConfig::from_toml(
            r#"
            [scheduler]
            brief_every_cycles = 0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("brief_every_cycles"));
    }

    #[test]
    fn debug_redacts_api_keys() {
        let mut config = AppConfig::default();
        config.engine.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
