//! Configuration loading, validation, and management for TallyBot.
//!
//! Loads configuration from `~/.tallybot/config.toml` with environment
//! variable overrides. Validates all settings at startup. Whether a bot
//! token is actually present is checked by the `run` command — a missing
//! token is a fatal startup error there, not here, so `onboard` and
//! `doctor` can operate on an incomplete config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.tallybot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot token from @BotFather.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Telegram channel settings
    #[serde(default)]
    pub telegram: TelegramSettings,

    /// SMTP relay settings for invoice email delivery
    #[serde(default)]
    pub smtp: SmtpSettings,

    /// Invoice history settings
    #[serde(default)]
    pub history: HistorySettings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("telegram", &self.telegram)
            .field("smtp", &self.smtp)
            .field("history", &self.history)
            .finish()
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Allowlist of sender IDs. Empty = deny all, ["*"] = allow all.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,

    /// Long-poll timeout in seconds for getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}
fn default_poll_timeout() -> u64 {
    30
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            allowed_users: default_allowed_users(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// From address on outgoing invoice mail.
    #[serde(default = "default_smtp_sender")]
    pub sender: String,
}

fn default_smtp_host() -> String {
    "localhost".into()
}
fn default_smtp_port() -> u16 {
    25
}
fn default_smtp_sender() -> String {
    "noreply@example.com".into()
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            sender: default_smtp_sender(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Path to the JSONL history file. Defaults to
    /// `~/.tallybot/history/invoices.jsonl` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.tallybot/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `TALLYBOT_BOT_TOKEN` or `BOT_TOKEN` for the bot token
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_SENDER` for mail delivery
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Some(token) = std::env::var("TALLYBOT_BOT_TOKEN")
            .ok()
            .or_else(|| std::env::var("BOT_TOKEN").ok())
        {
            config.bot_token = Some(token);
        }

        if let Ok(host) = std::env::var("SMTP_HOST") {
            config.smtp.host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            config.smtp.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("SMTP_PORT is not a valid port: {port}"))
            })?;
        }
        if let Ok(sender) = std::env::var("SMTP_SENDER") {
            config.smtp.sender = sender;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tallybot")
    }

    /// Resolved history file path.
    pub fn history_path(&self) -> PathBuf {
        self.history
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("history").join("invoices.jsonl"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "smtp.host must not be empty".into(),
            ));
        }
        if self.smtp.sender.is_empty() {
            return Err(ConfigError::ValidationError(
                "smtp.sender must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Whether a bot token is available (from config or environment).
    pub fn has_bot_token(&self) -> bool {
        self.bot_token.is_some()
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            telegram: TelegramSettings::default(),
            smtp: SmtpSettings::default(),
            history: HistorySettings::default(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smtp.port, 25);
        assert_eq!(config.telegram.allowed_users, vec!["*".to_string()]);
        assert!(!config.has_bot_token());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.smtp.host, config.smtp.host);
        assert_eq!(parsed.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().smtp.host, "localhost");
    }

    #[test]
    fn parses_partial_config() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
bot_token = "123:abc"

[smtp]
host = "mail.internal"
port = 587
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert!(config.has_bot_token());
        assert_eq!(config.smtp.host, "mail.internal");
        assert_eq!(config.smtp.port, 587);
        // Unspecified sections fall back to defaults
        assert_eq!(config.smtp.sender, "noreply@example.com");
        assert_eq!(config.telegram.allowed_users, vec!["*".to_string()]);
    }

    #[test]
    fn empty_smtp_host_rejected() {
        let config = AppConfig {
            smtp: SmtpSettings {
                host: String::new(),
                ..SmtpSettings::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_bot_token() {
        let config = AppConfig {
            bot_token: Some("123456:super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("localhost"));
        assert!(toml_str.contains("noreply@example.com"));
    }

    #[test]
    fn history_path_defaults_under_config_dir() {
        let config = AppConfig::default();
        let path = config.history_path();
        assert!(path.ends_with("history/invoices.jsonl"));
    }

    #[test]
    fn explicit_history_path_wins() {
        let config = AppConfig {
            history: HistorySettings {
                path: Some(PathBuf::from("/var/data/invoices.jsonl")),
            },
            ..AppConfig::default()
        };
        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/data/invoices.jsonl")
        );
    }
}
