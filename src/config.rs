//! Configuration module for drivebot.

use serde::Deserialize;
use std::path::Path;

use crate::{DrivebotError, Result};

/// Webhook server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL Telegram should deliver updates to (e.g. "https://bot.example.com").
    ///
    /// When unset the webhook is not registered on startup.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Path segment the webhook is served under ("" serves at "/").
    #[serde(default)]
    pub webhook_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8443
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            webhook_path: String::new(),
        }
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[serde(default)]
    pub bot_token: String,
    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_api_base(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Apps Script web app URL.
    #[serde(default)]
    pub url: String,
    /// Token whose presence in a response body marks a successful upload.
    #[serde(default = "default_success_marker")]
    pub success_marker: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_success_marker() -> String {
    "✅".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            success_marker: default_success_marker(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

/// Upload flow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Reply that keeps the original filename.
    #[serde(default = "default_skip_keyword")]
    pub skip_keyword: String,
    /// Seconds a pending upload waits for a name before it is dropped.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_secs: u64,
    /// Seconds between sweeps of expired pending uploads.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Maximum file size in megabytes (Telegram bots can download up to 20).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u64,
}

fn default_skip_keyword() -> String {
    "skip".to_string()
}

fn default_pending_ttl() -> u64 {
    900 // 15 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_file_size() -> u64 {
    20
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            skip_keyword: default_skip_keyword(),
            pending_ttl_secs: default_pending_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            max_file_size_mb: default_max_file_size(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Language code (pt / en).
    #[serde(default = "default_language")]
    pub language: String,
    /// Optional directory holding `{language}.toml` overrides.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_language() -> String {
    "pt".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            path: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional path to a log file, in addition to stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Webhook server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Telegram configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Upload flow configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Locale configuration.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DrivebotError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DrivebotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BOT_TOKEN`: Telegram bot token
    /// - `APPS_SCRIPT_URL`: backend URL
    /// - `PORT`: listen port
    /// - `RENDER_EXTERNAL_HOSTNAME`: public host, sets `server.public_url` to `https://{host}`
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_env("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(url) = non_empty_env("APPS_SCRIPT_URL") {
            self.backend.url = url;
        }
        if let Some(port) = non_empty_env("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(host) = non_empty_env("RENDER_EXTERNAL_HOSTNAME") {
            self.server.public_url = Some(format!("https://{host}"));
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the bot token or backend URL is missing.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(DrivebotError::Validation(
                "telegram.bot_token is not set. \
                 Set it in config.toml or via the BOT_TOKEN environment variable."
                    .to_string(),
            ));
        }
        if self.backend.url.is_empty() {
            return Err(DrivebotError::Validation(
                "backend.url is not set. \
                 Set it in config.toml or via the APPS_SCRIPT_URL environment variable."
                    .to_string(),
            ));
        }
        url::Url::parse(&self.backend.url)
            .map_err(|e| DrivebotError::Validation(format!("backend.url is invalid: {e}")))?;
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
