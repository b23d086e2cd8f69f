//! Application configuration structs
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub backend: BackendConfig,
    pub edge: ServerConfig,
    pub session: SessionConfig,
    pub channel: ChannelConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Remote backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the remote backend API (no trailing slash)
    pub url: String,
}

/// Edge server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origin URL of this server, as seen by same-origin API calls
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Session core tunables
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cadence of the refresh scheduler in milliseconds. Must be frequent
    /// enough that the renewal threshold is never missed by more than one
    /// tick.
    #[serde(default = "default_refresh_cadence_ms")]
    pub refresh_cadence_ms: u64,
}

/// Realtime channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Websocket endpoint of the backend's session channel
    #[serde(default = "default_channel_url")]
    pub url: String,
    /// Initial reconnect backoff in milliseconds
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    /// Maximum reconnect backoff in milliseconds
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

// Default value functions
fn default_app_name() -> String {
    "dine".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_refresh_cadence_ms() -> u64 {
    1000
}

fn default_channel_url() -> String {
    "ws://127.0.0.1:4000/ws".to_string()
}

fn default_reconnect_base_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            backend: BackendConfig {
                url: env::var("BACKEND_URL").map_err(|_| ConfigError::MissingVar("BACKEND_URL"))?,
            },
            edge: ServerConfig {
                host: env::var("EDGE_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("EDGE_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("EDGE_PORT"))?,
            },
            session: SessionConfig {
                refresh_cadence_ms: env::var("REFRESH_CADENCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_refresh_cadence_ms),
            },
            channel: ChannelConfig {
                url: env::var("CHANNEL_URL").unwrap_or_else(|_| default_channel_url()),
                reconnect_base_ms: env::var("CHANNEL_RECONNECT_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_reconnect_base_ms),
                reconnect_max_ms: env::var("CHANNEL_RECONNECT_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_reconnect_max_ms),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
