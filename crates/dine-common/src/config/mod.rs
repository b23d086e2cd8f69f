//! Configuration

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, BackendConfig, ChannelConfig, ConfigError, Environment, ServerConfig,
    SessionConfig,
};
