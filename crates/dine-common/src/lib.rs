//! # dine-common
//!
//! Shared utilities including configuration, error handling, the token
//! codec, and telemetry.

pub mod auth;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{decode_unverified, Claims, TokenIssuer, TokenPair};
pub use config::{
    AppConfig, AppSettings, BackendConfig, ChannelConfig, ConfigError, Environment, ServerConfig,
    SessionConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
