//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Backend address must be an http(s) URL")]
    InvalidBackendUrl,

    #[error("Provider base URL must be an http(s) URL")]
    InvalidProviderUrl,

    #[error("Provider tenant key must not be empty")]
    EmptyTenantKey,

    #[error("Allowed origin must be a scheme://host origin, not a URL with a path")]
    InvalidOrigin,
}
