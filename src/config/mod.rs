//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `BILLING_GATEWAY` prefix and nested values use double
//! underscores as separators.
//!
//! The whole configuration is loaded and validated once at startup and
//! passed by reference into every component; no component reads the
//! environment on its own.
//!
//! # Example
//!
//! ```no_run
//! use billing_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Gateway listening on {}", config.server.socket_addr());
//! ```

mod backend;
mod error;
mod providers;
mod server;

pub use backend::BackendConfig;
pub use error::{ConfigError, ValidationError};
pub use providers::{CardProviderConfig, ProvidersConfig, RecurringProviderConfig};
pub use server::{Environment, ServerConfig, DEFAULT_ALLOWED_ORIGINS};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the billing gateway.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, allowed origins)
    #[serde(default)]
    pub server: ServerConfig,

    /// Backend ledger addresses (internal preferred, public fallback)
    #[serde(default)]
    pub backend: BackendConfig,

    /// Payment provider channels (card-billing, recurring-billing)
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BILLING_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BILLING_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_GATEWAY__BACKEND__INTERNAL_URL=...` -> `backend.internal_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Missing backend addresses are deliberately NOT a validation failure:
    /// the proxy reports them per-request so the gateway can boot in
    /// partially configured environments.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.backend.validate()?;
        self.providers.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
