//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SLURM_STREAM` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use slurm_stream::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod server;
mod slurm;
mod watch;

pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use slurm::SlurmConfig;
pub use watch::WatchConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Subscription defaults and limits
    #[serde(default)]
    pub watch: WatchConfig,

    /// Slurm REST API connection
    pub slurm: SlurmConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SLURM_STREAM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SLURM_STREAM__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SLURM_STREAM__SLURM__BASE_URL=...` -> `slurm.base_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SLURM_STREAM")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.watch.validate()?;
        self.slurm.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("SLURM_STREAM__SLURM__BASE_URL", "http://slurm.example:6820");
    }

    fn clear_env() {
        for key in [
            "SLURM_STREAM__SLURM__BASE_URL",
            "SLURM_STREAM__SLURM__USER_NAME",
            "SLURM_STREAM__SLURM__TOKEN",
            "SLURM_STREAM__SERVER__PORT",
            "SLURM_STREAM__SERVER__ENVIRONMENT",
            "SLURM_STREAM__WATCH__DEFAULT_POLL_INTERVAL_MS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.slurm.base_url, "http://slurm.example:6820");
        assert_eq!(config.slurm.api_version, "v0.0.42");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_slurm_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.watch.default_poll_interval_ms, 5_000);
        assert_eq!(config.watch.default_buffer_size, 100);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SLURM_STREAM__SERVER__PORT", "3000");
        env::set_var("SLURM_STREAM__SERVER__ENVIRONMENT", "production");
        env::set_var("SLURM_STREAM__WATCH__DEFAULT_POLL_INTERVAL_MS", "1000");
        env::set_var("SLURM_STREAM__SLURM__USER_NAME", "alice");
        env::set_var("SLURM_STREAM__SLURM__TOKEN", "jwt-token");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.watch.default_poll_interval_ms, 1_000);
        assert_eq!(config.slurm.user_name.as_deref(), Some("alice"));
        assert!(config.slurm.token.is_some());
        assert!(config.validate().is_ok());
    }
}
