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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidHost,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Slurm base URL must start with http:// or https://")]
    InvalidSlurmUrl,

    #[error("Slurm API version must look like v0.0.42")]
    InvalidApiVersion,

    #[error("Slurm token requires a user name")]
    TokenWithoutUser,

    #[error("Poll interval must be at least 1ms")]
    InvalidPollInterval,

    #[error("Default poll interval is below the minimum poll interval")]
    PollIntervalBelowMinimum,

    #[error("Buffer size must be between 1 and max_buffer_size")]
    InvalidBufferSize,

    #[error("Keep-alive interval must be at least 1 second")]
    InvalidKeepAlive,
}
