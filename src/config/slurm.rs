//! Slurm REST API configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::slurm_rest::SlurmRestConfig;

/// Connection to `slurmrestd`
#[derive(Debug, Clone, Deserialize)]
pub struct SlurmConfig {
    /// Base URL, e.g. `http://slurm-head:6820`
    pub base_url: String,

    /// API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sent as `X-SLURM-USER-NAME`
    pub user_name: Option<String>,

    /// JWT sent as `X-SLURM-USER-TOKEN`
    pub token: Option<Secret<String>>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl SlurmConfig {
    /// Client settings for the REST adapter
    pub fn rest_config(&self) -> SlurmRestConfig {
        let mut config = SlurmRestConfig::new(&self.base_url)
            .with_api_version(&self.api_version)
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(user) = &self.user_name {
            config = config.with_user_name(user);
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        config
    }

    /// Validate Slurm configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("slurm.base_url"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidSlurmUrl);
        }
        if !is_api_version(&self.api_version) {
            return Err(ValidationError::InvalidApiVersion);
        }
        if self.token.is_some() && self.user_name.is_none() {
            return Err(ValidationError::TokenWithoutUser);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

/// `v` followed by three dot-separated numbers.
fn is_api_version(version: &str) -> bool {
    let Some(rest) = version.strip_prefix('v') else {
        return false;
    };
    let parts: Vec<&str> = rest.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn default_api_version() -> String {
    "v0.0.42".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SlurmConfig {
        SlurmConfig {
            base_url: "http://slurm:6820".to_string(),
            api_version: default_api_version(),
            user_name: None,
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn base_url_is_required_and_http() {
        let missing = SlurmConfig {
            base_url: "  ".to_string(),
            ..config()
        };
        assert_eq!(
            missing.validate(),
            Err(ValidationError::MissingRequired("slurm.base_url"))
        );

        let ftp = SlurmConfig {
            base_url: "ftp://slurm".to_string(),
            ..config()
        };
        assert_eq!(ftp.validate(), Err(ValidationError::InvalidSlurmUrl));
    }

    #[test]
    fn api_version_shape() {
        assert!(is_api_version("v0.0.40"));
        assert!(!is_api_version("0.0.40"));
        assert!(!is_api_version("v0.0"));
        assert!(!is_api_version("v0.x.1"));
    }

    #[test]
    fn token_needs_user() {
        let config = SlurmConfig {
            token: Some(Secret::new("jwt".to_string())),
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::TokenWithoutUser));
    }

    #[test]
    fn rest_config_carries_settings() {
        let rest = SlurmConfig {
            user_name: Some("alice".to_string()),
            request_timeout_secs: 5,
            ..config()
        }
        .rest_config();

        assert_eq!(rest.user_name.as_deref(), Some("alice"));
        assert_eq!(rest.timeout, Duration::from_secs(5));
        assert_eq!(rest.api_version, "v0.0.42");
    }
}
