//! Streaming defaults and limits

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::streaming::StreamSettings;
use crate::domain::watch::WatchDefaults;

/// Defaults and bounds applied to every subscription
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Poll interval when a subscription does not ask for one
    #[serde(default = "default_poll_interval_ms")]
    pub default_poll_interval_ms: u64,

    /// Event buffer when a subscription does not ask for one
    #[serde(default = "default_buffer_size")]
    pub default_buffer_size: usize,

    /// Requested intervals below this are raised to it
    #[serde(default = "default_min_poll_interval_ms")]
    pub min_poll_interval_ms: u64,

    /// Requested buffers above this are lowered to it
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// WebSocket ping period
    #[serde(default = "default_ws_keepalive_secs")]
    pub ws_keepalive_secs: u64,

    /// SSE keep-alive comment period
    #[serde(default = "default_sse_keepalive_secs")]
    pub sse_keepalive_secs: u64,

    /// Requests a WebSocket connection may queue behind its active stream
    #[serde(default = "default_max_pending_subscriptions")]
    pub max_pending_subscriptions: usize,
}

impl WatchConfig {
    /// Settings handed to the stream hub
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            defaults: WatchDefaults {
                poll_interval: Duration::from_millis(self.default_poll_interval_ms),
                buffer_size: self.default_buffer_size,
            },
            min_poll_interval: Duration::from_millis(self.min_poll_interval_ms),
            max_buffer_size: self.max_buffer_size,
            ws_keepalive: Duration::from_secs(self.ws_keepalive_secs),
            sse_keepalive: Duration::from_secs(self.sse_keepalive_secs),
            max_pending_subscriptions: self.max_pending_subscriptions,
        }
    }

    /// Validate watch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.default_poll_interval_ms < self.min_poll_interval_ms {
            return Err(ValidationError::PollIntervalBelowMinimum);
        }
        if self.max_buffer_size == 0
            || self.default_buffer_size == 0
            || self.default_buffer_size > self.max_buffer_size
        {
            return Err(ValidationError::InvalidBufferSize);
        }
        if self.ws_keepalive_secs == 0 || self.sse_keepalive_secs == 0 {
            return Err(ValidationError::InvalidKeepAlive);
        }
        Ok(())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            default_poll_interval_ms: default_poll_interval_ms(),
            default_buffer_size: default_buffer_size(),
            min_poll_interval_ms: default_min_poll_interval_ms(),
            max_buffer_size: default_max_buffer_size(),
            ws_keepalive_secs: default_ws_keepalive_secs(),
            sse_keepalive_secs: default_sse_keepalive_secs(),
            max_pending_subscriptions: default_max_pending_subscriptions(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_buffer_size() -> usize {
    100
}

fn default_min_poll_interval_ms() -> u64 {
    100
}

fn default_max_buffer_size() -> usize {
    10_000
}

fn default_ws_keepalive_secs() -> u64 {
    30
}

fn default_sse_keepalive_secs() -> u64 {
    15
}

fn default_max_pending_subscriptions() -> usize {
    8
}
