//! Subscription options as they arrive on the wire.
//!
//! The WebSocket adapter receives them as a JSON object, the SSE adapter as
//! query parameters with comma-separated lists. Both end up in the same DTOs
//! and are turned into `WatchOptions` against the configured limits.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::domain::watch::{
    EventKind, Job, JobFilter, Node, NodeFilter, Partition, PartitionFilter, Resource,
    StreamError, WatchDefaults, WatchOptions,
};

/// Server-side bounds and defaults for every subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Applied when a subscription leaves interval or buffer unset.
    pub defaults: WatchDefaults,
    /// Requested poll intervals below this are raised to it.
    pub min_poll_interval: Duration,
    /// Requested buffer sizes above this are lowered to it.
    pub max_buffer_size: usize,
    /// WebSocket protocol ping period.
    pub ws_keepalive: Duration,
    /// SSE keep-alive comment period.
    pub sse_keepalive: Duration,
    /// Subscriptions a WebSocket connection may queue behind the active one.
    pub max_pending_subscriptions: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            defaults: WatchDefaults::default(),
            min_poll_interval: Duration::from_millis(100),
            max_buffer_size: 10_000,
            ws_keepalive: Duration::from_secs(30),
            sse_keepalive: Duration::from_secs(15),
            max_pending_subscriptions: 8,
        }
    }
}

// ============================================
// Query parameters
// ============================================

/// Query-string view used by the SSE adapter.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl From<HashMap<String, String>> for QueryParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl QueryParams {
    /// Trimmed value, `None` when absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Comma-separated list; blanks are dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(String::from)
    }

    /// Absent means false.
    pub fn flag(&self, key: &str) -> Result<bool, StreamError> {
        match self.get(key) {
            None => Ok(false),
            Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => Ok(false),
            Some(value) => Err(StreamError::InvalidOptions(format!(
                "{key} must be true or false, got {value:?}"
            ))),
        }
    }

    pub fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, StreamError> {
        self.get(key)
            .map(|value| {
                value.parse::<T>().map_err(|_| {
                    StreamError::InvalidOptions(format!("{key} must be a non-negative integer, got {value:?}"))
                })
            })
            .transpose()
    }
}

// ============================================
// Shared options
// ============================================

/// Options every stream kind accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommonOptions {
    pub poll_interval_ms: Option<u64>,
    pub buffer_size: Option<usize>,
    /// Zero means unlimited.
    pub max_events: Option<u64>,
    pub event_types: Vec<String>,
}

impl CommonOptions {
    fn from_query(params: &QueryParams) -> Result<Self, StreamError> {
        Ok(Self {
            poll_interval_ms: params.number("poll_interval_ms")?,
            buffer_size: params.number("buffer_size")?,
            max_events: params.number("max_events")?,
            event_types: params.list("event_types"),
        })
    }

    /// Combine with a filter, applying defaults and clamping to `settings`.
    fn into_watch_options<F>(
        self,
        filter: F,
        settings: &StreamSettings,
    ) -> Result<WatchOptions<F>, StreamError> {
        let event_kinds = self
            .event_types
            .iter()
            .map(|name| name.parse::<EventKind>().map_err(StreamError::InvalidOptions))
            .collect::<Result<Vec<_>, _>>()?;

        let mut options = WatchOptions::new(filter, &settings.defaults).with_event_kinds(event_kinds);

        if let Some(ms) = self.poll_interval_ms {
            options.poll_interval = Duration::from_millis(ms);
        }
        options.poll_interval = options.poll_interval.max(settings.min_poll_interval);

        if let Some(size) = self.buffer_size {
            options.buffer_size = size;
        }
        options.buffer_size = options.buffer_size.clamp(1, settings.max_buffer_size.max(1));

        if let Some(max) = self.max_events.filter(|max| *max > 0) {
            options = options.with_max_events(max);
        }

        Ok(options)
    }
}

/// Wire options for one resource kind.
pub trait StreamOptions: DeserializeOwned + Default + Send {
    type Item: Resource;

    /// Decode from SSE query parameters.
    fn from_query(params: &QueryParams) -> Result<Self, StreamError>;

    /// Turn into poller options, applying defaults and server limits.
    fn into_watch_options(
        self,
        settings: &StreamSettings,
    ) -> Result<WatchOptions<<Self::Item as Resource>::Filter>, StreamError>;

    /// Decode from the `options` member of a WebSocket request. `null` means defaults.
    fn from_json(value: serde_json::Value) -> Result<Self, StreamError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| StreamError::InvalidOptions(e.to_string()))
    }
}

/// Job ids arrive as numbers from some clients and strings from others.
fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    let ids = Vec::<Id>::deserialize(deserializer)?;
    Ok(ids
        .into_iter()
        .map(|id| match id {
            Id::Number(n) => n.to_string(),
            Id::Text(s) => s,
        })
        .collect())
}

// ============================================
// Per-kind options
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobStreamOptions {
    pub user_id: Option<String>,
    pub states: Vec<String>,
    pub partition: Option<String>,
    #[serde(deserialize_with = "id_list")]
    pub job_ids: Vec<String>,
    pub exclude_new: bool,
    pub exclude_completed: bool,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl StreamOptions for JobStreamOptions {
    type Item = Job;

    fn from_query(params: &QueryParams) -> Result<Self, StreamError> {
        Ok(Self {
            user_id: params.string("user_id"),
            states: params.list("states"),
            partition: params.string("partition"),
            job_ids: params.list("job_ids"),
            exclude_new: params.flag("exclude_new")?,
            exclude_completed: params.flag("exclude_completed")?,
            common: CommonOptions::from_query(params)?,
        })
    }

    fn into_watch_options(self, settings: &StreamSettings) -> Result<WatchOptions<JobFilter>, StreamError> {
        let filter = JobFilter {
            job_ids: self.job_ids,
            states: self.states,
            partition: self.partition,
            user_id: self.user_id,
            exclude_new: self.exclude_new,
            exclude_completed: self.exclude_completed,
        };
        self.common.into_watch_options(filter, settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeStreamOptions {
    pub states: Vec<String>,
    pub partition: Option<String>,
    pub features: Vec<String>,
    pub node_names: Vec<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl StreamOptions for NodeStreamOptions {
    type Item = Node;

    fn from_query(params: &QueryParams) -> Result<Self, StreamError> {
        Ok(Self {
            states: params.list("states"),
            partition: params.string("partition"),
            features: params.list("features"),
            node_names: params.list("node_names"),
            common: CommonOptions::from_query(params)?,
        })
    }

    fn into_watch_options(self, settings: &StreamSettings) -> Result<WatchOptions<NodeFilter>, StreamError> {
        let filter = NodeFilter {
            states: self.states,
            partition: self.partition,
            features: self.features,
            node_names: self.node_names,
        };
        self.common.into_watch_options(filter, settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartitionStreamOptions {
    pub states: Vec<String>,
    pub partition_names: Vec<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

impl StreamOptions for PartitionStreamOptions {
    type Item = Partition;

    fn from_query(params: &QueryParams) -> Result<Self, StreamError> {
        Ok(Self {
            states: params.list("states"),
            partition_names: params.list("partition_names"),
            common: CommonOptions::from_query(params)?,
        })
    }

    fn into_watch_options(
        self,
        settings: &StreamSettings,
    ) -> Result<WatchOptions<PartitionFilter>, StreamError> {
        let filter = PartitionFilter {
            states: self.states,
            partition_names: self.partition_names,
        };
        self.common.into_watch_options(filter, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    #[test]
    fn job_options_decode_from_json() {
        let options = JobStreamOptions::from_json(json!({
            "states": ["RUNNING"],
            "job_ids": [1001, "1002"],
            "exclude_completed": true,
            "poll_interval_ms": 250,
            "max_events": 3
        }))
        .unwrap();

        assert_eq!(options.job_ids, vec!["1001", "1002"]);
        assert!(options.exclude_completed);
        assert!(!options.exclude_new);
        assert_eq!(options.common.poll_interval_ms, Some(250));
        assert_eq!(options.common.max_events, Some(3));
    }

    #[test]
    fn null_options_mean_defaults() {
        let options = NodeStreamOptions::from_json(serde_json::Value::Null).unwrap();
        assert_eq!(options, NodeStreamOptions::default());
    }

    #[test]
    fn mistyped_json_is_invalid_options() {
        let err = PartitionStreamOptions::from_json(json!({"states": "UP"})).unwrap_err();
        assert!(matches!(err, StreamError::InvalidOptions(_)));
        assert!(err.to_string().starts_with("invalid subscription options: "));
    }

    #[test]
    fn query_lists_are_comma_separated() {
        let params = query(&[("states", "IDLE, MIXED,,"), ("features", "gpu"), ("partition", " ")]);
        let options = NodeStreamOptions::from_query(&params).unwrap();

        assert_eq!(options.states, vec!["IDLE", "MIXED"]);
        assert_eq!(options.features, vec!["gpu"]);
        assert_eq!(options.partition, None);
    }

    #[test]
    fn query_rejects_bad_flags_and_numbers() {
        let err = JobStreamOptions::from_query(&query(&[("exclude_new", "maybe")])).unwrap_err();
        assert!(matches!(err, StreamError::InvalidOptions(_)));

        let err = JobStreamOptions::from_query(&query(&[("buffer_size", "-3")])).unwrap_err();
        assert!(err.to_string().contains("buffer_size"));
    }

    #[test]
    fn watch_options_are_clamped() {
        let settings = StreamSettings {
            min_poll_interval: Duration::from_millis(100),
            max_buffer_size: 50,
            ..Default::default()
        };
        let options = JobStreamOptions {
            common: CommonOptions {
                poll_interval_ms: Some(1),
                buffer_size: Some(0),
                ..Default::default()
            },
            ..Default::default()
        }
        .into_watch_options(&settings)
        .unwrap();
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.buffer_size, 1);

        let options = NodeStreamOptions {
            common: CommonOptions {
                buffer_size: Some(10_000),
                ..Default::default()
            },
            ..Default::default()
        }
        .into_watch_options(&settings)
        .unwrap();
        assert_eq!(options.buffer_size, 50);
        assert_eq!(options.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn event_types_become_kinds() {
        let options = PartitionStreamOptions::from_query(&query(&[("event_types", "new,state_change")]))
            .unwrap()
            .into_watch_options(&StreamSettings::default())
            .unwrap();
        assert_eq!(options.event_kinds, vec![EventKind::New, EventKind::StateChange]);

        let err = PartitionStreamOptions::from_query(&query(&[("event_types", "exploded")]))
            .unwrap()
            .into_watch_options(&StreamSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("unknown event type: exploded"));
    }

    #[test]
    fn zero_max_events_is_unlimited() {
        let options = JobStreamOptions::from_query(&query(&[("max_events", "0")]))
            .unwrap()
            .into_watch_options(&StreamSettings::default())
            .unwrap();
        assert!(options.max_events.is_none());
    }

    #[test]
    fn job_filter_fields_carry_over() {
        let options = JobStreamOptions::from_query(&query(&[
            ("job_ids", "1,2"),
            ("user_id", "alice"),
            ("exclude_new", "true"),
        ]))
        .unwrap()
        .into_watch_options(&StreamSettings::default())
        .unwrap();

        assert_eq!(options.filter.job_ids, vec!["1", "2"]);
        assert_eq!(options.filter.user_id.as_deref(), Some("alice"));
        assert!(options.filter.exclude_new);
    }
}
