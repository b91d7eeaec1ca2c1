//! Resource abstraction shared by every watched kind.
//!
//! The poller only needs two things from an item: a stable identity and a
//! state string. Everything kind-specific (which items match, whether
//! disappearance is reported) lives behind [`ResourceFilter`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StreamError;

/// The resource kinds that can be streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Jobs,
    Nodes,
    Partitions,
}

impl ResourceKind {
    /// Wire name used in the `stream` field and query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Jobs => "jobs",
            ResourceKind::Nodes => "nodes",
            ResourceKind::Partitions => "partitions",
        }
    }

    /// Named SSE event carrying this kind's resource events.
    pub fn sse_event_name(&self) -> &'static str {
        match self {
            ResourceKind::Jobs => "job_event",
            ResourceKind::Nodes => "node_event",
            ResourceKind::Partitions => "partition_event",
        }
    }

    /// Short prefix for per-connection SSE event ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Jobs => "job",
            ResourceKind::Nodes => "node",
            ResourceKind::Partitions => "partition",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jobs" => Ok(ResourceKind::Jobs),
            "nodes" => Ok(ResourceKind::Nodes),
            "partitions" => Ok(ResourceKind::Partitions),
            other => Err(StreamError::UnknownStreamKind(other.to_string())),
        }
    }
}

/// What the poller does with an identity that vanished from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disappearance {
    /// Disappearance is not looked for at all.
    Untracked,
    /// Disappearance is noticed but not reported; the identity stays tracked.
    Retained,
    /// Emit `removed` with the given inferred terminal state and forget the identity.
    Removed { inferred_state: &'static str },
}

/// Kind-specific diffing rules derived from a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffPolicy {
    pub emit_new: bool,
    pub disappearance: Disappearance,
}

impl DiffPolicy {
    /// Report new identities, ignore disappearance.
    pub const fn appear_only() -> Self {
        Self {
            emit_new: true,
            disappearance: Disappearance::Untracked,
        }
    }
}

/// Selects which items of a snapshot a subscription cares about.
pub trait ResourceFilter<R>: Clone + fmt::Debug + Default + Send + Sync + 'static {
    /// Whether the item survives filtering.
    fn matches(&self, item: &R) -> bool;

    /// Diffing rules implied by this filter.
    fn diff_policy(&self) -> DiffPolicy;
}

/// A watchable cluster resource.
pub trait Resource: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    /// Filter type accepted by subscriptions on this kind.
    type Filter: ResourceFilter<Self>;

    /// Which stream this resource is served on.
    const KIND: ResourceKind;

    /// Stable identity (job id, node name, partition name).
    fn identity(&self) -> String;

    /// Current state label.
    fn state(&self) -> String;
}

/// Empty allow-list admits everything; state labels compare case-insensitively.
pub(crate) fn state_allowed(states: &[String], state: &str) -> bool {
    states.is_empty() || states.iter().any(|s| s.eq_ignore_ascii_case(state))
}

pub(crate) fn name_allowed(names: &[String], name: &str) -> bool {
    names.is_empty() || names.iter().any(|n| n == name)
}
