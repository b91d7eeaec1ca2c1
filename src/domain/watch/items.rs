//! Job, node and partition items plus their subscription filters.

use serde::{Deserialize, Serialize};

use super::resource::{
    name_allowed, state_allowed, DiffPolicy, Disappearance, Resource, ResourceFilter,
    ResourceKind,
};

/// State reported for a job that vanished from the listing.
///
/// Inferred, not authoritative: a job can also disappear because it was
/// purged or cancelled.
pub const INFERRED_COMPLETED_STATE: &str = "COMPLETED";

// ============================================
// Jobs
// ============================================

/// A batch job as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    pub state: String,
}

impl Job {
    /// Minimal job with just an id and a state.
    pub fn new(job_id: u32, state: impl Into<String>) -> Self {
        Self {
            job_id,
            name: None,
            user_name: None,
            partition: None,
            state: state.into(),
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

impl Resource for Job {
    type Filter = JobFilter;
    const KIND: ResourceKind = ResourceKind::Jobs;

    fn identity(&self) -> String {
        self.job_id.to_string()
    }

    fn state(&self) -> String {
        self.state.clone()
    }
}

/// Filters recognised on job streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub job_ids: Vec<String>,
    pub states: Vec<String>,
    pub partition: Option<String>,
    pub user_id: Option<String>,
    pub exclude_new: bool,
    pub exclude_completed: bool,
}

impl ResourceFilter<Job> for JobFilter {
    fn matches(&self, job: &Job) -> bool {
        if !self.job_ids.is_empty() && !self.job_ids.contains(&job.identity()) {
            return false;
        }
        if !state_allowed(&self.states, &job.state) {
            return false;
        }
        if let Some(partition) = &self.partition {
            if job.partition.as_deref() != Some(partition.as_str()) {
                return false;
            }
        }
        if let Some(user) = &self.user_id {
            if job.user_name.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        true
    }

    fn diff_policy(&self) -> DiffPolicy {
        // exclude_completed keeps departed jobs tracked forever; see DESIGN.md.
        let disappearance = if self.exclude_completed {
            Disappearance::Retained
        } else {
            Disappearance::Removed {
                inferred_state: INFERRED_COMPLETED_STATE,
            }
        };
        DiffPolicy {
            emit_new: !self.exclude_new,
            disappearance,
        }
    }
}

// ============================================
// Nodes
// ============================================

/// A compute node as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            partitions: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn in_partition(mut self, partition: impl Into<String>) -> Self {
        self.partitions.push(partition.into());
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }
}

impl Resource for Node {
    type Filter = NodeFilter;
    const KIND: ResourceKind = ResourceKind::Nodes;

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn state(&self) -> String {
        self.state.clone()
    }
}

/// Filters recognised on node streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    pub states: Vec<String>,
    pub partition: Option<String>,
    pub features: Vec<String>,
    pub node_names: Vec<String>,
}

impl ResourceFilter<Node> for NodeFilter {
    fn matches(&self, node: &Node) -> bool {
        if !name_allowed(&self.node_names, &node.name) {
            return false;
        }
        if !state_allowed(&self.states, &node.state) {
            return false;
        }
        if let Some(partition) = &self.partition {
            if !node.partitions.iter().any(|p| p == partition) {
                return false;
            }
        }
        if !self.features.is_empty() && !node.features.iter().any(|f| self.features.contains(f)) {
            return false;
        }
        true
    }

    fn diff_policy(&self) -> DiffPolicy {
        DiffPolicy::appear_only()
    }
}

// ============================================
// Partitions
// ============================================

/// A scheduler partition as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
    pub state: String,
}

impl Partition {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

impl Resource for Partition {
    type Filter = PartitionFilter;
    const KIND: ResourceKind = ResourceKind::Partitions;

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn state(&self) -> String {
        self.state.clone()
    }
}

/// Filters recognised on partition streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionFilter {
    pub states: Vec<String>,
    pub partition_names: Vec<String>,
}

impl ResourceFilter<Partition> for PartitionFilter {
    fn matches(&self, partition: &Partition) -> bool {
        name_allowed(&self.partition_names, &partition.name)
            && state_allowed(&self.states, &partition.state)
    }

    fn diff_policy(&self) -> DiffPolicy {
        DiffPolicy::appear_only()
    }
}
