//! Wire shapes for the `slurmrestd` listing endpoints.
//!
//! Only identity, state and filter-relevant fields are read. Unknown fields
//! are ignored, which keeps the decoding tolerant across API versions.

use serde::Deserialize;

use crate::domain::watch::{Job, Node, Partition};

/// Reported when a listing carries no state at all.
const UNKNOWN_STATE: &str = "UNKNOWN";

/// Older releases send a bare string, newer ones a list of flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Primary state: the string itself or the first flag.
    fn primary(self) -> Option<String> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
    }

    /// Every entry; a bare string is split on commas.
    fn into_list(self) -> Vec<String> {
        match self {
            Self::One(value) => value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect(),
            Self::Many(values) => values,
        }
    }
}

fn state_of(field: Option<StringOrList>) -> String {
    field
        .and_then(StringOrList::primary)
        .unwrap_or_else(|| UNKNOWN_STATE.to_string())
}

// ============================================
// Jobs
// ============================================

#[derive(Debug, Deserialize)]
pub(super) struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<JobDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JobDto {
    job_id: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    partition: Option<String>,
    #[serde(default, alias = "state")]
    job_state: Option<StringOrList>,
}

impl From<JobDto> for Job {
    fn from(dto: JobDto) -> Self {
        Job {
            job_id: dto.job_id,
            name: dto.name.filter(|name| !name.is_empty()),
            user_name: dto.user_name.filter(|user| !user.is_empty()),
            partition: dto.partition.filter(|partition| !partition.is_empty()),
            state: state_of(dto.job_state),
        }
    }
}

// ============================================
// Nodes
// ============================================

#[derive(Debug, Deserialize)]
pub(super) struct NodesResponse {
    #[serde(default)]
    pub nodes: Vec<NodeDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NodeDto {
    name: String,
    #[serde(default)]
    state: Option<StringOrList>,
    #[serde(default)]
    partitions: Option<StringOrList>,
    #[serde(default, alias = "partition")]
    partition_name: Option<String>,
    #[serde(default)]
    features: Option<StringOrList>,
}

impl From<NodeDto> for Node {
    fn from(dto: NodeDto) -> Self {
        let mut partitions = dto
            .partitions
            .map(StringOrList::into_list)
            .unwrap_or_default();
        if let Some(partition) = dto.partition_name.filter(|p| !p.is_empty()) {
            if !partitions.contains(&partition) {
                partitions.push(partition);
            }
        }

        Node {
            name: dto.name,
            state: state_of(dto.state),
            partitions,
            features: dto.features.map(StringOrList::into_list).unwrap_or_default(),
        }
    }
}

// ============================================
// Partitions
// ============================================

#[derive(Debug, Deserialize)]
pub(super) struct PartitionsResponse {
    #[serde(default)]
    pub partitions: Vec<PartitionDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PartitionDto {
    name: String,
    #[serde(default)]
    state: Option<StringOrList>,
    /// Newer releases nest the state under `partition.state`.
    #[serde(default)]
    partition: Option<PartitionStateDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PartitionStateDto {
    #[serde(default)]
    state: Option<StringOrList>,
}

impl From<PartitionDto> for Partition {
    fn from(dto: PartitionDto) -> Self {
        let state = dto.state.or(dto.partition.and_then(|nested| nested.state));
        Partition {
            name: dto.name,
            state: state_of(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_accepts_list_or_string() {
        let listed: JobsResponse = serde_json::from_str(
            r#"{"jobs":[{"job_id":1001,"job_state":["RUNNING","CONFIGURING"],"user_name":"alice","partition":"gpu"}]}"#,
        )
        .unwrap();
        let job = Job::from(listed.jobs.into_iter().next().unwrap());
        assert_eq!(job.state, "RUNNING");
        assert_eq!(job.user_name.as_deref(), Some("alice"));
        assert_eq!(job.partition.as_deref(), Some("gpu"));

        let plain: JobsResponse =
            serde_json::from_str(r#"{"jobs":[{"job_id":7,"state":"PENDING"}]}"#).unwrap();
        assert_eq!(Job::from(plain.jobs.into_iter().next().unwrap()).state, "PENDING");
    }

    #[test]
    fn missing_state_is_unknown() {
        let response: JobsResponse =
            serde_json::from_str(r#"{"jobs":[{"job_id":7,"job_state":[]}]}"#).unwrap();
        assert_eq!(Job::from(response.jobs.into_iter().next().unwrap()).state, "UNKNOWN");
    }

    #[test]
    fn node_features_and_partitions_are_lists() {
        let response: NodesResponse = serde_json::from_str(
            r#"{"nodes":[{"name":"n1","state":["IDLE"],"partitions":["cpu","debug"],"features":"avx2, ib"}]}"#,
        )
        .unwrap();
        let node = Node::from(response.nodes.into_iter().next().unwrap());
        assert_eq!(node.state, "IDLE");
        assert_eq!(node.partitions, vec!["cpu", "debug"]);
        assert_eq!(node.features, vec!["avx2", "ib"]);
    }

    #[test]
    fn partition_state_may_be_nested() {
        let response: PartitionsResponse = serde_json::from_str(
            r#"{"partitions":[{"name":"gpu","partition":{"state":["UP"]}},{"name":"old","state":"DOWN"}]}"#,
        )
        .unwrap();
        let partitions: Vec<Partition> = response.partitions.into_iter().map(Partition::from).collect();
        assert_eq!(partitions[0].state, "UP");
        assert_eq!(partitions[1].state, "DOWN");
    }

    #[test]
    fn missing_listing_decodes_empty() {
        let response: NodesResponse = serde_json::from_str(r#"{"meta":{}}"#).unwrap();
        assert!(response.nodes.is_empty());
    }
}
