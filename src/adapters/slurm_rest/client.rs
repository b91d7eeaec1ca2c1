//! HTTP client for `slurmrestd` listing endpoints.
//!
//! # Configuration
//!
//! ```ignore
//! let config = SlurmRestConfig::new("http://slurm.example:6820")
//!     .with_api_version("v0.0.42")
//!     .with_credentials("alice", token);
//!
//! let client = Arc::new(SlurmRestClient::new(config)?);
//! let jobs = ResourcePoller::<Job>::new(client.clone());
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;

use super::dto::{JobsResponse, NodesResponse, PartitionsResponse};
use crate::domain::watch::{
    Job, JobFilter, Node, NodeFilter, Partition, PartitionFilter, Resource, ResourceKind,
    SnapshotFetchError,
};
use crate::ports::SnapshotSource;

const USER_NAME_HEADER: &str = "X-SLURM-USER-NAME";
const USER_TOKEN_HEADER: &str = "X-SLURM-USER-TOKEN";

/// Longest error body kept in `SnapshotFetchError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for a `slurmrestd` instance.
#[derive(Debug, Clone)]
pub struct SlurmRestConfig {
    /// Base URL without the `/slurm/...` suffix.
    pub base_url: String,
    /// API version path segment (e.g. "v0.0.42").
    pub api_version: String,
    /// Sent as `X-SLURM-USER-NAME` when set.
    pub user_name: Option<String>,
    token: Option<Secret<String>>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SlurmRestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: "v0.0.42".to_string(),
            user_name: None,
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_token(mut self, token: Secret<String>) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Listing URL for one resource kind.
    pub fn listing_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/slurm/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            kind.as_str()
        )
    }
}

/// Snapshot source for jobs, nodes and partitions over the Slurm REST API.
pub struct SlurmRestClient {
    config: SlurmRestConfig,
    client: Client,
}

impl SlurmRestClient {
    /// Build a client. Fails only if the TLS backend cannot initialise.
    pub fn new(config: SlurmRestConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SlurmRestConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.user_name {
            Some(user) => request.header(USER_NAME_HEADER, user),
            None => request,
        };
        match &self.config.token {
            Some(token) => request.header(USER_TOKEN_HEADER, token.expose_secret()),
            None => request,
        }
    }

    /// GET one listing and decode it.
    async fn list<T: DeserializeOwned>(&self, kind: ResourceKind) -> Result<T, SnapshotFetchError> {
        let url = self.config.listing_url(kind);
        tracing::trace!(stream = %kind, url = %url, "Fetching snapshot");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SnapshotFetchError::Request(format!(
                        "timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    SnapshotFetchError::Request(format!("connection failed: {}", e))
                } else {
                    SnapshotFetchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SnapshotFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SnapshotFetchError::Request(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SnapshotFetchError::Decode(e.to_string()))
    }
}

// Slurm's listing endpoints take no filters worth pushing down; the poller
// filters locally.

#[async_trait]
impl SnapshotSource<Job> for SlurmRestClient {
    async fn fetch(&self, _filter: &JobFilter) -> Result<Vec<Job>, SnapshotFetchError> {
        let response: JobsResponse = self.list(Job::KIND).await?;
        Ok(response.jobs.into_iter().map(Job::from).collect())
    }
}

#[async_trait]
impl SnapshotSource<Node> for SlurmRestClient {
    async fn fetch(&self, _filter: &NodeFilter) -> Result<Vec<Node>, SnapshotFetchError> {
        let response: NodesResponse = self.list(Node::KIND).await?;
        Ok(response.nodes.into_iter().map(Node::from).collect())
    }
}

#[async_trait]
impl SnapshotSource<Partition> for SlurmRestClient {
    async fn fetch(&self, _filter: &PartitionFilter) -> Result<Vec<Partition>, SnapshotFetchError> {
        let response: PartitionsResponse = self.list(Partition::KIND).await?;
        Ok(response.partitions.into_iter().map(Partition::from).collect())
    }
}
