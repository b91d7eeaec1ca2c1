//! Subscription hub shared by both transports.
//!
//! Holds one `ResourcePoller` per kind and starts a fresh poller for every
//! subscription. Nothing is shared between subscriptions except the snapshot
//! sources themselves.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::options::{
    JobStreamOptions, NodeStreamOptions, PartitionStreamOptions, QueryParams, StreamOptions,
    StreamSettings,
};
use crate::application::{EventStream, ResourcePoller};
use crate::domain::watch::{
    EventKind, Job, Node, Partition, Resource, ResourceEvent, ResourceKind, StreamError,
};
use crate::ports::SnapshotSource;

/// Unique identifier for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entry point for transports: validates a request and starts its poller.
#[derive(Clone)]
pub struct StreamHub {
    jobs: ResourcePoller<Job>,
    nodes: ResourcePoller<Node>,
    partitions: ResourcePoller<Partition>,
    settings: StreamSettings,
}

impl StreamHub {
    pub fn new(
        jobs: Arc<dyn SnapshotSource<Job>>,
        nodes: Arc<dyn SnapshotSource<Node>>,
        partitions: Arc<dyn SnapshotSource<Partition>>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            jobs: ResourcePoller::new(jobs),
            nodes: ResourcePoller::new(nodes),
            partitions: ResourcePoller::new(partitions),
            settings,
        }
    }

    /// Hub whose three kinds are served by one source.
    pub fn from_source<S>(source: Arc<S>, settings: StreamSettings) -> Self
    where
        S: SnapshotSource<Job> + SnapshotSource<Node> + SnapshotSource<Partition> + 'static,
    {
        Self::new(source.clone(), source.clone(), source, settings)
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Start a subscription from a WebSocket request body.
    pub fn subscribe_json(
        &self,
        stream: &str,
        options: serde_json::Value,
        cancel: CancellationToken,
    ) -> Result<ActiveStream, StreamError> {
        let kind: ResourceKind = stream.parse()?;
        match kind {
            ResourceKind::Jobs => self.start_jobs(JobStreamOptions::from_json(options)?, cancel),
            ResourceKind::Nodes => self.start_nodes(NodeStreamOptions::from_json(options)?, cancel),
            ResourceKind::Partitions => {
                self.start_partitions(PartitionStreamOptions::from_json(options)?, cancel)
            }
        }
    }

    /// Start a subscription from SSE query parameters.
    pub fn subscribe_query(
        &self,
        params: &QueryParams,
        cancel: CancellationToken,
    ) -> Result<ActiveStream, StreamError> {
        let kind: ResourceKind = params.get("stream").ok_or(StreamError::MissingStream)?.parse()?;
        match kind {
            ResourceKind::Jobs => self.start_jobs(JobStreamOptions::from_query(params)?, cancel),
            ResourceKind::Nodes => self.start_nodes(NodeStreamOptions::from_query(params)?, cancel),
            ResourceKind::Partitions => {
                self.start_partitions(PartitionStreamOptions::from_query(params)?, cancel)
            }
        }
    }

    fn start_jobs(&self, options: JobStreamOptions, cancel: CancellationToken) -> Result<ActiveStream, StreamError> {
        let rx = start(&self.jobs, options, &self.settings, cancel)?;
        Ok(ActiveStream::new(ResourceKind::Jobs, Events::Jobs(rx)))
    }

    fn start_nodes(&self, options: NodeStreamOptions, cancel: CancellationToken) -> Result<ActiveStream, StreamError> {
        let rx = start(&self.nodes, options, &self.settings, cancel)?;
        Ok(ActiveStream::new(ResourceKind::Nodes, Events::Nodes(rx)))
    }

    fn start_partitions(
        &self,
        options: PartitionStreamOptions,
        cancel: CancellationToken,
    ) -> Result<ActiveStream, StreamError> {
        let rx = start(&self.partitions, options, &self.settings, cancel)?;
        Ok(ActiveStream::new(ResourceKind::Partitions, Events::Partitions(rx)))
    }
}

fn start<O: StreamOptions>(
    poller: &ResourcePoller<O::Item>,
    options: O,
    settings: &StreamSettings,
    cancel: CancellationToken,
) -> Result<EventStream<O::Item>, StreamError> {
    let options = options.into_watch_options(settings)?;
    Ok(poller.start(cancel, options))
}

enum Events {
    Jobs(EventStream<Job>),
    Nodes(EventStream<Node>),
    Partitions(EventStream<Partition>),
}

/// A running subscription, erased over the resource kind.
pub struct ActiveStream {
    id: SubscriptionId,
    kind: ResourceKind,
    events: Events,
    sequence: u64,
}

impl ActiveStream {
    fn new(kind: ResourceKind, events: Events) -> Self {
        Self {
            id: SubscriptionId::new(),
            kind,
            events,
            sequence: 0,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Next event, or `None` once the poller has exited.
    pub async fn next(&mut self) -> Option<StreamItem> {
        let item = match &mut self.events {
            Events::Jobs(rx) => StreamItem::from_event(rx.recv().await?),
            Events::Nodes(rx) => StreamItem::from_event(rx.recv().await?),
            Events::Partitions(rx) => StreamItem::from_event(rx.recv().await?),
        };
        self.sequence += 1;
        Some(StreamItem {
            sequence: self.sequence,
            ..item
        })
    }
}

/// One event ready for a transport: its kind plus the serialized event.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    pub kind: EventKind,
    /// 1-based position within the subscription.
    pub sequence: u64,
    pub data: serde_json::Value,
}

impl StreamItem {
    fn from_event<R: Resource>(event: ResourceEvent<R>) -> Self {
        Self {
            kind: event.kind,
            sequence: 0,
            data: to_json(&event),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

/// Serialize a payload; a failure becomes an error object rather than a panic.
pub(crate) fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": format!("failed to encode data: {}", e) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySnapshotSource;
    use std::collections::HashMap;
    use std::time::Duration;

    fn hub(jobs: Arc<InMemorySnapshotSource<Job>>) -> StreamHub {
        let settings = StreamSettings {
            min_poll_interval: Duration::from_millis(1),
            ..Default::default()
        };
        StreamHub::new(
            jobs,
            Arc::new(InMemorySnapshotSource::<Node>::new()),
            Arc::new(InMemorySnapshotSource::<Partition>::new()),
            settings,
        )
    }

    #[test]
    fn unknown_stream_is_rejected_before_starting() {
        let jobs = Arc::new(InMemorySnapshotSource::<Job>::new());
        let err = hub(jobs)
            .subscribe_json("foo", serde_json::Value::Null, CancellationToken::new())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "unknown stream type: foo");
    }

    #[test]
    fn missing_stream_parameter() {
        let jobs = Arc::new(InMemorySnapshotSource::<Job>::new());
        let err = hub(jobs)
            .subscribe_query(&QueryParams::default(), CancellationToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, StreamError::MissingStream));
    }

    #[tokio::test]
    async fn events_are_sequenced_and_serialized() {
        let jobs = Arc::new(InMemorySnapshotSource::with_snapshot(Vec::<Job>::new()));
        jobs.push_snapshot(vec![Job::new(1001, "PENDING"), Job::new(1002, "PENDING")]);

        let params: QueryParams = HashMap::from([
            ("stream".to_string(), "jobs".to_string()),
            ("poll_interval_ms".to_string(), "10".to_string()),
        ])
        .into();
        let cancel = CancellationToken::new();
        let mut stream = hub(jobs).subscribe_query(&params, cancel.clone()).unwrap();
        assert_eq!(stream.kind(), ResourceKind::Jobs);

        let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.kind, EventKind::New);
        assert_eq!(first.data["resource_id"], "1001");
        assert_eq!(first.data["payload"]["job_id"], 1001);

        let second = stream.next().await.unwrap();
        assert_eq!(second.sequence, 2);

        cancel.cancel();
        let closed = tokio::time::timeout(Duration::from_secs(2), stream.next()).await.unwrap();
        assert!(closed.is_none());
    }
}
