//! Watch module - turning pull-only snapshots into change events.
//!
//! - `resource` - the `Resource`/`ResourceFilter` abstraction and `ResourceKind`
//! - `items` - jobs, nodes, partitions and their filters
//! - `event` - `ResourceEvent` and `EventKind`
//! - `options` - per-subscription `WatchOptions`
//! - `tracker` - `TrackedState`, the per-poller diff table
//! - `errors` - fetch and transport error taxonomy

mod errors;
mod event;
mod items;
mod options;
mod resource;
mod tracker;

pub use errors::{SnapshotFetchError, StreamError};
pub use event::{EventKind, ResourceEvent};
pub use items::{
    Job, JobFilter, Node, NodeFilter, Partition, PartitionFilter, INFERRED_COMPLETED_STATE,
};
pub use options::{WatchDefaults, WatchOptions};
pub use resource::{DiffPolicy, Disappearance, Resource, ResourceFilter, ResourceKind};
pub use tracker::TrackedState;
