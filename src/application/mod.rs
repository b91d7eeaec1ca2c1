//! Application layer - Snapshot polling.
//!
//! Coordinates a `SnapshotSource` port with the domain diff logic and hands
//! the resulting events to transport adapters over a bounded channel.

mod poller;

pub use poller::{EventStream, ResourcePoller};
