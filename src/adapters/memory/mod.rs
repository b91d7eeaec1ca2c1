//! In-memory adapters.
//!
//! - `InMemorySnapshotSource` - scripted snapshot source for tests and demos

mod snapshot_source;

pub use snapshot_source::InMemorySnapshotSource;
