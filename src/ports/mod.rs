//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SnapshotSource` - Full-listing fetch for one resource kind

mod snapshot_source;

pub use snapshot_source::SnapshotSource;
