//! SnapshotSource port - Interface for fetching full resource listings.
//!
//! The cluster's REST API only offers list endpoints. This port is the one
//! capability the watch subsystem needs from it: "give me everything of this
//! kind right now". Retries, authentication and version translation belong
//! to the implementation, not to callers.

use async_trait::async_trait;

use crate::domain::watch::{Resource, SnapshotFetchError};

/// Port for fetching a point-in-time snapshot of one resource kind.
///
/// Implementations may use the filter to narrow the request; callers filter
/// the result again, so ignoring it is always correct.
///
/// # Example
///
/// ```ignore
/// let jobs: Vec<Job> = source.fetch(&JobFilter::default()).await?;
/// ```
#[async_trait]
pub trait SnapshotSource<R: Resource>: Send + Sync {
    /// Fetch the current full list of resources.
    async fn fetch(&self, filter: &R::Filter) -> Result<Vec<R>, SnapshotFetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch::{Job, Node, Partition};

    // Compile-time check that the port is object-safe for every kind
    #[allow(dead_code)]
    fn assert_object_safe(
        _: &dyn SnapshotSource<Job>,
        _: &dyn SnapshotSource<Node>,
        _: &dyn SnapshotSource<Partition>,
    ) {
    }

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    #[test]
    fn snapshot_source_is_send_sync() {
        assert_send_sync::<dyn SnapshotSource<Job>>();
    }
}
