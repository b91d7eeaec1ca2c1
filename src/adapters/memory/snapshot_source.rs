//! Scripted in-memory snapshot source.
//!
//! Hands out queued results in order, then keeps repeating the last
//! successful snapshot. Meant for tests and local demos, not for production.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::watch::{Resource, SnapshotFetchError};
use crate::ports::SnapshotSource;

/// Snapshot source backed by a queue of canned fetch results.
///
/// # Example
///
/// ```ignore
/// let source = InMemorySnapshotSource::with_snapshot(vec![Job::new(1001, "PENDING")]);
/// source.push_snapshot(vec![Job::new(1001, "RUNNING")]);
/// source.push_error(SnapshotFetchError::Unavailable("down".into()));
/// ```
pub struct InMemorySnapshotSource<R: Resource> {
    script: Mutex<VecDeque<Result<Vec<R>, SnapshotFetchError>>>,
    current: Mutex<Vec<R>>,
    last_filter: Mutex<Option<R::Filter>>,
    fetches: AtomicUsize,
}

impl<R: Resource> InMemorySnapshotSource<R> {
    /// Source that returns an empty snapshot until scripted otherwise.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            current: Mutex::new(Vec::new()),
            last_filter: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Source whose first fetch returns `items`.
    pub fn with_snapshot(items: Vec<R>) -> Self {
        let source = Self::new();
        source.push_snapshot(items);
        source
    }

    /// Queue a snapshot for a future fetch.
    pub fn push_snapshot(&self, items: Vec<R>) {
        lock(&self.script).push_back(Ok(items));
    }

    /// Queue a failure for a future fetch.
    pub fn push_error(&self, error: SnapshotFetchError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Replace the repeating snapshot and discard anything still queued.
    pub fn set_snapshot(&self, items: Vec<R>) {
        lock(&self.script).clear();
        *lock(&self.current) = items;
    }

    // === Test Helpers ===

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Filter passed to the most recent fetch.
    pub fn last_filter(&self) -> Option<R::Filter> {
        lock(&self.last_filter).clone()
    }
}

impl<R: Resource> Default for InMemorySnapshotSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> SnapshotSource<R> for InMemorySnapshotSource<R> {
    async fn fetch(&self, filter: &R::Filter) -> Result<Vec<R>, SnapshotFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_filter) = Some(filter.clone());

        let next = lock(&self.script).pop_front();
        match next {
            Some(Ok(items)) => {
                *lock(&self.current) = items.clone();
                Ok(items)
            }
            Some(Err(err)) => Err(err),
            None => Ok(lock(&self.current).clone()),
        }
    }
}

/// The guarded data stays consistent across a panicking holder.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch::{Job, JobFilter, Partition, PartitionFilter};

    #[tokio::test]
    async fn serves_script_then_repeats_last_success() {
        let source = InMemorySnapshotSource::with_snapshot(vec![Job::new(1, "PENDING")]);
        source.push_snapshot(vec![Job::new(1, "RUNNING")]);
        source.push_error(SnapshotFetchError::Unavailable("down".into()));

        let filter = JobFilter::default();
        assert_eq!(source.fetch(&filter).await.unwrap()[0].state, "PENDING");
        assert_eq!(source.fetch(&filter).await.unwrap()[0].state, "RUNNING");
        assert!(source.fetch(&filter).await.is_err());
        assert_eq!(source.fetch(&filter).await.unwrap()[0].state, "RUNNING");
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn set_snapshot_discards_queue() {
        let source = InMemorySnapshotSource::<Partition>::new();
        source.push_error(SnapshotFetchError::Unavailable("down".into()));
        source.set_snapshot(vec![Partition::new("debug", "UP")]);

        let items = source.fetch(&PartitionFilter::default()).await.unwrap();
        assert_eq!(items, vec![Partition::new("debug", "UP")]);
    }

    #[tokio::test]
    async fn records_last_filter() {
        let source = InMemorySnapshotSource::<Job>::new();
        assert!(source.last_filter().is_none());

        let filter = JobFilter {
            job_ids: vec!["7".into()],
            ..Default::default()
        };
        source.fetch(&filter).await.unwrap();
        assert_eq!(source.last_filter(), Some(filter));
    }
}
