//! ResourcePoller - background task turning snapshots into events.
//!
//! One poller serves one subscription:
//! 1. **Baseline** - the first successful fetch seeds `TrackedState`, no events
//! 2. **Steady state** - every tick fetches, filters, diffs and emits
//! 3. **Shutdown** - cancellation stops the timer and closes the channel
//!
//! ## Backpressure
//!
//! Events go out one at a time on a bounded channel after the tick's diff is
//! complete. A slow consumer stalls the next tick instead of dropping events.
//!
//! ## Failures
//!
//! A failed fetch becomes one `error` event; `TrackedState` is left alone and
//! the next tick retries at the same interval. There is no backoff here.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::Timestamp;
use crate::domain::watch::{
    DiffPolicy, Resource, ResourceEvent, ResourceFilter, SnapshotFetchError, TrackedState,
    WatchOptions,
};
use crate::ports::SnapshotSource;

/// Receiving half of a poller's event channel.
///
/// Yields `None` once the poller task has exited.
pub type EventStream<R> = mpsc::Receiver<ResourceEvent<R>>;

/// `tokio::time::interval` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Starts pollers for one resource kind.
pub struct ResourcePoller<R: Resource> {
    source: Arc<dyn SnapshotSource<R>>,
}

impl<R: Resource> Clone for ResourcePoller<R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<R: Resource> ResourcePoller<R> {
    /// Create a poller backed by the given snapshot source.
    pub fn new(source: Arc<dyn SnapshotSource<R>>) -> Self {
        Self { source }
    }

    /// Spawn a polling task and return its event channel.
    ///
    /// Returns immediately. The channel closes exactly once, when the task
    /// exits: on cancellation, when `max_events` is reached, or when the
    /// receiver is dropped. Each call owns a fresh `TrackedState`.
    pub fn start(&self, cancel: CancellationToken, options: WatchOptions<R::Filter>) -> EventStream<R> {
        let (tx, rx) = mpsc::channel(options.buffer_size.max(1));
        let poll_loop = PollLoop {
            source: self.source.clone(),
            policy: options.filter.diff_policy(),
            options,
            state: TrackedState::new(),
            seeded: false,
            delivered: 0,
            tx,
            cancel,
        };

        tokio::spawn(poll_loop.run());
        rx
    }
}

struct PollLoop<R: Resource> {
    source: Arc<dyn SnapshotSource<R>>,
    options: WatchOptions<R::Filter>,
    policy: DiffPolicy,
    state: TrackedState,
    seeded: bool,
    delivered: u64,
    tx: mpsc::Sender<ResourceEvent<R>>,
    cancel: CancellationToken,
}

impl<R: Resource> PollLoop<R> {
    async fn run(mut self) {
        let period = self.options.poll_interval.max(MIN_INTERVAL);
        tracing::debug!(
            stream = %R::KIND,
            interval_ms = period.as_millis() as u64,
            "Poller started"
        );

        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the baseline takes its place.
        ticker.tick().await;

        if self.poll_once().await.is_continue() {
            loop {
                tokio::select! {
                    biased;

                    _ = self.cancel.cancelled() => break,

                    _ = ticker.tick() => {
                        if self.poll_once().await.is_break() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(
            stream = %R::KIND,
            tracked = self.state.len(),
            delivered = self.delivered,
            "Poller stopped"
        );
    }

    /// Fetch, diff and deliver one tick.
    async fn poll_once(&mut self) -> ControlFlow<()> {
        let fetched = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => return ControlFlow::Break(()),

            result = self.source.fetch(&self.options.filter) => result,
        };

        let events = self.process(fetched, Timestamp::now());
        self.deliver(events).await
    }

    /// Turn one fetch result into events. Runs to completion without yielding.
    fn process(
        &mut self,
        fetched: Result<Vec<R>, SnapshotFetchError>,
        at: Timestamp,
    ) -> Vec<ResourceEvent<R>> {
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(stream = %R::KIND, error = %err, "Snapshot fetch failed");
                return vec![ResourceEvent::error(err.to_string(), at)];
            }
        };

        let filtered: Vec<R> = snapshot
            .into_iter()
            .filter(|item| self.options.filter.matches(item))
            .collect();

        if !self.seeded {
            self.state.seed(&filtered);
            self.seeded = true;
            tracing::debug!(
                stream = %R::KIND,
                tracked = self.state.len(),
                "Baseline established"
            );
            return Vec::new();
        }

        self.state.diff(filtered, self.policy, at)
    }

    async fn deliver(&mut self, events: Vec<ResourceEvent<R>>) -> ControlFlow<()> {
        for event in events {
            if !self.options.delivers(event.kind) {
                continue;
            }

            // Prefer the send so a tick already diffed reaches a live consumer.
            tokio::select! {
                biased;

                sent = self.tx.send(event) => {
                    if sent.is_err() {
                        tracing::debug!(stream = %R::KIND, "Event consumer dropped");
                        return ControlFlow::Break(());
                    }
                }

                _ = self.cancel.cancelled() => return ControlFlow::Break(()),
            }

            self.delivered += 1;
            if self
                .options
                .max_events
                .is_some_and(|max| self.delivered >= max)
            {
                tracing::debug!(stream = %R::KIND, delivered = self.delivered, "Event limit reached");
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }
}
