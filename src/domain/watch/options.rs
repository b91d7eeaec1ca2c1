//! Per-subscription watch options.

use std::time::Duration;

use super::event::EventKind;

/// Fallback values applied when a subscription leaves a setting unset.
///
/// Passed explicitly to whoever builds [`WatchOptions`]; usually derived from
/// the `watch` configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchDefaults {
    pub poll_interval: Duration,
    pub buffer_size: usize,
}

impl Default for WatchDefaults {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            buffer_size: 100,
        }
    }
}

/// Everything one poller needs besides its snapshot source.
#[derive(Debug, Clone)]
pub struct WatchOptions<F> {
    /// Kind-specific filter.
    pub filter: F,

    /// Time between snapshot fetches.
    pub poll_interval: Duration,

    /// Capacity of the event channel. A full channel stalls the next tick.
    pub buffer_size: usize,

    /// Stop after this many delivered events.
    pub max_events: Option<u64>,

    /// Deliver only these kinds (`error` always passes). Empty means all.
    pub event_kinds: Vec<EventKind>,
}

impl<F: Default> Default for WatchOptions<F> {
    fn default() -> Self {
        Self::new(F::default(), &WatchDefaults::default())
    }
}

impl<F> WatchOptions<F> {
    /// Options with the given filter and defaults.
    pub fn new(filter: F, defaults: &WatchDefaults) -> Self {
        Self {
            filter,
            poll_interval: defaults.poll_interval,
            buffer_size: defaults.buffer_size,
            max_events: None,
            event_kinds: Vec::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn with_max_events(mut self, max: u64) -> Self {
        self.max_events = Some(max);
        self
    }

    pub fn with_event_kinds(mut self, kinds: Vec<EventKind>) -> Self {
        self.event_kinds = kinds;
        self
    }

    /// Whether an event of this kind reaches the consumer.
    pub fn delivers(&self, kind: EventKind) -> bool {
        kind == EventKind::Error || self.event_kinds.is_empty() || self.event_kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch::JobFilter;

    #[test]
    fn defaults_are_five_seconds_and_one_hundred() {
        let options: WatchOptions<JobFilter> = WatchOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(5));
        assert_eq!(options.buffer_size, 100);
        assert!(options.max_events.is_none());
    }

    #[test]
    fn explicit_defaults_are_used() {
        let defaults = WatchDefaults {
            poll_interval: Duration::from_millis(250),
            buffer_size: 8,
        };
        let options = WatchOptions::new(JobFilter::default(), &defaults);
        assert_eq!(options.poll_interval, Duration::from_millis(250));
        assert_eq!(options.buffer_size, 8);
    }

    #[test]
    fn event_kind_allow_list_always_passes_errors() {
        let options = WatchOptions::<JobFilter>::default()
            .with_event_kinds(vec![EventKind::StateChange]);

        assert!(options.delivers(EventKind::StateChange));
        assert!(options.delivers(EventKind::Error));
        assert!(!options.delivers(EventKind::New));
        assert!(!options.delivers(EventKind::Removed));
    }

    #[test]
    fn empty_allow_list_delivers_everything() {
        let options = WatchOptions::<JobFilter>::default();
        assert!(options.delivers(EventKind::New));
        assert!(options.delivers(EventKind::Removed));
    }
}
