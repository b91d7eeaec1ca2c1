//! Snapshot diffing.
//!
//! [`TrackedState`] remembers the last observed state of every identity a
//! poller cares about and turns the next snapshot into events. It is owned by
//! exactly one poller task; a whole tick's diff runs inside one `&mut self`
//! call, so no observer ever sees it half-updated.
//!
//! Only snapshot boundaries are visible. Two transitions between polls show
//! up as one transition from the first state to the last.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::foundation::Timestamp;

use super::event::{EventKind, ResourceEvent};
use super::resource::{DiffPolicy, Disappearance, Resource};

/// Last observed state per identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedState {
    states: HashMap<String, String>,
}

impl TrackedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&str> {
        self.states.get(identity).map(String::as_str)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.states.contains_key(identity)
    }

    /// Ordered copy of the table, for comparisons.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.states
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Records a baseline snapshot without producing events.
    pub fn seed<R: Resource>(&mut self, snapshot: &[R]) {
        for item in snapshot {
            self.states.insert(item.identity(), item.state());
        }
    }

    /// Diffs an already-filtered snapshot against the table and updates it.
    ///
    /// Events come out in snapshot order, followed by removals sorted by
    /// identity.
    pub fn diff<R: Resource>(
        &mut self,
        snapshot: Vec<R>,
        policy: DiffPolicy,
        at: Timestamp,
    ) -> Vec<ResourceEvent<R>> {
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut events = Vec::new();

        for item in snapshot {
            let identity = item.identity();
            let state = item.state();
            seen.insert(identity.clone());

            match self.states.entry(identity) {
                Entry::Vacant(slot) => {
                    slot.insert(state);
                    if policy.emit_new {
                        events.push(ResourceEvent::new_resource(item, at));
                    }
                }
                Entry::Occupied(mut slot) => {
                    if *slot.get() != state {
                        let old_state = slot.insert(state);
                        events.push(ResourceEvent::state_change(item, old_state, at));
                    }
                }
            }
        }

        match policy.disappearance {
            Disappearance::Removed { inferred_state } => {
                let mut departed: Vec<String> = self
                    .states
                    .keys()
                    .filter(|identity| !seen.contains(*identity))
                    .cloned()
                    .collect();
                departed.sort();

                for identity in departed {
                    if let Some(old_state) = self.states.remove(&identity) {
                        events.push(ResourceEvent::removed(
                            identity,
                            old_state,
                            inferred_state,
                            at,
                        ));
                    }
                }
            }
            Disappearance::Retained | Disappearance::Untracked => {}
        }

        events
    }

    /// Replays one event onto the table.
    pub fn apply<R>(&mut self, event: &ResourceEvent<R>) {
        match event.kind {
            EventKind::New | EventKind::StateChange => {
                if let Some(state) = &event.new_state {
                    self.states.insert(event.resource_id.clone(), state.clone());
                }
            }
            EventKind::Removed => {
                self.states.remove(&event.resource_id);
            }
            EventKind::Error => {}
        }
    }
}
