//! Events emitted by a poller.
//!
//! `removed` is derived from disappearance between two snapshots, not from a
//! signal the cluster sends. Consumers should treat its `new_state` as a guess.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::resource::Resource;

/// What kind of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    New,
    StateChange,
    Removed,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::New => "new",
            EventKind::StateChange => "state_change",
            EventKind::Removed => "removed",
            EventKind::Error => "error",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(EventKind::New),
            "state_change" => Ok(EventKind::StateChange),
            "removed" => Ok(EventKind::Removed),
            "error" => Ok(EventKind::Error),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// One observed resource-state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEvent<R> {
    pub kind: EventKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<String>,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<R: Resource> ResourceEvent<R> {
    /// An identity seen for the first time.
    pub fn new_resource(item: R, at: Timestamp) -> Self {
        Self {
            kind: EventKind::New,
            resource_id: item.identity(),
            old_state: None,
            new_state: Some(item.state()),
            timestamp: at,
            payload: Some(item),
            error: None,
        }
    }

    /// A tracked identity whose state label changed.
    pub fn state_change(item: R, old_state: String, at: Timestamp) -> Self {
        Self {
            kind: EventKind::StateChange,
            resource_id: item.identity(),
            old_state: Some(old_state),
            new_state: Some(item.state()),
            timestamp: at,
            payload: Some(item),
            error: None,
        }
    }

    /// A tracked identity that vanished; `inferred_state` is not authoritative.
    pub fn removed(
        resource_id: String,
        old_state: String,
        inferred_state: &str,
        at: Timestamp,
    ) -> Self {
        Self {
            kind: EventKind::Removed,
            resource_id,
            old_state: Some(old_state),
            new_state: Some(inferred_state.to_string()),
            timestamp: at,
            payload: None,
            error: None,
        }
    }

    /// A failed poll. Never carries states.
    pub fn error(message: impl Into<String>, at: Timestamp) -> Self {
        Self {
            kind: EventKind::Error,
            resource_id: String::new(),
            old_state: None,
            new_state: None,
            timestamp: at,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch::Job;

    #[test]
    fn new_event_has_no_old_state() {
        let event = ResourceEvent::new_resource(Job::new(1, "PENDING"), Timestamp::now());
        assert_eq!(event.kind, EventKind::New);
        assert_eq!(event.resource_id, "1");
        assert!(event.old_state.is_none());
        assert_eq!(event.new_state.as_deref(), Some("PENDING"));
        assert!(event.payload.is_some());
    }

    #[test]
    fn error_event_carries_no_states() {
        let event = ResourceEvent::<Job>::error("boom", Timestamp::now());
        assert!(event.is_error());
        assert!(event.old_state.is_none());
        assert!(event.new_state.is_none());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error"], "boom");
        assert!(json.get("old_state").is_none());
        assert!(json.get("new_state").is_none());
        assert!(json.get("resource_id").is_none());
    }

    #[test]
    fn state_change_serializes_snake_case() {
        let event = ResourceEvent::state_change(
            Job::new(1001, "RUNNING"),
            "PENDING".to_string(),
            Timestamp::now(),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "state_change");
        assert_eq!(json["resource_id"], "1001");
        assert_eq!(json["old_state"], "PENDING");
        assert_eq!(json["new_state"], "RUNNING");
        assert_eq!(json["payload"]["job_id"], 1001);
    }

    #[test]
    fn event_kind_parses_wire_names() {
        assert_eq!("removed".parse::<EventKind>().unwrap(), EventKind::Removed);
        assert!("deleted".parse::<EventKind>().is_err());
    }
}
