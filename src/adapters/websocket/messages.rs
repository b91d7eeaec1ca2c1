//! WebSocket message types for resource streaming.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: one subscription request per stream
//! - Server → Client: events, errors, and end-of-stream notices

use serde::{Deserialize, Serialize};

use crate::adapters::streaming::StreamItem;
use crate::domain::foundation::Timestamp;
use crate::domain::watch::{ResourceKind, StreamError};

// ============================================
// Client → Server Messages
// ============================================

/// Subscription request: `{"stream": "jobs", "options": {...}}`.
///
/// `stream` is kept as a string so an unknown kind can be reported by name.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub stream: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

// ============================================
// Server → Client Messages
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Event,
    Error,
    StreamClosed,
}

/// Every frame the server sends.
///
/// `data` is `null` except for events; `error` is present only for errors;
/// `stream` is omitted when the request never named a valid kind.
#[derive(Debug, Clone, Serialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<ResourceKind>,
    pub data: serde_json::Value,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn event(stream: ResourceKind, item: StreamItem) -> Self {
        Self {
            message_type: MessageType::Event,
            stream: Some(stream),
            data: item.data,
            timestamp: Timestamp::now().to_rfc3339(),
            error: None,
        }
    }

    pub fn error(stream: Option<ResourceKind>, err: &StreamError) -> Self {
        Self {
            message_type: MessageType::Error,
            stream,
            data: serde_json::Value::Null,
            timestamp: Timestamp::now().to_rfc3339(),
            error: Some(err.to_string()),
        }
    }

    pub fn stream_closed(stream: ResourceKind) -> Self {
        Self {
            message_type: MessageType::StreamClosed,
            stream: Some(stream),
            data: serde_json::Value::Null,
            timestamp: Timestamp::now().to_rfc3339(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::watch::EventKind;
    use serde_json::json;

    #[test]
    fn subscribe_request_options_default_to_null() {
        let request: SubscribeRequest = serde_json::from_str(r#"{"stream":"nodes"}"#).unwrap();
        assert_eq!(request.stream, "nodes");
        assert!(request.options.is_null());
    }

    #[test]
    fn subscribe_request_requires_stream() {
        assert!(serde_json::from_str::<SubscribeRequest>(r#"{"options":{}}"#).is_err());
    }

    #[test]
    fn error_message_shape() {
        let msg = ServerMessage::error(None, &StreamError::UnknownStreamKind("foo".into()));
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "unknown stream type: foo");
        assert!(json["data"].is_null());
        assert!(json.get("stream").is_none());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn event_message_shape() {
        let item = StreamItem {
            kind: EventKind::New,
            sequence: 1,
            data: json!({"kind": "new", "resource_id": "n1"}),
        };
        let json = serde_json::to_value(ServerMessage::event(ResourceKind::Nodes, item)).unwrap();

        assert_eq!(json["type"], "event");
        assert_eq!(json["stream"], "nodes");
        assert_eq!(json["data"]["resource_id"], "n1");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn stream_closed_shape() {
        let json = serde_json::to_value(ServerMessage::stream_closed(ResourceKind::Jobs)).unwrap();
        assert_eq!(json["type"], "stream_closed");
        assert_eq!(json["stream"], "jobs");
        assert!(json["data"].is_null());
    }
}
