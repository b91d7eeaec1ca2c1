//! Error taxonomy for the watch subsystem.

use thiserror::Error;

/// A snapshot could not be fetched from the cluster.
///
/// Recoverable: the poller surfaces it as an `error` event and keeps ticking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotFetchError {
    #[error("snapshot request failed: {0}")]
    Request(String),

    #[error("snapshot request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("snapshot response could not be decoded: {0}")]
    Decode(String),

    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while serving one transport connection.
///
/// Everything except `TransportWrite` is reported to the peer as a single error
/// message and leaves the connection usable.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid subscription request: {0}")]
    SubscriptionDecode(String),

    #[error("invalid subscription options: {0}")]
    InvalidOptions(String),

    #[error("unknown stream type: {0}")]
    UnknownStreamKind(String),

    #[error("stream parameter required")]
    MissingStream,

    #[error("too many pending subscriptions")]
    TooManyPending,

    #[error("binary frames are not supported")]
    UnsupportedFrame,

    #[error("transport write failed: {0}")]
    TransportWrite(String),
}

impl StreamError {
    /// Whether the error ends the connection rather than the single request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamError::TransportWrite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stream_kind_message_names_the_value() {
        let err = StreamError::UnknownStreamKind("foo".to_string());
        assert_eq!(err.to_string(), "unknown stream type: foo");
    }

    #[test]
    fn only_transport_write_is_fatal() {
        assert!(StreamError::TransportWrite("closed".into()).is_fatal());
        assert!(!StreamError::UnknownStreamKind("x".into()).is_fatal());
        assert!(!StreamError::SubscriptionDecode("eof".into()).is_fatal());
        assert!(!StreamError::MissingStream.is_fatal());
    }

    #[test]
    fn status_error_displays_code_and_body() {
        let err = SnapshotFetchError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "snapshot request returned HTTP 502: bad gateway"
        );
    }
}
