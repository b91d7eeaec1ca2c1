//! WebSocket upgrade handler for resource streams.
//!
//! Each connection moves through
//! `AwaitingSubscription → Streaming → AwaitingSubscription ...` until the
//! peer goes away:
//! 1. Wait for a `{stream, options}` request
//! 2. Start a poller and forward its events
//! 3. Send `stream_closed` when the poller's channel closes
//! 4. Pick up the next queued request, if any
//!
//! Only one stream is active per connection. Requests that arrive while
//! streaming wait in a small bounded queue.

use std::collections::VecDeque;
use std::fmt;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapters::streaming::{ActiveStream, StreamHub, StreamItem};
use crate::domain::watch::StreamError;

use super::messages::{ServerMessage, SubscribeRequest};

/// Unique identifier for a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Sender = SplitSink<WebSocket, Message>;

/// Handle WebSocket upgrade requests for resource streams.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<StreamHub>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Runs for the lifetime of the connection.
///
/// Every poller started here hangs off one connection token; returning from
/// this function cancels it, whatever the reason.
async fn handle_socket(socket: WebSocket, hub: StreamHub) {
    let connection_id = ConnectionId::new();
    let connection = CancellationToken::new();
    let _teardown = connection.clone().drop_guard();

    tracing::debug!(connection_id = %connection_id, "WebSocket connected");

    match Connection::new(connection_id, hub, connection).run(socket).await {
        Ok(()) => tracing::debug!(connection_id = %connection_id, "WebSocket closed"),
        Err(e) => tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket torn down"),
    }
}

/// The currently streaming subscription.
struct Streaming {
    stream: ActiveStream,
    cancel: CancellationToken,
}

struct Connection {
    id: ConnectionId,
    hub: StreamHub,
    token: CancellationToken,
    active: Option<Streaming>,
    pending: VecDeque<SubscribeRequest>,
}

impl Connection {
    fn new(id: ConnectionId, hub: StreamHub, token: CancellationToken) -> Self {
        Self {
            id,
            hub,
            token,
            active: None,
            pending: VecDeque::new(),
        }
    }

    /// Connection loop. Returns `Err` only for transport write failures.
    async fn run(mut self, socket: WebSocket) -> Result<(), StreamError> {
        let (mut sender, mut receiver) = socket.split();

        let period = self.hub.settings().ws_keepalive;
        let mut keepalive = time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = receiver.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.on_text(&mut sender, &text).await?,
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!(connection_id = %self.id, "Received unsupported binary message");
                        send_message(&mut sender, &ServerMessage::error(None, &StreamError::UnsupportedFrame)).await?;
                    }
                    // Protocol ping/pong is answered by the socket itself.
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %self.id, "Client sent close frame");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %self.id, error = %e, "Receive error");
                        return Ok(());
                    }
                },

                item = next_item(&mut self.active) => match item {
                    Some(item) => self.on_item(&mut sender, item).await?,
                    None => self.on_stream_end(&mut sender).await?,
                },

                _ = keepalive.tick() => {
                    sender
                        .send(Message::Ping(Vec::new()))
                        .await
                        .map_err(|e| StreamError::TransportWrite(e.to_string()))?;
                }
            }
        }
    }

    async fn on_text(&mut self, sender: &mut Sender, text: &str) -> Result<(), StreamError> {
        let request = match serde_json::from_str::<SubscribeRequest>(text) {
            Ok(request) => request,
            Err(e) => {
                let err = StreamError::SubscriptionDecode(e.to_string());
                return send_message(sender, &ServerMessage::error(None, &err)).await;
            }
        };

        if self.active.is_none() {
            return self.open(sender, request).await;
        }

        if self.pending.len() >= self.hub.settings().max_pending_subscriptions {
            tracing::debug!(connection_id = %self.id, stream = %request.stream, "Subscription queue full");
            return send_message(sender, &ServerMessage::error(None, &StreamError::TooManyPending)).await;
        }

        tracing::debug!(
            connection_id = %self.id,
            stream = %request.stream,
            queued = self.pending.len() + 1,
            "Subscription queued behind active stream"
        );
        self.pending.push_back(request);
        Ok(())
    }

    async fn on_item(&mut self, sender: &mut Sender, item: StreamItem) -> Result<(), StreamError> {
        let Some(active) = &self.active else {
            return Ok(());
        };
        let msg = ServerMessage::event(active.stream.kind(), item);
        send_message(sender, &msg).await
    }

    /// The poller's channel closed: report it, then serve the queue.
    async fn on_stream_end(&mut self, sender: &mut Sender) -> Result<(), StreamError> {
        let Some(ended) = self.active.take() else {
            return Ok(());
        };
        ended.cancel.cancel();

        let kind = ended.stream.kind();
        tracing::debug!(
            connection_id = %self.id,
            subscription_id = %ended.stream.id(),
            stream = %kind,
            "Stream closed"
        );
        send_message(sender, &ServerMessage::stream_closed(kind)).await?;

        while self.active.is_none() {
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            self.open(sender, request).await?;
        }
        Ok(())
    }

    /// Start a subscription, or report why it cannot start.
    async fn open(&mut self, sender: &mut Sender, request: SubscribeRequest) -> Result<(), StreamError> {
        let cancel = self.token.child_token();
        match self.hub.subscribe_json(&request.stream, request.options, cancel.clone()) {
            Ok(stream) => {
                tracing::info!(
                    connection_id = %self.id,
                    subscription_id = %stream.id(),
                    stream = %stream.kind(),
                    "Stream started"
                );
                self.active = Some(Streaming { stream, cancel });
                Ok(())
            }
            Err(err) => {
                tracing::debug!(connection_id = %self.id, error = %err, "Subscription rejected");
                let stream = request.stream.parse().ok();
                send_message(sender, &ServerMessage::error(stream, &err)).await
            }
        }
    }
}

/// Next event of the active stream; pends forever while idle.
async fn next_item(active: &mut Option<Streaming>) -> Option<StreamItem> {
    match active {
        Some(streaming) => streaming.stream.next().await,
        None => std::future::pending().await,
    }
}

/// Send a JSON message over the WebSocket.
async fn send_message(sender: &mut Sender, msg: &ServerMessage) -> Result<(), StreamError> {
    let json = serde_json::to_string(msg).map_err(|e| StreamError::TransportWrite(e.to_string()))?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| StreamError::TransportWrite(e.to_string()))
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router())
///     .with_state(hub);
/// ```
pub fn websocket_router() -> axum::Router<StreamHub> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[tokio::test]
    async fn idle_connection_never_yields_an_item() {
        let mut idle = None;
        let waited = time::timeout(std::time::Duration::from_millis(20), next_item(&mut idle)).await;
        assert!(waited.is_err());
    }
}
