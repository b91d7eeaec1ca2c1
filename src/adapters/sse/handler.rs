//! SSE handler.
//!
//! The response body walks through a fixed sequence:
//! `connected`, then one named event per poller event, then `stream_closed`.
//! A rejected request gets a single `error` event and the body ends.
//!
//! The body owns a drop guard on the poller's token. Hyper drops the body
//! when the client disconnects or a write fails, which stops the poller.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use serde_json::json;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::adapters::streaming::{ActiveStream, QueryParams, StreamHub, StreamItem};
use crate::domain::watch::{ResourceKind, StreamError};

const CONNECTED_EVENT: &str = "connected";
const ERROR_EVENT: &str = "error";
const STREAM_CLOSED_EVENT: &str = "stream_closed";

/// Handle SSE subscription requests.
///
/// Route: `GET /events`
pub async fn sse_handler(
    State(hub): State<StreamHub>,
    Query(params): Query<HashMap<String, String>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let params = QueryParams::from(params);
    let cancel = CancellationToken::new();

    let phase = match hub.subscribe_query(&params, cancel.clone()) {
        Ok(stream) => {
            tracing::info!(
                subscription_id = %stream.id(),
                stream = %stream.kind(),
                "SSE stream started"
            );
            Phase::Connect(stream)
        }
        Err(err) => {
            tracing::debug!(error = %err, "SSE subscription rejected");
            Phase::Reject(err)
        }
    };

    let body = Body {
        phase,
        _teardown: cancel.drop_guard(),
    };

    Sse::new(stream::unfold(body, next_event))
        .keep_alive(KeepAlive::new().interval(hub.settings().sse_keepalive))
}

enum Phase {
    Reject(StreamError),
    Connect(ActiveStream),
    Streaming(ActiveStream),
    Done,
}

struct Body {
    phase: Phase,
    _teardown: DropGuard,
}

async fn next_event(mut body: Body) -> Option<(Result<Event, Infallible>, Body)> {
    let (event, next) = match std::mem::replace(&mut body.phase, Phase::Done) {
        Phase::Done => return None,
        Phase::Reject(err) => (error_event(&err), Phase::Done),
        Phase::Connect(stream) => (connected_event(&stream), Phase::Streaming(stream)),
        Phase::Streaming(mut stream) => match stream.next().await {
            Some(item) => (item_event(stream.kind(), item), Phase::Streaming(stream)),
            None => {
                tracing::debug!(
                    subscription_id = %stream.id(),
                    stream = %stream.kind(),
                    "SSE stream closed"
                );
                (closed_event(stream.kind()), Phase::Done)
            }
        },
    };

    body.phase = next;
    Some((Ok(event), body))
}

fn connected_event(stream: &ActiveStream) -> Event {
    let data = json!({
        "stream": stream.kind(),
        "status": "connected",
        "subscription_id": stream.id().to_string(),
    });
    Event::default().event(CONNECTED_EVENT).data(data.to_string())
}

/// Poller errors go out as `error`, everything else under the kind's name.
fn item_event(kind: ResourceKind, item: StreamItem) -> Event {
    let name = if item.is_error() {
        ERROR_EVENT
    } else {
        kind.sse_event_name()
    };
    Event::default()
        .event(name)
        .id(format!("{}-{}", kind.id_prefix(), item.sequence))
        .data(item.data.to_string())
}

fn error_event(err: &StreamError) -> Event {
    Event::default()
        .event(ERROR_EVENT)
        .data(json!({ "error": err.to_string() }).to_string())
}

fn closed_event(kind: ResourceKind) -> Event {
    Event::default()
        .event(STREAM_CLOSED_EVENT)
        .data(json!({ "stream": kind, "status": "closed" }).to_string())
}

/// Create axum router for the SSE endpoint.
pub fn sse_router() -> axum::Router<StreamHub> {
    use axum::routing::get;

    axum::Router::new().route("/events", get(sse_handler))
}
