//! WebSocket adapter for resource streams.
//!
//! ```text
//!  client ──{stream, options}──▶ handler ──▶ StreamHub ──▶ ResourcePoller
//!         ◀──event/error/stream_closed──────────────────── event channel
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire protocol types
//! - [`handler`] - axum upgrade handler and per-connection loop

pub mod handler;
pub mod messages;

pub use handler::{websocket_router, ws_handler, ConnectionId};
pub use messages::{MessageType, ServerMessage, SubscribeRequest};
