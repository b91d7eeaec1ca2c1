//! Server-Sent Events adapter for resource streams.
//!
//! One request, one subscription: `GET /events?stream=jobs&states=RUNNING`.
//! There is no re-subscription on an open response.

mod handler;

pub use handler::{sse_handler, sse_router};
