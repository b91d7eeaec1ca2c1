//! HTTP adapters - router composition.
//!
//! Puts the WebSocket and SSE endpoints behind one axum router together with
//! the health check, CORS and request tracing.

mod router;

pub use router::{build_router, SERVICE_NAME};
