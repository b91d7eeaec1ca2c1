//! Adapters - Implementations of port interfaces and transports.
//!
//! - `memory` - scripted in-memory snapshot source
//! - `slurm_rest` - snapshot source backed by `slurmrestd`
//! - `streaming` - subscription options and the hub shared by transports
//! - `websocket` - WebSocket transport
//! - `sse` - Server-Sent Events transport
//! - `http` - router composition, health check, middleware

pub mod http;
pub mod memory;
pub mod slurm_rest;
pub mod sse;
pub mod streaming;
pub mod websocket;
