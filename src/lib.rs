//! slurm-stream - real-time event streams over Slurm's pull-only REST API.
//!
//! Periodically fetches full job, node and partition listings, diffs each
//! snapshot against the previous one, and pushes the resulting events to
//! clients over WebSocket or Server-Sent Events.
//!
//! # Layers
//!
//! - [`domain`] - resources, filters, events and the diff table
//! - [`ports`] - the `SnapshotSource` interface
//! - [`application`] - the background `ResourcePoller`
//! - [`adapters`] - Slurm REST client, in-memory source, WebSocket, SSE, HTTP
//! - [`config`] - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
