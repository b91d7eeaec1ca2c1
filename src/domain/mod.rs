//! Domain layer containing the watch model.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps)
//! - `watch` - Resources, filters, events and snapshot diffing

pub mod foundation;
pub mod watch;
