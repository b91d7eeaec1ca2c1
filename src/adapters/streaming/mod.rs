//! Transport-independent subscription plumbing.
//!
//! - [`options`] - wire options, query parsing and server-side limits
//! - [`hub`] - starts one poller per subscription and erases the resource kind

pub mod hub;
pub mod options;

pub use hub::{ActiveStream, StreamHub, StreamItem, SubscriptionId};
pub use options::{
    CommonOptions, JobStreamOptions, NodeStreamOptions, PartitionStreamOptions, QueryParams,
    StreamOptions, StreamSettings,
};
