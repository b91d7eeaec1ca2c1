//! Slurm REST adapter - snapshot sources backed by `slurmrestd`.
//!
//! One client serves all three resource kinds; each listing endpoint is
//! fetched in full on every call and decoded down to the fields the poller
//! needs.

mod client;
mod dto;

pub use client::{SlurmRestClient, SlurmRestConfig};
