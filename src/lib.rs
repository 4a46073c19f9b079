//! navaja: polls Chilean public data feeds into one resilient snapshot
//!
//! Currency rates, Metro line status, the latest earthquake and bus arrivals
//! for subscribed stops are fetched concurrently, normalized by per-source
//! adapters and published atomically through a [`services::SnapshotStore`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod services;
pub mod types;
