//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for load and save.
//!
//! Notes:
//! - Collection is cheap and synchronous; disable it through `CodecConfig::collect_metrics`.
//! - No secrets ever enter a snapshot: only sizes, counts and timings.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
