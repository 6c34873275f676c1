//! telemetry/snapshot.rs
//!
//! Immutable record of one load or save.
//!
//! Design notes:
//! - Built once from the counters and the timer when the operation finishes.
//! - Serializable so front-ends can dump it as JSON.

use std::fmt;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{TelemetryTimer, StageTimes, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Load,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Load => "load",
            Operation::Save => "save",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub operation: Operation,
    pub version: u32,
    pub bytes_plaintext: u64,
    pub bytes_compressed: u64,
    pub bytes_ciphertext: u64,
    pub bytes_overhead: u64,
    pub nodes: u64,
    pub accounts: u64,
    pub fields: u64,
    pub compression_ratio: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(operation: Operation, version: u32, counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let compression_ratio = if counters.bytes_plaintext > 0 {
            counters.bytes_compressed as f64 / counters.bytes_plaintext as f64
        } else {
            0.0
        };

        Self {
            operation,
            version,
            bytes_plaintext: counters.bytes_plaintext,
            bytes_compressed: counters.bytes_compressed,
            bytes_ciphertext: counters.bytes_ciphertext,
            bytes_overhead: counters.bytes_overhead,
            nodes: counters.nodes,
            accounts: counters.accounts,
            fields: counters.fields,
            compression_ratio,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// Stage times fit inside the elapsed time and a non-empty tree left a non-empty body.
    pub fn sanity_check(&self) -> bool {
        self.total_stage_time() <= self.elapsed
            && (self.bytes_plaintext == 0 || self.bytes_ciphertext > 0)
    }

    /// Total file size on disk.
    pub fn file_bytes(&self) -> u64 {
        self.bytes_overhead + self.bytes_ciphertext
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
