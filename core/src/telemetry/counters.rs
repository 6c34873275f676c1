// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters filled while a container is loaded or saved.
//!
//! Summary: Collects byte counts per pipeline stage plus entry counts.
//! Converted into an immutable TelemetrySnapshot at the end of the operation.
use serde::{Deserialize, Serialize};

use crate::entry::EntryStatistics;

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Serialized entry tree (plus encrypted extended header).
    pub bytes_plaintext: u64,
    /// Body after compression, including the size prefix; equals plaintext when uncompressed.
    pub bytes_compressed: u64,
    /// Body as stored on disk.
    pub bytes_ciphertext: u64,
    /// Header bytes preceding the body.
    pub bytes_overhead: u64,
    pub nodes: u64,
    pub accounts: u64,
    pub fields: u64,
}

impl TelemetryCounters {
    /// Record the file header as overhead.
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_overhead += header_len as u64;
    }

    /// Record one body passing through the pipeline.
    ///
    /// - `pt_len`: serialized tree length
    /// - `comp_len`: length after compression (or `pt_len` when not compressed)
    /// - `stored_len`: body length on disk
    pub fn add_body(&mut self, pt_len: usize, comp_len: usize, stored_len: usize) {
        self.bytes_plaintext += pt_len as u64;
        self.bytes_compressed += comp_len as u64;
        self.bytes_ciphertext += stored_len as u64;
    }

    pub fn add_statistics(&mut self, stats: &EntryStatistics) {
        self.nodes += stats.node_count as u64;
        self.accounts += stats.account_count as u64;
        self.fields += stats.field_count as u64;
    }

    /// Total bytes on disk.
    pub fn file_bytes(&self) -> u64 {
        self.bytes_overhead + self.bytes_ciphertext
    }
}
