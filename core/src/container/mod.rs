//! container/mod.rs
//! Whole-file codec: header plus (optionally compressed, optionally encrypted) entry tree.
//!
//! Notes:
//! - `encode_container` and `decode_container` are pure functions over byte buffers;
//!   file handles and state live in `crate::file`.
//! - Both return a telemetry snapshot when `CodecConfig::collect_metrics` is on.

pub mod encode;
pub mod decode;

pub use encode::*;
pub use decode::*;

use crate::entry::{EntryId, EntryTree};
use crate::headers::FileHeader;
use crate::telemetry::TelemetrySnapshot;

/// Result of decoding a container image.
#[derive(Debug)]
pub struct Decoded {
    pub header: FileHeader,
    /// Bytes stored inside the (possibly encrypted) body, versions >= 5.
    pub encrypted_extended_header: Vec<u8>,
    /// Fresh arena holding only the loaded entries.
    pub tree: EntryTree,
    pub root: EntryId,
    pub telemetry: Option<TelemetrySnapshot>,
}

/// Result of encoding a container image.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Version written to the header.
    pub version: u32,
    /// Iteration count written to the header; 0 when hashing is off.
    pub hash_count: u32,
    pub telemetry: Option<TelemetrySnapshot>,
}
