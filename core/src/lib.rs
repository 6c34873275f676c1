//! passwordfile-core
//!
//! Reader and writer for encrypted, compressed password files holding a
//! hierarchy of categories and accounts.
//! Pure Rust; no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;
pub mod options;

// Codec layers
pub mod compression;
pub mod crypto;
pub mod headers;
pub mod entry;
pub mod container;

// Document
pub mod file;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::CodecConfig;
    pub use crate::crypto::Password;
    pub use crate::entry::{Entry, EntryError, EntryId, EntryKind, EntryStatistics, EntryTree, EntryType, Field, FieldType};
    pub use crate::file::PasswordFile;
    pub use crate::options::{OpenOptions, SaveOptions};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{Error, ErrorKind, Result};
}

pub use prelude::*;
