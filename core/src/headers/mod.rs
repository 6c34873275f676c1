//! headers/mod.rs
//! Container file header: signature, version, feature flags and the plaintext extended header.
//!
//! Industry notes:
//! - Explicit versioning lets readers open every historical layout (0 to 6).
//! - Writers always emit version 3 or later so the flags byte is authoritative.
//! - The extended header is opaque to this crate; applications store their own metadata there.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
