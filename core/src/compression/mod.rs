//! compression/mod.rs
//! zlib compression of the container body.
//!
//! Notes:
//! - Compressed bodies carry their decompressed size up front; decoding must hit it exactly.
//! - Only zlib is defined by the file format, so there is a single codec behind the traits.

pub mod types;
pub mod deflate;

pub use types::*;
pub use deflate::*;
