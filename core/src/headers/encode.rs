// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - Field order: magic, version, flags, extended header, hash count, IV.
//! - Optional fields are written only when the version and features call for them,
//!   mirroring exactly what `decode_header` expects to read back.
//! - Validation runs first so a bad header never reaches disk half-written.

use crate::headers::types::{FileHeader, FormatError};
use crate::utils::{put_u16_prefixed, put_u32_be, put_u32_le, put_u8};

/// Serialize `h` into its on-disk byte form.
///
/// # Returns
/// - `Ok(Vec<u8>)` with everything that precedes the body.
/// - `Err(FormatError)` if validation fails (bad magic, version, oversize extended header).
pub fn encode_header(h: &FileHeader) -> Result<Vec<u8>, FormatError> {
    h.validate()?;

    let mut out = Vec::with_capacity(8 + 1 + 2 + h.extended_header.len() + 4 + 16);

    put_u32_le(&mut out, h.magic);                  // 0..4   magic
    put_u32_le(&mut out, h.version);                // 4..8   version
    if h.version >= 3 {
        put_u8(&mut out, h.flags.bits());           // 8      flags
    }
    if h.version >= 4 {
        put_u16_prefixed(&mut out, &h.extended_header, u16::MAX as usize, "extended header")?;
    }
    if h.features.has_hash_count(h.version) {
        put_u32_be(&mut out, h.hash_count);
    }
    if h.features.has_iv_field() {
        out.extend_from_slice(&h.iv);
    }

    Ok(out)
}
