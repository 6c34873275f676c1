// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding utilities.
//!
//! Design notes:
//! - Reads from a `ByteReader` so the caller keeps the cursor at the start of the body.
//! - The version is checked before anything version-dependent is read.
//! - `probe_encryption` looks at magic, version and flags only, without touching the body.

use tracing::debug;

use crate::constants::{IV_LEN_16, MAGIC, MAX_VERSION};
use crate::headers::types::{Features, FileHeader, FormatError, HeaderFlags};
use crate::utils::ByteReader;

/// Parse a file header and leave `r` positioned at the first body byte.
pub fn decode_header(r: &mut ByteReader<'_>) -> Result<FileHeader, FormatError> {
    let magic = r.read_u32_le("signature")?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic { found: magic });
    }

    let version = r.read_u32_le("version")?;
    if version > MAX_VERSION {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let flags = if version >= 3 {
        HeaderFlags::from_bits_retain(r.read_u8("flags")?)
    } else {
        HeaderFlags::empty()
    };
    let features = Features::infer(version, flags)?;

    let extended_header = if version >= 4 {
        let len = r.read_u16_be("extended header size")? as usize;
        r.read_bytes(len, "extended header")?.to_vec()
    } else {
        Vec::new()
    };

    let hash_count = if features.has_hash_count(version) {
        r.read_u32_be("hash count")?
    } else {
        0
    };

    let iv = if features.has_iv_field() {
        r.read_array::<IV_LEN_16>("initiation vector")?
    } else {
        [0u8; IV_LEN_16]
    };

    debug!(
        version,
        encrypted = features.encrypted,
        compressed = features.compressed,
        hash_count,
        ext_header_len = extended_header.len(),
        "decoded file header"
    );

    Ok(FileHeader { magic, version, flags, features, extended_header, hash_count, iv })
}

/// Inspect just enough of `bytes` to tell whether the body is encrypted.
/// Returns `Ok(false)` when the signature does not match.
pub fn probe_encryption(bytes: &[u8]) -> Result<bool, FormatError> {
    let mut r = ByteReader::new(bytes);
    if r.read_u32_le("signature")? != MAGIC {
        return Ok(false);
    }
    let version = r.read_u32_le("version")?;
    let flags = match version {
        3..=MAX_VERSION => HeaderFlags::from_bits_retain(r.read_u8("flags")?),
        _ => HeaderFlags::empty(),
    };
    Ok(Features::infer(version, flags)?.encrypted)
}
