// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! File header model, feature inference and format errors.
//!
//! Industry notes:
//! - Magic and version are little-endian; every later multi-byte field is big-endian.
//! - Versions 0–2 predate the flags byte, so their features are implied by the version alone.
//! - Extended headers are opaque bytes carried through untouched for forward compatibility.

use std::fmt;

use crate::compression::CompressionError;
use crate::constants::{header_flags, IV_LEN_16, MAGIC, MAX_VERSION, MIN_WRITE_VERSION};
use crate::crypto::Iv;
use crate::entry::FieldType;
use crate::utils::enum_name_or_hex;

bitflags::bitflags! {
    /// Raw flags byte (versions 3 and later).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u8 {
        /// Body is AES-256-CBC encrypted
        const ENCRYPTION  = header_flags::ENCRYPTION;
        /// A 16-byte IV precedes the body
        const IV          = header_flags::IV;
        /// Body is zlib compressed with a size prefix
        const COMPRESSION = header_flags::COMPRESSION;
    }
}

/// Features a file uses, after applying the version table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub encrypted: bool,
    pub has_iv: bool,
    pub compressed: bool,
    pub hashing: bool,
}

impl Features {
    /// Map version and raw flags byte to the features in use.
    /// - v0: nothing; v1: encryption with an all-zero IV; v2: encryption with IV.
    /// - v3..=5: read from flags; v6: as v3..=5 with password hashing implied.
    pub fn infer(version: u32, flags: HeaderFlags) -> Result<Self, FormatError> {
        let f = match version {
            0 => Features::default(),
            1 => Features { encrypted: true, ..Default::default() },
            2 => Features { encrypted: true, has_iv: true, ..Default::default() },
            3..=MAX_VERSION => Features {
                encrypted: flags.contains(HeaderFlags::ENCRYPTION),
                has_iv: flags.contains(HeaderFlags::IV),
                compressed: flags.contains(HeaderFlags::COMPRESSION),
                hashing: version >= 6,
            },
            other => return Err(FormatError::UnsupportedVersion { version: other }),
        };
        Ok(f)
    }

    /// Whether the hash count field is on disk.
    pub fn has_hash_count(&self, version: u32) -> bool {
        version >= 6 && self.encrypted
    }

    /// Whether the IV field is on disk.
    pub fn has_iv_field(&self) -> bool {
        self.encrypted && self.has_iv
    }
}

/// Decoded file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u32,
    /// Flags byte as stored (empty for versions < 3).
    pub flags: HeaderFlags,
    pub features: Features,
    /// Plaintext extended header (versions >= 4).
    pub extended_header: Vec<u8>,
    /// SHA-256 iteration count (0 when absent).
    pub hash_count: u32,
    /// IV; all zeros when encryption is on but the file carries none.
    pub iv: Iv,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: MIN_WRITE_VERSION,
            flags: HeaderFlags::empty(),
            features: Features::default(),
            extended_header: Vec::new(),
            hash_count: 0,
            iv: [0u8; IV_LEN_16],
        }
    }
}

impl FileHeader {
    /// Header a writer would emit for the given feature set.
    pub fn for_write(version: u32, encrypted: bool, compressed: bool, hash_count: u32, iv: Iv, extended_header: Vec<u8>) -> Self {
        let mut flags = HeaderFlags::empty();
        if encrypted {
            flags |= HeaderFlags::ENCRYPTION | HeaderFlags::IV;
        }
        if compressed {
            flags |= HeaderFlags::COMPRESSION;
        }
        Self {
            magic: MAGIC,
            version,
            flags,
            features: Features {
                encrypted,
                has_iv: encrypted,
                compressed,
                hashing: version >= 6 && hash_count > 0,
            },
            extended_header,
            hash_count,
            iv,
        }
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.magic != MAGIC {
            return Err(FormatError::BadMagic { found: self.magic });
        }
        if self.version > MAX_VERSION {
            return Err(FormatError::UnsupportedVersion { version: self.version });
        }
        if self.version < 4 && !self.extended_header.is_empty() {
            return Err(FormatError::Invalid("extended header needs version 4 or later".into()));
        }
        if self.extended_header.len() > u16::MAX as usize {
            return Err(FormatError::LengthOverflow {
                context: "extended header",
                len: self.extended_header.len(),
                max: u16::MAX as usize,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Signature at offset 0 is not the expected magic.
    BadMagic { found: u32 },
    /// Version above the supported range.
    UnsupportedVersion { version: u32 },
    /// Ran out of bytes while reading a field.
    Truncated { context: &'static str, needed: usize, available: usize },
    /// Nothing after the header.
    NoContents,
    /// Decryption produced zero bytes.
    EmptyAfterDecryption,
    /// Decompression produced zero bytes.
    EmptyAfterDecompression,
    UnsupportedEntryVersion { version: u8 },
    UnsupportedFieldVersion { version: u8 },
    UnsupportedFieldType { raw: u8 },
    InvalidUtf8 { context: &'static str },
    /// A length does not fit its on-disk prefix.
    LengthOverflow { context: &'static str, len: usize, max: usize },
    /// Node nesting beyond the configured limit.
    NestingTooDeep { max: usize },
    Compression(CompressionError),
    Invalid(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FormatError::*;
        match self {
            BadMagic { found } =>
                write!(f, "signature not present (found 0x{:08x}, expected 0x{:08x})", found, MAGIC),
            UnsupportedVersion { version } =>
                write!(f, "version \"{}\" is unknown; only versions 0 to {} are supported", version, MAX_VERSION),
            Truncated { context, needed, available } =>
                write!(f, "{} is truncated: need {} bytes, have {}", context, needed, available),
            NoContents =>
                write!(f, "no contents found"),
            EmptyAfterDecryption =>
                write!(f, "decrypted buffer is empty"),
            EmptyAfterDecompression =>
                write!(f, "decompressed buffer is empty"),
            UnsupportedEntryVersion { version } =>
                write!(f, "entry version {} is not supported", version),
            UnsupportedFieldVersion { version } =>
                write!(f, "field version {} is not supported", version),
            UnsupportedFieldType { raw } =>
                write!(f, "field type {} is not supported", enum_name_or_hex::<FieldType>(*raw)),
            InvalidUtf8 { context } =>
                write!(f, "{} is not valid UTF-8", context),
            LengthOverflow { context, len, max } =>
                write!(f, "{} exceeds maximum size: {} > {}", context, len, max),
            NestingTooDeep { max } =>
                write!(f, "entries nested deeper than {} levels", max),
            Compression(e) =>
                write!(f, "{}", e),
            Invalid(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<CompressionError> for FormatError {
    fn from(e: CompressionError) -> Self {
        FormatError::Compression(e)
    }
}
