//! constants.rs
//! Wire-format constants shared by the header, container and entry codecs.

/// Magic number at offset 0 ("pwam" when read as little-endian bytes).
pub const MAGIC: u32 = 0x7770_616D;

/// Highest container version this crate reads and writes.
pub const MAX_VERSION: u32 = 6;

/// Lowest version the writer ever emits (the flags byte is always present).
pub const MIN_WRITE_VERSION: u32 = 3;

/// AES-256 key length and CBC IV length.
pub const KEY_LEN_32: usize = 32;
pub const IV_LEN_16: usize = 16;

/// Inclusive bounds for the random SHA-256 iteration count chosen on save.
pub const MIN_HASH_COUNT: u32 = 1;
pub const MAX_HASH_COUNT: u32 = 100;

/// Default zlib level, matching zlib's own `compress()`.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Parser refuses node trees nested deeper than this.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Size of the little-endian decompressed-size prefix in compressed bodies.
pub const SIZE_PREFIX_LEN: usize = 8;

/// Backup files are written next to the source with this suffix.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Label given to the root node created by `generate_root_entry`.
pub const ROOT_LABEL: &str = "accounts";

/// Header flag byte (present from version 3 on).
pub mod header_flags {
    pub const ENCRYPTION: u8  = 0x80;
    pub const IV: u8          = 0x40;
    pub const COMPRESSION: u8 = 0x20;
}

/// Entry and field record version bytes.
pub mod record {
    pub const NODE_V0: u8 = 0x00;
    pub const NODE_V1: u8 = 0x01;
    /// High bit marks an account record; low bit says extended data follows.
    pub const ACCOUNT_MARKER: u8 = 0x80;
    pub const ACCOUNT_HAS_EXT: u8 = 0x01;
    pub const NODE_EXPANDED: u8 = 0x80;
    pub const FIELD_V0: u8 = 0x00;
    pub const FIELD_V1: u8 = 0x01;
}
