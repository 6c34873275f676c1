//! options.rs
//! Save and open option sets, and the version a save needs.

use std::fmt;

use crate::headers::Features;

bitflags::bitflags! {
    /// Features applied when writing a file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SaveOptions: u8 {
        /// AES-256-CBC body encryption
        const ENCRYPTION       = 0b0000_0001;
        /// zlib body compression
        const COMPRESSION      = 0b0000_0010;
        /// Iterated SHA-256 of the password instead of the raw password as key
        const PASSWORD_HASHING = 0b0000_0100;
    }
}

bitflags::bitflags! {
    /// How the underlying file is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenOptions: u8 {
        const READ_ONLY = 0b0000_0001;
    }
}

impl SaveOptions {
    /// Every feature on; what new files should use.
    pub fn recommended() -> Self {
        SaveOptions::ENCRYPTION | SaveOptions::COMPRESSION | SaveOptions::PASSWORD_HASHING
    }

    /// Options equivalent to the features found in a loaded file.
    pub fn from_features(features: &Features, version: u32) -> Self {
        let mut o = SaveOptions::empty();
        if features.encrypted {
            o |= SaveOptions::ENCRYPTION;
        }
        if features.compressed {
            o |= SaveOptions::COMPRESSION;
        }
        if version >= 6 {
            o |= SaveOptions::PASSWORD_HASHING;
        }
        o
    }
}

fn join_or_none(names: Vec<&str>) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

impl fmt::Display for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::with_capacity(3);
        if self.contains(SaveOptions::ENCRYPTION) {
            names.push("encryption");
        }
        if self.contains(SaveOptions::COMPRESSION) {
            names.push("compression");
        }
        if self.contains(SaveOptions::PASSWORD_HASHING) {
            names.push("password hashing");
        }
        f.write_str(&join_or_none(names))
    }
}

impl fmt::Display for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::with_capacity(1);
        if self.contains(OpenOptions::READ_ONLY) {
            names.push("read-only");
        }
        f.write_str(&join_or_none(names))
    }
}

/// Lowest version able to carry `options` and the given extended headers.
/// Never below 3, since writers always emit the flags byte.
pub fn minimum_version(options: SaveOptions, extended_header: &[u8], encrypted_extended_header: &[u8]) -> u32 {
    if options.contains(SaveOptions::PASSWORD_HASHING) {
        6
    } else if !encrypted_extended_header.is_empty() {
        5
    } else if !extended_header.is_empty() {
        4
    } else {
        3
    }
}
