// ## 📂 File: `src/crypto/types.rs`

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::{IV_LEN_16, KEY_LEN_32};

/// User password held as raw bytes; wiped on drop and on `clear()`.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Password {
    bytes: Vec<u8>,
}

impl Password {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Wipe the stored bytes and leave an empty password.
    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.bytes.clear();
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(Zeroizing::new(s).as_bytes().to_vec())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// AES-256 key derived from a password; wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN_32],
    /// `true` when the key is the raw password (hash count 0).
    legacy: bool,
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN_32], legacy: bool) -> Self {
        Self { bytes, legacy }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN_32] {
        &self.bytes
    }

    /// Raw-password keys come from files written without password hashing.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .field("legacy", &self.legacy)
            .finish()
    }
}

/// CBC initialisation vector.
pub type Iv = [u8; IV_LEN_16];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Cipher primitive rejected the input; every message the primitive produced is kept.
    Primitive { messages: Vec<String> },

    /// Ciphertext is not a whole number of AES blocks.
    InvalidCiphertextLen { len: usize },

    /// Operating-system random source failed.
    RandomSource(String),

    /// Body too large for the cipher.
    SizeLimit { len: usize },
}

impl CryptoError {
    pub fn primitive(msg: impl Into<String>) -> Self {
        CryptoError::Primitive { messages: vec![msg.into()] }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        match self {
            Primitive { messages } =>
                write!(f, "cipher failure: {}", messages.join("\n")),
            InvalidCiphertextLen { len } =>
                write!(f, "ciphertext length {} is not a multiple of the block size", len),
            RandomSource(msg) =>
                write!(f, "random source failure: {}", msg),
            SizeLimit { len } =>
                write!(f, "size exceeds limit: {} bytes", len),
        }
    }
}

impl std::error::Error for CryptoError {}
