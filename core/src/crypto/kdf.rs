// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! Password to AES-256 key derivation.
//!
//! Design:
//! - hash count `h > 0`: key = SHA-256 applied `h` times, starting from the password bytes.
//! - hash count `0`: key = password bytes truncated or zero-padded to 32 bytes (legacy files).
//!
//! Industry notes:
//! - The iteration count is drawn per save and stored in the header, so two saves of the
//!   same document under the same password use different keys.
//! - The legacy mode is kept only so files written without hashing still open.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::constants::{KEY_LEN_32, MAX_HASH_COUNT, MIN_HASH_COUNT};
use crate::crypto::types::{DerivedKey, Password};

/// Summary: Derive the body key for `password` and the on-disk `hash_count`.
#[inline]
pub fn derive_key(password: &Password, hash_count: u32) -> DerivedKey {
    if hash_count == 0 {
        return legacy_key(password);
    }

    // every intermediate digest lives in this one buffer and is wiped on drop
    let mut key = Zeroizing::new([0u8; KEY_LEN_32]);
    Sha256::new()
        .chain_update(password.as_bytes())
        .finalize_into(GenericArray::from_mut_slice(&mut key[..]));
    for _ in 1..hash_count {
        let mut hasher = Sha256::new();
        hasher.update(&key[..]);
        hasher.finalize_into(GenericArray::from_mut_slice(&mut key[..]));
    }

    DerivedKey::from_bytes(*key, false)
}

/// Raw password bytes used directly as the key.
pub fn legacy_key(password: &Password) -> DerivedKey {
    debug!("deriving legacy raw-password key");
    let mut key = Zeroizing::new([0u8; KEY_LEN_32]);
    let bytes = password.as_bytes();
    let n = bytes.len().min(KEY_LEN_32);
    key[..n].copy_from_slice(&bytes[..n]);
    DerivedKey::from_bytes(*key, true)
}

/// Uniform iteration count in `[min, max]` from the OS random source.
pub fn random_hash_count(min: u32, max: u32) -> u32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    OsRng.gen_range(lo.max(MIN_HASH_COUNT)..=hi.max(MIN_HASH_COUNT))
}

/// Iteration count with the default bounds `[1, 100]`.
pub fn default_hash_count() -> u32 {
    random_hash_count(MIN_HASH_COUNT, MAX_HASH_COUNT)
}
