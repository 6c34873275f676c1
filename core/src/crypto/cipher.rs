//! crypto/cipher.rs
//! AES-256-CBC with PKCS#7 padding for the container body.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::IV_LEN_16;
use crate::crypto::types::{CryptoError, DerivedKey, Iv};

type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

const BLOCK_LEN: usize = 16;

/// Encrypt `plaintext`; output is always a non-empty multiple of 16 bytes.
pub fn encrypt_cbc(key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if plaintext.len() > i32::MAX as usize {
        return Err(CryptoError::SizeLimit { len: plaintext.len() });
    }
    let enc = Aes256CbcEnc::new(key.as_bytes().into(), iv.into());
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt and strip PKCS#7 padding.
pub fn decrypt_cbc(key: &DerivedKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::InvalidCiphertextLen { len: ciphertext.len() });
    }
    if ciphertext.len() > i32::MAX as usize {
        return Err(CryptoError::SizeLimit { len: ciphertext.len() });
    }
    let dec = Aes256CbcDec::new(key.as_bytes().into(), iv.into());
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|e| CryptoError::Primitive {
        messages: vec![
            "bad decrypt".to_string(),
            format!("final block padding check failed: {e}"),
        ],
    })
}

/// Fresh IV from the OS random source.
pub fn random_iv() -> Result<Iv, CryptoError> {
    let mut iv = [0u8; IV_LEN_16];
    OsRng.try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_length_growth() {
        let key = DerivedKey::from_bytes([3u8; 32], false);
        let iv = [9u8; 16];
        assert_eq!(encrypt_cbc(&key, &iv, b"").unwrap().len(), 16);
        assert_eq!(encrypt_cbc(&key, &iv, &[0u8; 15]).unwrap().len(), 16);
        assert_eq!(encrypt_cbc(&key, &iv, &[0u8; 16]).unwrap().len(), 32);
    }

    #[test]
    fn ragged_ciphertext_is_rejected() {
        let key = DerivedKey::from_bytes([3u8; 32], false);
        let err = decrypt_cbc(&key, &[0u8; 16], &[1u8; 17]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidCiphertextLen { len: 17 });
    }
}
