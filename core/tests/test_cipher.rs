#[cfg(test)]
mod tests {
    use passwordfile_core::crypto::{decrypt_cbc, derive_key, encrypt_cbc, random_iv, CryptoError, Password};

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = derive_key(&Password::from("pw"), 7);
        let iv = random_iv().expect("os rng");
        let plaintext = b"account data that spans more than one block".to_vec();

        let ct = encrypt_cbc(&key, &iv, &plaintext).unwrap();
        assert_eq!(ct.len() % 16, 0);
        assert_ne!(&ct[..plaintext.len().min(ct.len())], &plaintext[..]);
        assert_eq!(decrypt_cbc(&key, &iv, &ct).unwrap(), plaintext);
    }

    #[test]
    fn fresh_ivs_differ() {
        let a = random_iv().unwrap();
        let b = random_iv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_is_a_primitive_error_or_garbage() {
        let key = derive_key(&Password::from("right"), 3);
        let other = derive_key(&Password::from("wrong"), 3);
        let iv = [1u8; 16];
        let ct = encrypt_cbc(&key, &iv, b"hello world").unwrap();

        match decrypt_cbc(&other, &iv, &ct) {
            Err(CryptoError::Primitive { messages }) => assert!(!messages.is_empty()),
            Err(e) => panic!("unexpected error {e}"),
            // padding can pass by chance; the plaintext is still wrong
            Ok(pt) => assert_ne!(pt, b"hello world"),
        }
    }

    #[test]
    fn empty_ciphertext_is_rejected() {
        let key = derive_key(&Password::from("pw"), 1);
        let err = decrypt_cbc(&key, &[0u8; 16], &[]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidCiphertextLen { len: 0 });
    }
}
