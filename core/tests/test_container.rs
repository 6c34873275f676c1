// Container codec tests: every save-option combination, version selection,
// hand-built legacy files and the error kind each corruption maps to.

#[cfg(test)]
mod tests {
    use passwordfile_core::{
        config::CodecConfig,
        constants::MAGIC,
        container::{decode_container, encode_container},
        crypto::{encrypt_cbc, legacy_key, Password},
        entry::{EntryId, EntryTree, EntryType, Field, FieldType},
        headers::FormatError,
        options::SaveOptions,
        types::{Error, ErrorKind},
    };

    fn sample_tree() -> (EntryTree, EntryId) {
        let mut tree = EntryTree::new();
        let root = tree.create_node("accounts");
        let bank = tree.create_child(root, EntryType::Account, "bank").unwrap();
        tree.push_field(bank, Field::with_type("pin", "1234", FieldType::Password)).unwrap();
        tree.push_field(bank, Field::new("user", "alice")).unwrap();
        let web = tree.create_child(root, EntryType::Node, "web").unwrap();
        tree.set_expanded_by_default(web, false).unwrap();
        let mail = tree.create_child(web, EntryType::Account, "mail").unwrap();
        tree.set_extended_data(mail, vec![1, 2, 3]).unwrap();
        (tree, root)
    }

    fn all_options() -> Vec<SaveOptions> {
        (0u8..8).map(SaveOptions::from_bits_truncate).collect()
    }

    #[test]
    fn roundtrip_under_every_option_combination() {
        let (tree, root) = sample_tree();
        let pw = Password::from("correct horse");
        let cfg = CodecConfig::default();
        let original = tree.to_bytes(root).unwrap();

        for options in all_options() {
            let enc = encode_container(&tree, root, options, b"", b"", &pw, &cfg).unwrap();
            let dec = decode_container(&enc.bytes, &pw, &cfg).unwrap();

            assert_eq!(dec.header.version, enc.version, "{options}");
            assert_eq!(dec.tree.to_bytes(dec.root).unwrap(), original, "{options}");
            assert_eq!(dec.header.features.encrypted, options.contains(SaveOptions::ENCRYPTION));
            assert_eq!(dec.header.features.compressed, options.contains(SaveOptions::COMPRESSION));
        }
    }

    #[test]
    fn version_follows_options_and_headers() {
        let (tree, root) = sample_tree();
        let pw = Password::from("pw");
        let cfg = CodecConfig::default();
        let enc = |opts, ext: &[u8], enc_ext: &[u8]| {
            encode_container(&tree, root, opts, ext, enc_ext, &pw, &cfg).unwrap()
        };

        assert_eq!(enc(SaveOptions::empty(), b"", b"").version, 3);
        assert_eq!(enc(SaveOptions::ENCRYPTION, b"meta", b"").version, 4);
        assert_eq!(enc(SaveOptions::ENCRYPTION, b"", b"secret meta").version, 5);
        assert_eq!(enc(SaveOptions::PASSWORD_HASHING, b"", b"").version, 6);
    }

    #[test]
    fn extended_headers_survive() {
        let (tree, root) = sample_tree();
        let pw = Password::from("pw");
        let cfg = CodecConfig::default();
        let enc = encode_container(&tree, root, SaveOptions::recommended(), b"plain", b"hidden", &pw, &cfg).unwrap();
        assert!(!enc.bytes.windows(6).any(|w| w == b"hidden"), "encrypted header leaked");

        let dec = decode_container(&enc.bytes, &pw, &cfg).unwrap();
        assert_eq!(dec.header.extended_header, b"plain");
        assert_eq!(dec.encrypted_extended_header, b"hidden");
    }

    #[test]
    fn hash_count_is_written_only_with_hashing() {
        let (tree, root) = sample_tree();
        let pw = Password::from("pw");
        let cfg = CodecConfig { min_hash_count: 10, max_hash_count: 10, ..CodecConfig::default() };

        let hashed = encode_container(&tree, root, SaveOptions::recommended(), b"", b"", &pw, &cfg).unwrap();
        assert_eq!(hashed.hash_count, 10);
        assert_eq!(&hashed.bytes[11..15], &10u32.to_be_bytes());

        let legacy = encode_container(&tree, root, SaveOptions::ENCRYPTION, b"", b"", &pw, &cfg).unwrap();
        assert_eq!(legacy.hash_count, 0);
        // magic + version + flags + IV
        assert_eq!((legacy.bytes.len() - 9 - 16) % 16, 0);
    }

    #[test]
    fn wrong_password_never_yields_a_tree() {
        let (tree, root) = sample_tree();
        let cfg = CodecConfig::default();
        for options in [SaveOptions::ENCRYPTION, SaveOptions::recommended()] {
            // a wrong key passes the padding check about once in 256 tries; the
            // body then fails to parse instead
            let mut crypto_failures = 0;
            for _ in 0..8 {
                let enc = encode_container(&tree, root, options, b"", b"", &Password::from("right"), &cfg).unwrap();
                let err = decode_container(&enc.bytes, &Password::from("wrong"), &cfg).unwrap_err();
                match err.kind() {
                    ErrorKind::Crypto => crypto_failures += 1,
                    ErrorKind::Format => {}
                    other => panic!("{options}: unexpected {other:?}: {err}"),
                }
            }
            assert!(crypto_failures > 0, "{options}");
        }
    }

    #[test]
    fn truncated_ciphertext_is_a_crypto_error() {
        let (tree, root) = sample_tree();
        let pw = Password::from("pw");
        let cfg = CodecConfig::default();
        let mut enc = encode_container(&tree, root, SaveOptions::ENCRYPTION, b"", b"", &pw, &cfg).unwrap();
        enc.bytes.pop();
        let err = decode_container(&enc.bytes, &pw, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto, "{err}");
    }

    /// Version 3 header announcing encryption, IV and compression, then `body`
    /// encrypted with the raw-password key.
    fn encrypted_v3(pw: &Password, body: &[u8]) -> Vec<u8> {
        let iv = [7u8; 16];
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.push(0x80 | 0x40 | 0x20);
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&encrypt_cbc(&legacy_key(pw), &iv, body).unwrap());
        bytes
    }

    #[test]
    fn size_mismatch_inside_encrypted_body_is_a_format_error() {
        let (tree, root) = sample_tree();
        let pw = Password::from("right");
        let cfg = CodecConfig::default();
        let plain = encode_container(&tree, root, SaveOptions::COMPRESSION, b"", b"", &pw, &cfg).unwrap();

        // size prefix + zlib stream, with the declared size 5 too large
        let mut body = plain.bytes[9..].to_vec();
        let declared = u64::from_le_bytes(body[..8].try_into().unwrap());
        body[..8].copy_from_slice(&(declared + 5).to_le_bytes());

        let err = decode_container(&encrypted_v3(&pw, &body), &pw, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{err}");
        assert!(matches!(err, Error::Format(FormatError::Compression(_))), "{err}");

        // the untampered body decodes under the same key
        let ok = decode_container(&encrypted_v3(&pw, &plain.bytes[9..]), &pw, &cfg).unwrap();
        assert_eq!(ok.tree.to_bytes(ok.root).unwrap(), tree.to_bytes(root).unwrap());
    }

    #[test]
    fn bad_field_type_inside_encrypted_body_is_a_format_error() {
        let mut tree = EntryTree::new();
        let root = tree.create_node("accounts");
        let bank = tree.create_child(root, EntryType::Account, "bank").unwrap();
        tree.push_field(bank, Field::with_type("pin", "1234", FieldType::Password)).unwrap();

        // the type byte of the only field closes the record
        let mut record = tree.to_bytes(root).unwrap();
        let last = record.len() - 1;
        assert_eq!(record[last], 1);
        record[last] = 7;

        let pw = Password::from("right");
        let iv = [3u8; 16];
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&encrypt_cbc(&legacy_key(&pw), &iv, &record).unwrap());

        let err = decode_container(&bytes, &pw, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::UnsupportedFieldType { raw: 7 })), "{err}");
    }

    #[test]
    fn tampered_size_prefix_is_a_format_error() {
        let (tree, root) = sample_tree();
        let pw = Password::default();
        let cfg = CodecConfig::default();
        let mut enc = encode_container(&tree, root, SaveOptions::COMPRESSION, b"", b"", &pw, &cfg).unwrap();

        // body starts right after magic, version and flags
        let size_at = 9;
        let declared = u64::from_le_bytes(enc.bytes[size_at..size_at + 8].try_into().unwrap());
        enc.bytes[size_at..size_at + 8].copy_from_slice(&(declared + 1).to_le_bytes());

        let err = decode_container(&enc.bytes, &pw, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(err, Error::Format(FormatError::Compression(_))), "{err}");
    }

    #[test]
    fn header_only_file_has_no_contents() {
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.push(0);
        let err = decode_container(&bytes, &Password::default(), &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::NoContents)));
    }

    #[test]
    fn account_at_root_is_rejected() {
        let mut tree = EntryTree::new();
        let acc = tree.create_account("lonely");
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&tree.to_bytes(acc).unwrap());

        let err = decode_container(&bytes, &Password::default(), &CodecConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn encoding_refuses_account_root() {
        let mut tree = EntryTree::new();
        let acc = tree.create_account("lonely");
        let err = encode_container(&tree, acc, SaveOptions::empty(), b"", b"", &Password::default(), &CodecConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    // ## Legacy layouts

    #[test]
    fn version_zero_plain_file_loads() {
        let (tree, root) = sample_tree();
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&tree.to_bytes(root).unwrap());

        let dec = decode_container(&bytes, &Password::default(), &CodecConfig::default()).unwrap();
        assert_eq!(dec.header.version, 0);
        assert_eq!(dec.tree.statistics(dec.root).unwrap(), tree.statistics(root).unwrap());
    }

    #[test]
    fn version_one_uses_zero_iv_and_raw_password() {
        let (tree, root) = sample_tree();
        let pw = Password::from("legacy");
        let ct = encrypt_cbc(&legacy_key(&pw), &[0u8; 16], &tree.to_bytes(root).unwrap()).unwrap();

        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&ct);

        let dec = decode_container(&bytes, &pw, &CodecConfig::default()).unwrap();
        assert!(dec.header.features.encrypted);
        let bank = dec.tree.find_by_path(dec.root, &["bank"], false).unwrap().unwrap();
        assert_eq!(dec.tree.field(bank, 0).unwrap().value(), "1234");
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let (tree, root) = sample_tree();
        let pw = Password::default();
        let cfg = CodecConfig::default();
        let mut enc = encode_container(&tree, root, SaveOptions::empty(), b"", b"", &pw, &cfg).unwrap();
        enc.bytes.extend_from_slice(&[0xEE; 7]);
        assert!(decode_container(&enc.bytes, &pw, &cfg).is_ok());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let mut tree = EntryTree::new();
        let root = tree.create_node("0");
        let mut cur = root;
        for i in 1..20 {
            cur = tree.create_child(cur, EntryType::Node, i.to_string()).unwrap();
        }
        let pw = Password::default();
        let enc = encode_container(&tree, root, SaveOptions::empty(), b"", b"", &pw, &CodecConfig::default()).unwrap();

        let tight = CodecConfig { max_depth: 5, ..CodecConfig::default() };
        let err = decode_container(&enc.bytes, &pw, &tight).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::NestingTooDeep { max: 5 })), "{err}");
    }

    #[test]
    fn telemetry_is_optional() {
        let (tree, root) = sample_tree();
        let pw = Password::default();
        let off = CodecConfig { collect_metrics: false, ..CodecConfig::default() };
        let enc = encode_container(&tree, root, SaveOptions::COMPRESSION, b"", b"", &pw, &off).unwrap();
        assert!(enc.telemetry.is_none());

        let on = CodecConfig::default();
        let enc = encode_container(&tree, root, SaveOptions::COMPRESSION, b"", b"", &pw, &on).unwrap();
        let t = enc.telemetry.expect("telemetry on by default");
        assert_eq!(t.file_bytes(), enc.bytes.len() as u64);
        assert_eq!(t.accounts, 2);
    }
}
