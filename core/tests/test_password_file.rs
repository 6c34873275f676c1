// PasswordFile tests against real files in a temporary directory.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use passwordfile_core::prelude::*;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> String {
        let p: PathBuf = dir.path().join(name);
        p.to_string_lossy().into_owned()
    }

    /// accounts/bank with a pin field, saved with `options`.
    fn write_bank_file(path: &str, password: &str, options: SaveOptions) {
        let mut file = PasswordFile::with_path(path, password);
        let root = file.generate_root_entry();
        let tree = file.tree_mut();
        let bank = tree.create_child(root, EntryType::Account, "bank").unwrap();
        tree.push_field(bank, Field::with_type("pin", "1234", FieldType::Password)).unwrap();
        file.create().unwrap();
        file.save(options).unwrap();
    }

    #[test]
    fn bank_pin_scenario() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault.pwmgr");
        write_bank_file(&path, "s3cret", SaveOptions::recommended());

        let mut file = PasswordFile::with_path(&path, "s3cret");
        assert!(!file.is_encryption_used(), "closed files report no encryption");
        file.open(OpenOptions::READ_ONLY).unwrap();
        assert!(file.is_encryption_used());
        file.load().unwrap();

        assert_eq!(file.version(), 6);
        assert_eq!(file.save_options(), SaveOptions::recommended());

        let root = file.root_entry().expect("root after load");
        let tree = file.tree();
        assert_eq!(tree.label(root).unwrap(), "accounts");
        let bank = tree.find_by_path(root, &["accounts", "bank"], true).unwrap().unwrap();
        let pin = tree.field(bank, 0).unwrap();
        assert_eq!(pin.name(), "pin");
        assert_eq!(pin.value(), "1234");
        assert_eq!(pin.field_type(), FieldType::Password);
    }

    #[test]
    fn wrong_password_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");
        write_bank_file(&path, "right", SaveOptions::recommended());

        let mut file = PasswordFile::with_path(&path, "right");
        file.load().unwrap();
        let root_before = file.root_entry();
        let stats_before = file.statistics();

        file.set_password("wrong");
        let err = file.load().unwrap_err();
        // a wrong key that passes the padding check fails later as a format error
        assert!(matches!(err.kind(), ErrorKind::Crypto | ErrorKind::Format), "{err}");
        assert_eq!(file.root_entry(), root_before);
        assert_eq!(file.statistics(), stats_before);
        assert_eq!(file.version(), 6);
    }

    #[test]
    fn every_option_combination_roundtrips_through_disk() {
        let dir = TempDir::new().unwrap();
        for bits in 0u8..8 {
            let options = SaveOptions::from_bits_truncate(bits);
            let path = temp_path(&dir, &format!("file{bits}"));
            write_bank_file(&path, "pw", options);

            let mut file = PasswordFile::with_path(&path, "pw");
            file.load().unwrap();
            assert_eq!(file.version(), file.minimum_version(options), "{options}");
            assert_eq!(file.save_options(), options);
            assert_eq!(file.statistics().field_count, 1);
        }
    }

    #[test]
    fn save_truncates_and_reuses_handle() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");

        let mut file = PasswordFile::with_path(&path, "pw");
        let root = file.generate_root_entry();
        for i in 0..50 {
            let acc = file.tree_mut().create_child(root, EntryType::Account, format!("acc{i}")).unwrap();
            file.tree_mut().push_field(acc, Field::new("note", "x".repeat(100))).unwrap();
        }
        file.create().unwrap();
        file.save(SaveOptions::empty()).unwrap();
        let big = fs::metadata(&path).unwrap().len();

        file.tree_mut().delete_children(root, 0, 50).unwrap();
        file.save(SaveOptions::empty()).unwrap();
        let small = fs::metadata(&path).unwrap().len();
        assert!(small < big);
        assert_eq!(file.size().unwrap(), small);

        let mut reread = PasswordFile::with_path(&path, "pw");
        reread.load().unwrap();
        assert_eq!(reread.statistics().account_count, 0);
    }

    #[test]
    fn extended_headers_roundtrip_and_raise_version() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");

        let mut file = PasswordFile::with_path(&path, "pw");
        file.generate_root_entry();
        file.set_extended_header(b"app=1".to_vec());
        file.set_encrypted_extended_header(b"sync-token".to_vec());
        assert_eq!(file.minimum_version(SaveOptions::ENCRYPTION), 5);
        file.create().unwrap();
        file.save(SaveOptions::ENCRYPTION).unwrap();
        assert_eq!(file.version(), 5);

        let mut reread = PasswordFile::with_path(&path, "pw");
        reread.load().unwrap();
        assert_eq!(reread.extended_header(), b"app=1");
        assert_eq!(reread.encrypted_extended_header(), b"sync-token");
    }

    #[test]
    fn open_errors() {
        let dir = TempDir::new().unwrap();

        let mut nameless = PasswordFile::new();
        assert_eq!(nameless.open(OpenOptions::empty()).unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(nameless.open(OpenOptions::READ_ONLY).unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(nameless.create().unwrap_err().kind(), ErrorKind::Precondition);
        assert!(!nameless.is_open());

        let empty = temp_path(&dir, "empty");
        fs::write(&empty, b"").unwrap();
        let mut file = PasswordFile::with_path(&empty, "pw");
        let err = file.open(OpenOptions::READ_ONLY).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!file.is_open());

        let mut missing = PasswordFile::with_path(temp_path(&dir, "missing"), "pw");
        assert_eq!(missing.load().unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn encryption_probe_reads_the_open_file() {
        let dir = TempDir::new().unwrap();
        let plain = temp_path(&dir, "plain");
        let sealed = temp_path(&dir, "sealed");
        let garbage = temp_path(&dir, "garbage");
        write_bank_file(&plain, "pw", SaveOptions::COMPRESSION);
        write_bank_file(&sealed, "pw", SaveOptions::ENCRYPTION);
        fs::write(&garbage, b"not a password file at all").unwrap();

        let mut file = PasswordFile::with_path(&plain, "pw");
        file.open(OpenOptions::READ_ONLY).unwrap();
        assert!(!file.is_encryption_used());

        let mut file = PasswordFile::with_path(&sealed, "pw");
        file.open(OpenOptions::READ_ONLY).unwrap();
        assert!(file.is_encryption_used());
        // probing twice and then loading both start from the top of the file
        assert!(file.is_encryption_used());
        file.load().unwrap();
        assert_eq!(file.statistics().account_count, 1);

        let mut file = PasswordFile::with_path(&garbage, "pw");
        file.open(OpenOptions::READ_ONLY).unwrap();
        assert!(!file.is_encryption_used());
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "garbage");
        fs::write(&path, b"definitely not a password file").unwrap();

        let mut file = PasswordFile::with_path(&path, "pw");
        assert_eq!(file.load().unwrap_err().kind(), ErrorKind::Format);
        assert!(!file.has_root_entry());
    }

    #[test]
    fn save_without_root_is_refused() {
        let dir = TempDir::new().unwrap();
        let mut file = PasswordFile::with_path(temp_path(&dir, "vault"), "pw");
        let err = file.save(SaveOptions::recommended()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        let err = file.export_to_textfile(temp_path(&dir, "out.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn write_needs_a_writable_handle() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");
        write_bank_file(&path, "pw", SaveOptions::empty());

        let mut file = PasswordFile::with_path(&path, "pw");
        file.open(OpenOptions::READ_ONLY).unwrap();
        file.load().unwrap();
        let err = file.write(SaveOptions::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let mut buf = Vec::new();
        let n = file.write_to(&mut buf, SaveOptions::COMPRESSION).unwrap();
        assert_eq!(n, buf.len());
        assert_eq!(file.save_options(), SaveOptions::COMPRESSION);
    }

    #[test]
    fn backup_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");
        write_bank_file(&path, "pw", SaveOptions::recommended());

        let mut file = PasswordFile::with_path(&path, "pw");
        file.do_backup().unwrap();
        let backup = format!("{path}.backup");
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&path).unwrap());
        assert_eq!(file.open_options(), OpenOptions::READ_ONLY);
    }

    #[test]
    fn export_writes_indented_text() {
        let dir = TempDir::new().unwrap();
        let mut file = PasswordFile::new();
        let root = file.generate_root_entry();
        let sub = file.tree_mut().create_child(root, EntryType::Node, "web").unwrap();
        let acc = file.tree_mut().create_child(sub, EntryType::Account, "mail").unwrap();
        file.tree_mut().push_field(acc, Field::new("user", "bob")).unwrap();

        let out = temp_path(&dir, "export.txt");
        file.export_to_textfile(&out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let expected = " - accounts\n     - web\n         - mail\n            user           bob\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn path_scheme_is_stripped() {
        let mut file = PasswordFile::new();
        file.set_path("file:/tmp/some/vault");
        assert_eq!(file.path(), "/tmp/some/vault");
    }

    #[test]
    fn clear_resets_everything() {
        let mut file = PasswordFile::with_path("/tmp/x", "pw");
        file.generate_root_entry();
        file.set_extended_header(b"a".to_vec());
        file.set_encrypted_extended_header(b"b".to_vec());

        file.clear();
        assert!(file.path().is_empty());
        assert!(file.password().is_empty());
        assert!(!file.has_root_entry());
        assert!(file.extended_header().is_empty());
        assert!(file.encrypted_extended_header().is_empty());
    }

    #[test]
    fn generate_root_is_idempotent() {
        let mut file = PasswordFile::new();
        let a = file.generate_root_entry();
        let b = file.generate_root_entry();
        assert_eq!(a, b);
        file.clear_entries();
        assert!(!file.has_root_entry());
    }

    #[test]
    fn summary_mentions_pending_changes() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");
        write_bank_file(&path, "pw", SaveOptions::ENCRYPTION);

        let mut file = PasswordFile::with_path(&path, "pw");
        file.load().unwrap();
        let s = file.summary(SaveOptions::recommended());
        assert!(s.contains("Version:              3"), "{s}");
        assert!(s.contains("(on disk, after saving: 6)"), "{s}");
        assert!(s.contains("Features:             encryption"), "{s}");
        assert!(s.contains("Number of accounts:   1"), "{s}");
    }

    #[test]
    fn load_records_telemetry() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "vault");
        write_bank_file(&path, "pw", SaveOptions::recommended());

        let mut file = PasswordFile::with_path(&path, "pw");
        file.load().unwrap();
        let t = file.last_telemetry().expect("telemetry");
        assert_eq!(t.file_bytes(), fs::metadata(&path).unwrap().len());
        assert_eq!(t.fields, 1);
    }
}
