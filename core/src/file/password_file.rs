//! file/password_file.rs
//!
//! `PasswordFile`: a path, a password, an entry tree and the file handle behind them.
//!
//! State machine:
//! - Closed: no handle. `open`/`create` move to Open.
//! - Open: handle held; `load` fills the tree, `save`/`write` serialize it.
//! - `close` drops the handle and keeps the tree; `clear` resets everything.
//!
//! Loading is transactional: the container is decoded into a fresh arena and only
//! swapped in once the whole file parsed.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::CodecConfig;
use crate::constants::{BACKUP_SUFFIX, ROOT_LABEL};
use crate::container::{decode_container, encode_container, Encoded};
use crate::crypto::Password;
use crate::entry::{EntryId, EntryStatistics, EntryTree};
use crate::file::export::{render_summary, render_text, SummaryInput};
use crate::headers::probe_encryption;
use crate::options::{minimum_version, OpenOptions, SaveOptions};
use crate::telemetry::{Stage, TelemetrySnapshot};
use crate::types::{Error, Result};

/// Longest prefix `is_encryption_used` needs: magic, version, flags.
const PROBE_LEN: u64 = 9;

fn io_error(msg: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, msg.to_string()))
}

#[derive(Debug, Default)]
pub struct PasswordFile {
    path: String,
    password: Password,
    tree: EntryTree,
    root: Option<EntryId>,
    extended_header: Vec<u8>,
    encrypted_extended_header: Vec<u8>,
    version: u32,
    open_options: OpenOptions,
    save_options: SaveOptions,
    file: Option<File>,
    config: CodecConfig,
    last_telemetry: Option<TelemetrySnapshot>,
}

impl PasswordFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl AsRef<str>, password: impl Into<Password>) -> Self {
        let mut f = Self::new();
        f.set_path(path);
        f.set_password(password);
        f
    }

    // ---------------------------------------------------------------------
    // Path, password, configuration
    // ---------------------------------------------------------------------

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set the path, closing the current file. A leading `file:` is stripped.
    pub fn set_path(&mut self, path: impl AsRef<str>) {
        self.close();
        let p = path.as_ref();
        self.path = p.strip_prefix("file:").unwrap_or(p).to_string();
    }

    pub fn clear_path(&mut self) {
        self.close();
        self.path.clear();
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<Password>) {
        self.password = password.into();
    }

    pub fn clear_password(&mut self) {
        self.password.clear();
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CodecConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // File handle
    // ---------------------------------------------------------------------

    /// Open the file at `path()` without loading it. Empty files are rejected.
    pub fn open(&mut self, options: OpenOptions) -> Result<()> {
        self.close();
        if self.path.is_empty() {
            return Err(Error::precondition("Unable to open file because path is empty."));
        }
        let file = fs::OpenOptions::new()
            .read(true)
            .write(!options.contains(OpenOptions::READ_ONLY))
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            return Err(io_error("File is empty."));
        }
        debug!(path = %self.path, options = %options, "opened password file");
        self.file = Some(file);
        self.open_options = options;
        Ok(())
    }

    /// Create (or truncate) the file at `path()`. No root entry is generated.
    pub fn create(&mut self) -> Result<()> {
        self.close();
        if self.path.is_empty() {
            return Err(Error::precondition("Unable to create file because path is empty."));
        }
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        debug!(path = %self.path, "created password file");
        self.file = Some(file);
        self.open_options = OpenOptions::empty();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Drop the file handle. The in-memory entries stay.
    pub fn close(&mut self) {
        self.file = None;
    }

    /// Size of the open file in bytes; 0 when closed.
    pub fn size(&self) -> Result<u64> {
        match &self.file {
            Some(f) => Ok(f.metadata()?.len()),
            None => Ok(0),
        }
    }

    fn writable(&self) -> bool {
        self.file.is_some() && !self.open_options.contains(OpenOptions::READ_ONLY)
    }

    // ---------------------------------------------------------------------
    // Entries
    // ---------------------------------------------------------------------

    /// Create an empty root node labelled "accounts" unless one exists.
    pub fn generate_root_entry(&mut self) -> EntryId {
        match self.root {
            Some(root) if self.tree.contains(root) => root,
            _ => {
                let root = self.tree.create_node(ROOT_LABEL);
                self.root = Some(root);
                root
            }
        }
    }

    pub fn root_entry(&self) -> Option<EntryId> {
        self.root
    }

    pub fn has_root_entry(&self) -> bool {
        self.root.is_some()
    }

    /// Replace the root with `root` (detached from any parent), or drop it with `None`.
    pub fn set_root_entry(&mut self, root: Option<EntryId>) -> Result<()> {
        if let Some(id) = root {
            if !self.tree.entry(id)?.is_node() {
                return Err(Error::precondition("the root entry must be a node"));
            }
            self.tree.set_parent(id, None, None)?;
        }
        if let Some(old) = self.root {
            if Some(old) != root && self.tree.contains(old) {
                self.tree.remove(old)?;
            }
        }
        self.root = root;
        Ok(())
    }

    pub fn tree(&self) -> &EntryTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut EntryTree {
        &mut self.tree
    }

    /// Drop every entry, including the root.
    pub fn clear_entries(&mut self) {
        self.tree = EntryTree::new();
        self.root = None;
    }

    /// Close and forget path, password, entries and both extended headers.
    pub fn clear(&mut self) {
        self.close();
        self.clear_path();
        self.clear_password();
        self.clear_entries();
        self.open_options = OpenOptions::empty();
        self.extended_header.clear();
        self.encrypted_extended_header.clear();
    }

    // ---------------------------------------------------------------------
    // Headers and metadata
    // ---------------------------------------------------------------------

    pub fn extended_header(&self) -> &[u8] {
        &self.extended_header
    }

    pub fn set_extended_header(&mut self, data: impl Into<Vec<u8>>) {
        self.extended_header = data.into();
    }

    pub fn encrypted_extended_header(&self) -> &[u8] {
        &self.encrypted_extended_header
    }

    pub fn set_encrypted_extended_header(&mut self, data: impl Into<Vec<u8>>) {
        self.encrypted_extended_header = data.into();
    }

    /// Version of the last loaded or written file (0 before either).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Features of the last loaded or written file.
    pub fn save_options(&self) -> SaveOptions {
        self.save_options
    }

    pub fn open_options(&self) -> OpenOptions {
        self.open_options
    }

    pub fn last_telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.last_telemetry.as_ref()
    }

    /// Version `save(options)` would write with the current extended headers.
    pub fn minimum_version(&self, options: SaveOptions) -> u32 {
        minimum_version(options, &self.extended_header, &self.encrypted_extended_header)
    }

    // ---------------------------------------------------------------------
    // Load
    // ---------------------------------------------------------------------

    /// Read and decode the file, replacing the current root entry.
    /// Opens the file first when needed. On failure nothing changes.
    pub fn load(&mut self) -> Result<()> {
        if !self.is_open() {
            self.open(self.open_options)?;
        }
        let started = Instant::now();
        let bytes = {
            let file = self.file.as_mut().ok_or_else(|| io_error("file is not open"))?;
            file.seek(SeekFrom::Start(0))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            buf
        };
        let read_time = started.elapsed();

        let decoded = decode_container(&bytes, &self.password, &self.config)?;

        self.version = decoded.header.version;
        self.save_options = SaveOptions::from_features(&decoded.header.features, decoded.header.version);
        self.extended_header = decoded.header.extended_header;
        self.encrypted_extended_header = decoded.encrypted_extended_header;
        self.tree = decoded.tree;
        self.root = Some(decoded.root);
        self.last_telemetry = decoded.telemetry.map(|mut t| {
            t.stage_times.add(Stage::Read, read_time);
            t.elapsed += read_time;
            t
        });

        info!(
            path = %self.path,
            version = self.version,
            features = %self.save_options,
            entries = self.tree.len(),
            "loaded password file"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Save / write
    // ---------------------------------------------------------------------

    fn encode(&self, options: SaveOptions) -> Result<Encoded> {
        let root = self.root.ok_or_else(|| Error::precondition("Root entry has not been created."))?;
        encode_container(
            &self.tree,
            root,
            options,
            &self.extended_header,
            &self.encrypted_extended_header,
            &self.password,
            &self.config,
        )
    }

    fn commit(&mut self, encoded: Encoded, options: SaveOptions, write_time: std::time::Duration) {
        self.version = encoded.version;
        self.save_options = options;
        self.last_telemetry = encoded.telemetry.map(|mut t| {
            t.stage_times.add(Stage::Write, write_time);
            t.elapsed += write_time;
            t
        });
    }

    /// Replace the file contents with the current entries.
    ///
    /// Reuses the open handle when it is writable, otherwise (re)creates the
    /// file. The file is truncated to the new length.
    pub fn save(&mut self, options: SaveOptions) -> Result<()> {
        let encoded = self.encode(options)?;

        if !self.writable() {
            self.create()?;
        }
        let started = Instant::now();
        {
            let file = self.file.as_mut().ok_or_else(|| io_error("file is not open"))?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&encoded.bytes)?;
            file.set_len(encoded.bytes.len() as u64)?;
            file.flush()?;
        }
        let write_time = started.elapsed();

        info!(
            path = %self.path,
            version = encoded.version,
            features = %options,
            bytes = encoded.bytes.len(),
            "saved password file"
        );
        self.commit(encoded, options, write_time);
        Ok(())
    }

    /// Write the current entries at the current position of the open file.
    pub fn write(&mut self, options: SaveOptions) -> Result<()> {
        if !self.writable() {
            return Err(Error::precondition("file is not open for writing"));
        }
        let encoded = self.encode(options)?;
        let started = Instant::now();
        {
            let file = self.file.as_mut().ok_or_else(|| io_error("file is not open"))?;
            file.write_all(&encoded.bytes)?;
        }
        let write_time = started.elapsed();
        self.commit(encoded, options, write_time);
        Ok(())
    }

    /// Serialize the current entries into any writer; returns the bytes written.
    pub fn write_to<W: Write>(&mut self, out: &mut W, options: SaveOptions) -> Result<usize> {
        let encoded = self.encode(options)?;
        let started = Instant::now();
        out.write_all(&encoded.bytes)?;
        let len = encoded.bytes.len();
        self.commit(encoded, options, started.elapsed());
        Ok(len)
    }

    // ---------------------------------------------------------------------
    // Utilities
    // ---------------------------------------------------------------------

    /// Whether the open file's header announces encryption. Only magic, version
    /// and flags are read; `false` when closed or unrecognized.
    pub fn is_encryption_used(&mut self) -> bool {
        let Some(file) = self.file.as_mut() else {
            return false;
        };
        if file.seek(SeekFrom::Start(0)).is_err() {
            return false;
        }
        let mut buf = Vec::with_capacity(PROBE_LEN as usize);
        if Read::by_ref(file).take(PROBE_LEN).read_to_end(&mut buf).is_err() {
            return false;
        }
        probe_encryption(&buf).unwrap_or(false)
    }

    /// Copy the file to `<path>.backup`, replacing an existing backup.
    /// Opens the file read-only when needed; an empty file is skipped.
    pub fn do_backup(&mut self) -> Result<()> {
        if !self.is_open() {
            self.open(OpenOptions::READ_ONLY)?;
        }
        if self.size()? == 0 {
            return Ok(());
        }
        let backup_path = format!("{}{}", self.path, BACKUP_SUFFIX);
        let file = self.file.as_mut().ok_or_else(|| io_error("file is not open"))?;
        file.seek(SeekFrom::Start(0))?;
        let mut backup = File::create(&backup_path)?;
        let copied = io::copy(file, &mut backup)?;
        backup.flush()?;
        debug!(backup = %backup_path, bytes = copied, "wrote backup");
        Ok(())
    }

    /// Write the entries as indented plain text (no encryption).
    pub fn export_to_textfile(&self, target: impl AsRef<std::path::Path>) -> Result<()> {
        let root = self.root.ok_or_else(|| Error::precondition("Root entry has not been created."))?;
        let text = render_text(&self.tree, root)?;
        fs::write(target, text)?;
        Ok(())
    }

    /// Version, features and entry counts, noting what would change on `save(save_options)`.
    pub fn summary(&self, save_options: SaveOptions) -> String {
        let statistics = self
            .root
            .and_then(|root| self.tree.statistics(root).ok())
            .unwrap_or_default();
        render_summary(&SummaryInput {
            path: &self.path,
            version: self.version,
            version_after_save: self.minimum_version(save_options),
            features: self.save_options,
            features_after_save: save_options,
            extended_header: &self.extended_header,
            encrypted_extended_header: &self.encrypted_extended_header,
            statistics,
        })
    }

    /// Entry counts of the whole document (zero without a root).
    pub fn statistics(&self) -> EntryStatistics {
        self.root
            .and_then(|root| self.tree.statistics(root).ok())
            .unwrap_or_default()
    }
}
