//! container/decode.rs
//!
//! Bytes on disk -> header + entry tree.
//!
//! Pipeline: header -> (derive key, decrypt) -> (size prefix, decompress) ->
//! encrypted extended header (v5+) -> root node record.
//! Everything is built in a fresh `EntryTree`; callers swap it in only on success.

use tracing::{debug, warn};

use crate::compression::{Decompressor, ZlibCodec};
use crate::config::CodecConfig;
use crate::constants::SIZE_PREFIX_LEN;
use crate::container::Decoded;
use crate::crypto::{decrypt_cbc, derive_key, Password};
use crate::entry::{EntryId, EntryTree};
use crate::headers::{decode_header, FileHeader, FormatError};
use crate::telemetry::{Operation, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{Error, Result};
use crate::utils::ByteReader;

/// Decode a whole container image.
pub fn decode_container(bytes: &[u8], password: &Password, config: &CodecConfig) -> Result<Decoded> {
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let mut r = ByteReader::new(bytes);
    let header = timer.time(Stage::Decode, || decode_header(&mut r))?;
    counters.add_header(r.position());

    let body = r.rest();
    if body.is_empty() {
        return Err(FormatError::NoContents.into());
    }

    let plaintext = if header.features.encrypted {
        let key = timer.time(Stage::DeriveKey, || derive_key(password, header.hash_count));
        if key.is_legacy() {
            debug!(version = header.version, "file uses the legacy raw-password key");
        }
        let out = timer.time(Stage::Decrypt, || decrypt_cbc(&key, &header.iv, body))?;
        if out.is_empty() {
            return Err(FormatError::EmptyAfterDecryption.into());
        }
        out
    } else {
        body.to_vec()
    };

    // past the cipher, a bad body is a format error even when encrypted
    let (tree, root, encrypted_extended_header, decompressed_len) =
        decode_payload(&plaintext, &header, config, &mut timer).map_err(Error::Format)?;

    counters.add_body(decompressed_len, plaintext.len(), body.len());
    if let Ok(stats) = tree.statistics(root) {
        counters.add_statistics(&stats);
    }
    timer.finish();

    let telemetry = config
        .collect_metrics
        .then(|| TelemetrySnapshot::from(Operation::Load, header.version, &counters, &timer));

    Ok(Decoded { header, encrypted_extended_header, tree, root, telemetry })
}

/// Tree, root, encrypted extended header, decompressed length.
type Payload = (EntryTree, EntryId, Vec<u8>, usize);

fn decode_payload(
    plaintext: &[u8],
    header: &FileHeader,
    config: &CodecConfig,
    timer: &mut TelemetryTimer,
) -> std::result::Result<Payload, FormatError> {
    let decompressed;
    let data: &[u8] = if header.features.compressed {
        let mut r = ByteReader::new(plaintext);
        let declared = r.read_u64_le("decompressed size")?;
        debug_assert_eq!(r.position(), SIZE_PREFIX_LEN);
        decompressed = timer.time(Stage::Decompress, || ZlibCodec::default().decompress_exact(r.rest(), declared))?;
        if decompressed.is_empty() {
            return Err(FormatError::EmptyAfterDecompression);
        }
        &decompressed
    } else {
        plaintext
    };

    let mut r = ByteReader::new(data);
    let encrypted_extended_header = if header.version >= 5 {
        let len = r.read_u16_be("encrypted extended header size")? as usize;
        r.read_bytes(len, "encrypted extended header")?.to_vec()
    } else {
        Vec::new()
    };

    let mut tree = EntryTree::new();
    let root = timer.time(Stage::Decode, || tree.parse(&mut r, config.max_depth))?;
    if !tree.entry(root).map(|e| e.is_node()).unwrap_or(false) {
        return Err(FormatError::Invalid("node entry expected at the root".into()));
    }
    if !r.is_empty() {
        warn!(trailing = r.remaining(), "ignoring bytes after the root entry");
    }

    Ok((tree, root, encrypted_extended_header, data.len()))
}
