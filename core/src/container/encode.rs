//! container/encode.rs
//!
//! Entry tree -> bytes on disk.
//!
//! Pipeline (inverse of `decode.rs`):
//! 1. payload = [encrypted extended header (v5+)] + root node record
//! 2. compression: u64 LE payload size + zlib stream
//! 3. encryption: fresh hash count and IV, AES-256-CBC
//! 4. header in front

use tracing::{debug, info};

use crate::compression::{Compressor, ZlibCodec};
use crate::config::CodecConfig;
use crate::container::Encoded;
use crate::constants::{IV_LEN_16, SIZE_PREFIX_LEN};
use crate::crypto::{derive_key, encrypt_cbc, random_hash_count, random_iv, CryptoError, Password};
use crate::entry::{EntryId, EntryTree};
use crate::headers::{encode_header, FileHeader};
use crate::options::{minimum_version, SaveOptions};
use crate::telemetry::{Operation, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{Error, Result};
use crate::utils::{put_u16_prefixed, put_u64_le};

/// Serialize the subtree under `root` into a complete container image.
///
/// The version written is the lowest one able to carry `options` and the
/// extended headers (never below 3).
pub fn encode_container(
    tree: &EntryTree,
    root: EntryId,
    options: SaveOptions,
    extended_header: &[u8],
    encrypted_extended_header: &[u8],
    password: &Password,
    config: &CodecConfig,
) -> Result<Encoded> {
    if !tree.entry(root)?.is_node() {
        return Err(Error::precondition("the root entry must be a node"));
    }

    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let version = minimum_version(options, extended_header, encrypted_extended_header);
    let encrypt = options.contains(SaveOptions::ENCRYPTION);
    let compress = options.contains(SaveOptions::COMPRESSION);

    // 1. payload
    let mut payload = Vec::new();
    if version >= 5 {
        put_u16_prefixed(&mut payload, encrypted_extended_header, u16::MAX as usize, "encrypted extended header")?;
    }
    timer.time(Stage::Encode, || tree.make(root, &mut payload))?;
    let payload_len = payload.len();

    // 2. compression
    let body = if compress {
        let codec = ZlibCodec::new(config.compression_level);
        let stream = timer.time(Stage::Compress, || codec.compress(&payload))?;
        let mut out = Vec::with_capacity(SIZE_PREFIX_LEN + stream.len());
        put_u64_le(&mut out, payload_len as u64);
        out.extend_from_slice(&stream);
        out
    } else {
        payload
    };
    let body_len = body.len();
    if body_len > i32::MAX as usize {
        return Err(CryptoError::SizeLimit { len: body_len }.into());
    }

    // 3. encryption
    let (stored, hash_count, iv) = if encrypt {
        let hash_count = if options.contains(SaveOptions::PASSWORD_HASHING) {
            random_hash_count(config.min_hash_count, config.max_hash_count)
        } else {
            0
        };
        let key = timer.time(Stage::DeriveKey, || derive_key(password, hash_count));
        let iv = random_iv()?;
        let ct = timer.time(Stage::Encrypt, || encrypt_cbc(&key, &iv, &body))?;
        (ct, hash_count, iv)
    } else {
        (body, 0, [0u8; IV_LEN_16])
    };

    // 4. header
    let header = FileHeader::for_write(version, encrypt, compress, hash_count, iv, extended_header.to_vec());
    let mut bytes = timer.time(Stage::Encode, || encode_header(&header))?;
    counters.add_header(bytes.len());
    counters.add_body(payload_len, body_len, stored.len());
    bytes.extend_from_slice(&stored);

    if let Ok(stats) = tree.statistics(root) {
        counters.add_statistics(&stats);
    }
    timer.finish();

    debug!(version, hash_count, options = %options, "container encoded");
    info!(bytes = bytes.len(), entries = counters.nodes + counters.accounts, "encoded password file");

    let telemetry = config
        .collect_metrics
        .then(|| TelemetrySnapshot::from(Operation::Save, version, &counters, &timer));

    Ok(Encoded { bytes, version, hash_count, telemetry })
}
