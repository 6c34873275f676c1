//! Deflate (zlib wrapper) via flate2.
//!
//! Encoding goes through the buffered `ZlibEncoder`; decoding drives the
//! low-level `Decompress` state machine so a short source, an oversized
//! stream and corrupt input stay distinguishable.

use std::io::Write;
use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};

use crate::compression::types::{Compressor, Decompressor, CompressionError};
use crate::constants::DEFAULT_COMPRESSION_LEVEL;

/// Worst-case zlib output size for `source_len` input bytes.
pub fn compress_bound(source_len: usize) -> usize {
    source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 13
}

/// Largest plausible decompressed size for `source_len` compressed bytes.
pub fn plausible_limit(source_len: usize) -> usize {
    // deflate tops out near 1032:1
    source_len.saturating_mul(1032).saturating_add(1024)
}

#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    level: Compression,
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self { level: Compression::new(DEFAULT_COMPRESSION_LEVEL) }
    }
}

impl ZlibCodec {
    pub fn new(level: u32) -> Self {
        let lvl = match level {
            0..=9 => Compression::new(level),
            _ => Compression::default(),
        };
        Self { level: lvl }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Compressor for ZlibCodec {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut enc = ZlibEncoder::new(Vec::with_capacity(compress_bound(input.len())), self.level);
        enc.write_all(input)?;
        Ok(enc.finish()?)
    }
}

impl Decompressor for ZlibCodec {
    fn decompress_exact(&self, input: &[u8], declared_len: u64) -> Result<Vec<u8>, CompressionError> {
        let limit = plausible_limit(input.len());
        if declared_len > limit as u64 {
            return Err(CompressionError::ImplausibleSize { declared: declared_len, limit });
        }
        let declared = declared_len as usize;

        // one spare byte so an oversized stream shows up as len > declared
        let mut out = Vec::with_capacity(declared + 1);
        let mut state = Decompress::new(true);

        loop {
            let before_in = state.total_in();
            let before_out = state.total_out();
            let consumed = before_in as usize;

            let status = state
                .decompress_vec(&input[consumed..], &mut out, FlushDecompress::Finish)
                .map_err(|e| CompressionError::Corrupt(e.to_string()))?;

            if out.len() > declared {
                return Err(CompressionError::DestinationTooSmall { declared });
            }
            if status == Status::StreamEnd {
                break;
            }

            let progressed = state.total_in() != before_in || state.total_out() != before_out;
            if !progressed {
                let consumed = state.total_in() as usize;
                if consumed >= input.len() {
                    return Err(CompressionError::SourceTooSmall { consumed });
                }
                return Err(CompressionError::Corrupt(format!("stream stalled at input offset {consumed}")));
            }
        }

        if out.len() != declared {
            return Err(CompressionError::SizeMismatch { declared, actual: out.len() });
        }
        Ok(out)
    }
}
