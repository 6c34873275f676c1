//! compression/types.rs
//! Codec traits and errors for body compression.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    /// Input ran out before the compressed stream ended.
    SourceTooSmall { consumed: usize },
    /// Stream produced more bytes than the declared size.
    DestinationTooSmall { declared: usize },
    /// Stream is not valid zlib.
    Corrupt(String),
    /// Stream ended early: decoded length differs from the declared one.
    SizeMismatch { declared: usize, actual: usize },
    /// Declared size cannot be produced from an input this small.
    ImplausibleSize { declared: u64, limit: usize },
    /// Encoder failure.
    CodecProcessFailed { codec: String, msg: String },
}

impl From<std::io::Error> for CompressionError {
    fn from(e: std::io::Error) -> Self {
        CompressionError::CodecProcessFailed { codec: "zlib".into(), msg: e.to_string() }
    }
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompressionError::*;
        match self {
            SourceTooSmall { consumed } =>
                write!(f, "decompressing failed: the source buffer was too small (consumed {} bytes)", consumed),
            DestinationTooSmall { declared } =>
                write!(f, "decompressing failed: the destination buffer was too small (declared {} bytes)", declared),
            Corrupt(msg) =>
                write!(f, "decompressing failed: the input data was corrupted or incomplete: {}", msg),
            SizeMismatch { declared, actual } =>
                write!(f, "decompressed size mismatch: declared {}, got {}", declared, actual),
            ImplausibleSize { declared, limit } =>
                write!(f, "decompressed size {} exceeds limit {}", declared, limit),
            CodecProcessFailed { codec, msg } =>
                write!(f, "codec {} process failed: {}", codec, msg),
        }
    }
}

impl std::error::Error for CompressionError {}

pub trait Compressor {
    /// Compress a whole buffer into a single stream.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

pub trait Decompressor {
    /// Decompress a whole stream; the output must be exactly `declared_len` bytes.
    fn decompress_exact(&self, input: &[u8], declared_len: u64) -> Result<Vec<u8>, CompressionError>;
}
