use std::io;
use thiserror::Error;

use crate::{
    compression::CompressionError,
    crypto::CryptoError,
    entry::EntryError,
    headers::FormatError,
};

/// Closed set of failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Crypto,
    Io,
    Precondition,
}

/// Unified error for every password-file operation.
/// - Each layer owns its own error enum; `From` impls fold them here so `?` works end to end.
/// - Entry-handle misuse is a caller precondition, not a data problem.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsupported on-disk data.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Key derivation, cipher or random-source failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation called in the wrong state (no file open, no root entry, stale handle, ...).
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format(_) => ErrorKind::Format,
            Error::Crypto(_) => ErrorKind::Crypto,
            Error::Io(_) => ErrorKind::Io,
            Error::Precondition(_) => ErrorKind::Precondition,
        }
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }
}

impl From<EntryError> for Error {
    fn from(e: EntryError) -> Self {
        Error::Precondition(e.to_string())
    }
}

impl From<CompressionError> for Error {
    fn from(e: CompressionError) -> Self {
        Error::Format(FormatError::Compression(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
