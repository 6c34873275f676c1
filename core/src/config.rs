//! config.rs
//! Codec tuning shared by load and save.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_DEPTH, MAX_HASH_COUNT, MIN_HASH_COUNT};
use crate::types::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// zlib level 0..=9.
    pub compression_level: u32,
    /// Inclusive range for the random SHA-256 iteration count.
    pub min_hash_count: u32,
    pub max_hash_count: u32,
    /// Deepest node nesting accepted when parsing.
    pub max_depth: usize,
    /// Record a telemetry snapshot for every load and save.
    pub collect_metrics: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            min_hash_count: MIN_HASH_COUNT,
            max_hash_count: MAX_HASH_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
            collect_metrics: true,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::precondition(format!(
                "compression level {} out of range 0..=9", self.compression_level
            )));
        }
        if self.min_hash_count == 0 || self.min_hash_count > self.max_hash_count {
            return Err(Error::precondition(format!(
                "hash count range {}..={} is invalid", self.min_hash_count, self.max_hash_count
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::precondition("max depth must be at least 1"));
        }
        Ok(())
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: CodecConfig = serde_json::from_str(s)
            .map_err(|e| Error::precondition(format!("invalid codec config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
