//! Error types for bundle and manifest format operations

use std::io;
use thiserror::Error;

/// Format operation result type
pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("binary parse error: {0}")]
    Parse(#[from] binrw::Error),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unknown asset kind: {0}")]
    UnknownAssetKind(u8),

    #[error("name is not valid UTF-8")]
    InvalidName,

    #[error("name too long: {0} bytes")]
    NameTooLong(usize),

    #[error("duplicate asset name: {0}")]
    DuplicateAsset(String),

    #[error("duplicate bundle name: {0}")]
    DuplicateBundle(String),

    #[error("asset {name} out of bounds: offset {offset} + size {size} > data section {data_len}")]
    EntryOutOfBounds {
        name: String,
        offset: u64,
        size: u64,
        data_len: u64,
    },

    #[error("dependency cycle involving bundle {0}")]
    DependencyCycle(String),
}
