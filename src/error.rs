//! Error types for cairn.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the index and its paged store.
///
/// `NodeFull` never escapes a public operation: the engine catches it at the
/// call site and promotes the insert to a split. `NoSuchRecord` is an
/// expected outcome for locate misses and past-end reads; callers use it for
/// range-scan positioning.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid page id")]
    InvalidPid,

    #[error("node is full")]
    NodeFull,

    #[error("no such record")]
    NoSuchRecord,

    #[error("invalid attribute")]
    InvalidAttribute,

    #[error("failed to open index file '{path}': {source}")]
    FileOpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("index file size {size} is not a multiple of the page size")]
    InvalidFileFormat { size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
