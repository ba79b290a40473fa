//! Storage error types.
//!
//! All storage operations return `Result<T>`, aliased to
//! `Result<T, Error>`, so errors propagate cleanly with `?`. Validation
//! failures (`InvalidArgument`) are rejected at the API boundary before any
//! I/O happens.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected at the API boundary before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Encoding(#[from] bucketlog_encoding::EncodingError),

    /// A blob-store operation failed, tagged with the operation.
    #[error("storage {op} failed: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: object_store::Error,
    },

    /// Fetching one chunk failed. Fatal to the read: skipping the chunk
    /// would silently hole the reconstructed stream.
    #[error("fetching chunk '{key}': {source}")]
    ChunkFetch {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("following file '{path}': {source}")]
    FollowFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("writer is closed")]
    ClosedWriter,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn storage(op: &'static str, source: object_store::Error) -> Self {
        Error::Storage { op, source }
    }
}
