//! crates/engine/src/error.rs
//!
//! Error taxonomy for hashing operations.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

/// Error type for hashing operations.
///
/// Every failure returns through this enum; the engine never panics on
/// these paths and never yields a partial result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request selected no algorithms.
    #[error("no hash algorithms selected")]
    NothingSelected,

    /// Opening or inspecting the input failed.
    #[error("cannot open {path}: {source}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The path names a directory.
    #[error("cannot process directory {path}")]
    IsDirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Reserving working memory failed.
    #[error("cannot reserve {bytes} bytes of working memory")]
    Allocation {
        /// Size of the failed reservation.
        bytes: usize,
        /// The underlying reservation error.
        #[source]
        source: TryReserveError,
    },

    /// A read failed mid-stream.
    #[error("read failed on {path} at offset {offset}: {source}")]
    Read {
        /// The path being read.
        path: PathBuf,
        /// Stream offset of the failed read.
        offset: u64,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The progress callback cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A read task could not be joined.
    #[cfg(feature = "async")]
    #[cfg_attr(docsrs, doc(cfg(feature = "async")))]
    #[error("read task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// Creates an open error with path context.
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
