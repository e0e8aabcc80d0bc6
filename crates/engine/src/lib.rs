#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod dispatch;
mod ed2k;
mod error;
mod progress;
mod request;
mod sync_io;

#[cfg(feature = "async")]
mod async_io;

pub use dispatch::MultiHasher;
pub use ed2k::{ED2K_BLOCK_LEN, Ed2kHasher};
pub use error::EngineError;
pub use progress::{PROGRESS_READ_INTERVAL, ProgressAction, ProgressUpdate};
pub use request::{AlgorithmSet, HashOutput, HashRequest, RESULT_LEN};
pub use sync_io::{DEFAULT_CHUNK_LEN, DEFAULT_MAX_IN_FLIGHT, FileHasher};
