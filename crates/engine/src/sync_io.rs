//! crates/engine/src/sync_io.rs
//!
//! Blocking single-threaded read pipeline and the pipeline configuration
//! shared with the overlapped variant.

use std::fs::File;
use std::io::{self, Read};

use tracing::{debug, trace};

use crate::dispatch::MultiHasher;
use crate::ed2k::ED2K_BLOCK_LEN;
use crate::error::EngineError;
use crate::progress::{PROGRESS_READ_INTERVAL, ProgressAction, ProgressGate, ProgressUpdate};
use crate::request::{HashOutput, HashRequest};

/// Default bytes per read (one tenth of an ed2k block).
pub const DEFAULT_CHUNK_LEN: usize = (ED2K_BLOCK_LEN / 10) as usize;

/// Default bound on concurrently issued reads in the overlapped pipeline.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

/// Configurable file hashing pipelines.
///
/// Digest results never depend on the tunables here; they only shape I/O
/// behaviour and progress cadence.
#[derive(Debug, Clone)]
pub struct FileHasher {
    pub(crate) chunk_len: usize,
    pub(crate) max_in_flight: usize,
    pub(crate) progress_interval: u64,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHasher {
    /// Creates a hasher with the default pipeline settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunk_len: DEFAULT_CHUNK_LEN,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            progress_interval: PROGRESS_READ_INTERVAL,
        }
    }

    /// Sets the bytes requested per read.
    #[must_use]
    pub fn with_chunk_len(mut self, len: usize) -> Self {
        self.chunk_len = len.max(1);
        self
    }

    /// Sets the bound on concurrently issued reads in the overlapped
    /// pipeline.
    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    /// Sets how many retired reads separate progress callbacks.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Hashes `request.path` with a blocking sequential read loop.
    ///
    /// # Errors
    ///
    /// Returns the open, metadata, allocation and read failures described
    /// on [`EngineError`].
    pub fn hash_file(&self, request: &HashRequest) -> Result<HashOutput, EngineError> {
        self.hash_file_with_progress(request, |_| ProgressAction::Continue)
    }

    /// Hashes `request.path`, reporting progress on the retired-read
    /// cadence.
    ///
    /// The callback fires before the reported read's bytes are hashed;
    /// returning [`ProgressAction::Cancel`] abandons the operation without
    /// dispatching them. One final report fires after the stream drains
    /// and its verdict is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] when the callback cancels, plus
    /// the failures listed for [`Self::hash_file`].
    pub fn hash_file_with_progress<F>(
        &self,
        request: &HashRequest,
        progress: F,
    ) -> Result<HashOutput, EngineError>
    where
        F: FnMut(&ProgressUpdate) -> ProgressAction,
    {
        if request.algorithms.is_empty() {
            return Err(EngineError::NothingSelected);
        }

        let (mut file, total_bytes) = open_for_hashing(request)?;
        debug!(path = %request.path.display(), total_bytes, "hashing file");

        let mut hasher = MultiHasher::new(request.algorithms, total_bytes)?;
        let mut gate = ProgressGate::new(progress, self.progress_interval);
        let mut buffer = new_chunk_buffer(self.chunk_len)?;
        let mut bytes_hashed = 0_u64;

        loop {
            let count = match file.read(&mut buffer) {
                Ok(count) => count,
                Err(source) if source.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(EngineError::Read {
                        path: request.path.clone(),
                        offset: bytes_hashed,
                        source,
                    });
                }
            };
            if count == 0 {
                break;
            }

            let update = ProgressUpdate {
                tag: request.tag,
                bytes_hashed,
                total_bytes,
            };
            if gate.on_read_retired(&update) == ProgressAction::Cancel {
                debug!(path = %request.path.display(), bytes_hashed, "hashing cancelled");
                return Err(EngineError::Cancelled);
            }

            hasher.update(&buffer[..count]);
            bytes_hashed += count as u64;
            trace!(count, bytes_hashed, "chunk hashed");
        }

        gate.on_complete(&ProgressUpdate {
            tag: request.tag,
            bytes_hashed,
            total_bytes,
        });

        debug!(path = %request.path.display(), bytes_hashed, "hashing complete");
        Ok(hasher.finalize())
    }
}

/// Opens the request path and rejects directories.
pub(crate) fn open_for_hashing(request: &HashRequest) -> Result<(File, u64), EngineError> {
    let file = File::open(&request.path)
        .map_err(|source| EngineError::open(&request.path, source))?;
    let metadata = file
        .metadata()
        .map_err(|source| EngineError::open(&request.path, source))?;
    if metadata.is_dir() {
        return Err(EngineError::IsDirectory {
            path: request.path.clone(),
        });
    }
    Ok((file, metadata.len()))
}

/// Reserves a zeroed read buffer, surfacing reservation failure.
pub(crate) fn new_chunk_buffer(chunk_len: usize) -> Result<Vec<u8>, EngineError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(chunk_len)
        .map_err(|source| EngineError::Allocation {
            bytes: chunk_len,
            source,
        })?;
    buffer.resize(chunk_len, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AlgorithmSet;

    use std::io::Write as _;

    use digests::{Crc32, Md4, Md5, Sha1};
    use tempfile::NamedTempFile;

    fn fixture(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents).expect("write fixture");
        file.flush().expect("flush fixture");
        file
    }

    #[test]
    fn known_file_matches_one_shot_digests() {
        let data: Vec<u8> = (0..250_000).map(|i| (i % 239) as u8).collect();
        let file = fixture(&data);
        let request = HashRequest::new(1, AlgorithmSet::ALL, file.path());

        let output = FileHasher::new()
            .with_chunk_len(64 * 1024)
            .hash_file(&request)
            .expect("hash file");

        assert_eq!(output.crc32(), Some(Crc32::digest(&data)));
        assert_eq!(output.md4(), Some(Md4::digest(&data)));
        assert_eq!(output.md5(), Some(Md5::digest(&data)));
        assert_eq!(output.sha1(), Some(Sha1::digest(&data)));
        assert_eq!(output.ed2k(), Some(Md4::digest(&data)));
    }

    #[test]
    fn zero_byte_file_yields_empty_digests() {
        let file = fixture(b"");
        let request = HashRequest::new(2, AlgorithmSet::ALL, file.path());

        let output = FileHasher::new().hash_file(&request).expect("hash file");

        assert_eq!(output.md5(), Some(Md5::digest(b"")));
        assert_eq!(output.sha1(), Some(Sha1::digest(b"")));
        assert_eq!(output.ed2k(), Some(Md4::digest(b"")));
        assert_eq!(output.crc32(), Some([0; 4]));
    }

    #[test]
    fn missing_file_reports_open_failure() {
        let request = HashRequest::new(3, AlgorithmSet::MD5, "/no/such/fhash-fixture");
        let error = FileHasher::new().hash_file(&request).unwrap_err();
        assert!(matches!(error, EngineError::Open { .. }));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let request = HashRequest::new(4, AlgorithmSet::MD5, dir.path());
        let error = FileHasher::new().hash_file(&request).unwrap_err();
        assert!(matches!(error, EngineError::IsDirectory { .. }));
    }

    #[test]
    fn empty_selection_is_rejected_before_opening() {
        let request = HashRequest::new(5, AlgorithmSet::EMPTY, "/no/such/fhash-fixture");
        let error = FileHasher::new().hash_file(&request).unwrap_err();
        assert!(matches!(error, EngineError::NothingSelected));
    }

    #[test]
    fn consecutive_runs_share_no_state() {
        let first = fixture(b"first input");
        let second = fixture(b"second input");
        let hasher = FileHasher::new();

        let _ = hasher
            .hash_file(&HashRequest::new(8, AlgorithmSet::ALL, first.path()))
            .expect("hash first file");
        let output = hasher
            .hash_file(&HashRequest::new(9, AlgorithmSet::ALL, second.path()))
            .expect("hash second file");

        assert_eq!(output.md5(), Some(Md5::digest(b"second input")));
        assert_eq!(output.ed2k(), Some(Md4::digest(b"second input")));
    }

    #[test]
    fn progress_cadence_reports_first_then_every_interval() {
        let data = vec![0xd1_u8; 25];
        let file = fixture(&data);
        let request = HashRequest::new(42, AlgorithmSet::CRC32, file.path());

        let mut seen = Vec::new();
        let output = FileHasher::new()
            .with_chunk_len(1)
            .hash_file_with_progress(&request, |update| {
                assert_eq!(update.tag, 42);
                assert_eq!(update.total_bytes, 25);
                seen.push(update.bytes_hashed);
                ProgressAction::Continue
            })
            .expect("hash file");

        // Reads 1, 11 and 21 report, then the final drain report.
        assert_eq!(seen, vec![0, 10, 20, 25]);
        assert_eq!(output.crc32(), Some(Crc32::digest(&data)));
    }

    #[test]
    fn cancelling_the_first_callback_hashes_nothing() {
        let file = fixture(&[0xab_u8; 4096]);
        let request = HashRequest::new(6, AlgorithmSet::MD5, file.path());

        let mut calls = 0_u32;
        let error = FileHasher::new()
            .with_chunk_len(512)
            .hash_file_with_progress(&request, |_| {
                calls += 1;
                ProgressAction::Cancel
            })
            .unwrap_err();

        assert!(matches!(error, EngineError::Cancelled));
        assert_eq!(calls, 1);
    }

    #[test]
    fn cancelling_a_later_callback_stops_the_stream() {
        let data = vec![0x3c_u8; 64];
        let file = fixture(&data);
        let request = HashRequest::new(7, AlgorithmSet::SHA1, file.path());

        let mut cancelled_at = None;
        let error = FileHasher::new()
            .with_chunk_len(1)
            .with_progress_interval(10)
            .hash_file_with_progress(&request, |update| {
                if update.bytes_hashed >= 20 {
                    cancelled_at = Some(update.bytes_hashed);
                    ProgressAction::Cancel
                } else {
                    ProgressAction::Continue
                }
            })
            .unwrap_err();

        assert!(matches!(error, EngineError::Cancelled));
        assert_eq!(cancelled_at, Some(20));
    }
}
