//! crates/engine/src/async_io.rs
//!
//! Overlapped read pipeline: a bounded window of positioned reads retired
//! strictly in offset order.
//!
//! I/O runs on `spawn_blocking` tasks while every digest state stays on
//! the calling task, so nothing is shared and nothing is locked.
//! Completions may land out of order inside the window; retirement order
//! is fixed by consuming the join handles in issue order.

use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::sync::Arc;

use tokio::task::{self, JoinHandle};
use tracing::{debug, trace};

use crate::dispatch::MultiHasher;
use crate::error::EngineError;
use crate::progress::{ProgressAction, ProgressGate, ProgressUpdate};
use crate::request::{HashOutput, HashRequest};
use crate::sync_io::{FileHasher, new_chunk_buffer, open_for_hashing};

type ReadHandle = JoinHandle<io::Result<(Vec<u8>, usize)>>;

impl FileHasher {
    /// Hashes `request.path` with overlapped positioned reads.
    ///
    /// # Errors
    ///
    /// Returns the failures listed for [`Self::hash_file`], plus
    /// [`EngineError::Join`] when a read task cannot be joined.
    #[cfg_attr(docsrs, doc(cfg(feature = "async")))]
    pub async fn hash_file_async(&self, request: &HashRequest) -> Result<HashOutput, EngineError> {
        self.hash_file_async_with_progress(request, |_| ProgressAction::Continue)
            .await
    }

    /// Overlapped variant of [`Self::hash_file_with_progress`].
    ///
    /// Up to `max_in_flight` reads are in flight against disjoint,
    /// increasing offsets; each retired buffer is reissued for the next
    /// uncovered offset until the declared length is reached. The progress
    /// cadence and cancellation behave exactly like the blocking pipeline.
    /// On early return the reads still in flight are left to finish on the
    /// blocking pool and their buffers are discarded.
    ///
    /// # Errors
    ///
    /// As [`Self::hash_file_async`], plus [`EngineError::Cancelled`] when
    /// the callback cancels.
    #[cfg_attr(docsrs, doc(cfg(feature = "async")))]
    pub async fn hash_file_async_with_progress<F>(
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

        let (file, total_bytes) = open_for_hashing(request)?;
        let file = Arc::new(file);
        debug!(path = %request.path.display(), total_bytes, "hashing file (overlapped)");

        let mut hasher = MultiHasher::new(request.algorithms, total_bytes)?;
        let mut gate = ProgressGate::new(progress, self.progress_interval);

        let chunk_len = self.chunk_len as u64;
        let mut in_flight: VecDeque<(u64, ReadHandle)> =
            VecDeque::with_capacity(self.max_in_flight);
        let mut next_offset = 0_u64;

        // Prime the window; a zero-length file still gets one read so EOF
        // is observed rather than assumed.
        while in_flight.len() < self.max_in_flight
            && (next_offset < total_bytes || next_offset == 0)
        {
            let buffer = new_chunk_buffer(self.chunk_len)?;
            in_flight.push_back((next_offset, issue_read(&file, buffer, next_offset)));
            next_offset += chunk_len;
        }

        let mut bytes_hashed = 0_u64;

        while let Some((offset, handle)) = in_flight.pop_front() {
            let (buffer, count) = match handle.await? {
                Ok(read) => read,
                Err(source) => {
                    return Err(EngineError::Read {
                        path: request.path.clone(),
                        offset,
                        source,
                    });
                }
            };

            if count == 0 {
                // Observed EOF; everything still queued is past the end.
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
            trace!(offset, count, "read retired");

            // A short read means the file ended before the declared
            // length; later offsets would leave a gap, so stop here.
            let expected = chunk_len.min(total_bytes.saturating_sub(offset));
            if (count as u64) < expected {
                break;
            }

            if next_offset < total_bytes {
                in_flight.push_back((next_offset, issue_read(&file, buffer, next_offset)));
                next_offset += chunk_len;
            }
        }

        gate.on_complete(&ProgressUpdate {
            tag: request.tag,
            bytes_hashed,
            total_bytes,
        });

        debug!(path = %request.path.display(), bytes_hashed, "hashing complete (overlapped)");
        Ok(hasher.finalize())
    }
}

fn issue_read(file: &Arc<File>, mut buffer: Vec<u8>, offset: u64) -> ReadHandle {
    let file = Arc::clone(file);
    task::spawn_blocking(move || loop {
        match positioned_read(&file, &mut buffer, offset) {
            Ok(count) => return Ok((buffer, count)),
            Err(source) if source.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(source),
        }
    })
}

#[cfg(unix)]
fn positioned_read(file: &File, buffer: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;

    file.read_at(buffer, offset)
}

#[cfg(windows)]
fn positioned_read(file: &File, buffer: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;

    file.seek_read(buffer, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AlgorithmSet;

    use std::io::Write as _;

    use digests::Md5;
    use tempfile::NamedTempFile;

    fn fixture(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents).expect("write fixture");
        file.flush().expect("flush fixture");
        file
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapped_matches_blocking_pipeline() {
        let data: Vec<u8> = (0..1_000_000).map(|i| (i % 249) as u8).collect();
        let file = fixture(&data);
        let request = HashRequest::new(11, AlgorithmSet::ALL, file.path());

        let hasher = FileHasher::new().with_chunk_len(64 * 1024);
        let overlapped = hasher.hash_file_async(&request).await.expect("async hash");
        let blocking = hasher.hash_file(&request).expect("sync hash");

        assert_eq!(overlapped, blocking);
    }

    #[tokio::test]
    async fn retirement_order_feeds_digests_in_stream_order() {
        // Fifty reads through a ten-deep window; any out-of-order dispatch
        // would change the MD5.
        let data: Vec<u8> = (0..50_000).map(|i| (i % 193) as u8).collect();
        let file = fixture(&data);
        let request = HashRequest::new(12, AlgorithmSet::MD5, file.path());

        let output = FileHasher::new()
            .with_chunk_len(1000)
            .with_max_in_flight(10)
            .hash_file_async(&request)
            .await
            .expect("async hash");

        assert_eq!(output.md5(), Some(Md5::digest(&data)));
    }

    #[tokio::test]
    async fn window_of_one_still_drains_the_file() {
        let data = vec![0x42_u8; 10_000];
        let file = fixture(&data);
        let request = HashRequest::new(13, AlgorithmSet::MD5, file.path());

        let output = FileHasher::new()
            .with_chunk_len(4096)
            .with_max_in_flight(1)
            .hash_file_async(&request)
            .await
            .expect("async hash");

        assert_eq!(output.md5(), Some(Md5::digest(&data)));
    }

    #[tokio::test]
    async fn zero_byte_file_yields_empty_digests() {
        let file = fixture(b"");
        let request = HashRequest::new(14, AlgorithmSet::MD5, file.path());

        let output = FileHasher::new()
            .hash_file_async(&request)
            .await
            .expect("async hash");

        assert_eq!(output.md5(), Some(Md5::digest(b"")));
    }

    #[tokio::test]
    async fn missing_file_reports_open_failure() {
        let request = HashRequest::new(15, AlgorithmSet::MD5, "/no/such/fhash-fixture");
        let error = FileHasher::new()
            .hash_file_async(&request)
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::Open { .. }));
    }

    #[tokio::test]
    async fn shrinking_file_ends_at_observed_eof() {
        let chunk = 1000_usize;
        let data = vec![0x6b_u8; 10 * chunk];
        let file = fixture(&data);
        let request = HashRequest::new(18, AlgorithmSet::MD5, file.path());

        // Window of one, so no other read is in flight while the callback
        // runs; truncating here guarantees later offsets see the new length.
        let output = FileHasher::new()
            .with_chunk_len(chunk)
            .with_max_in_flight(1)
            .hash_file_async_with_progress(&request, |update| {
                if update.bytes_hashed == 0 {
                    file.as_file().set_len(3_000).expect("truncate fixture");
                }
                ProgressAction::Continue
            })
            .await
            .expect("async hash");

        assert_eq!(output.md5(), Some(Md5::digest(&data[..3_000])));
    }

    #[tokio::test]
    async fn cancellation_propagates_from_the_callback() {
        let data = vec![0x9e_u8; 40_000];
        let file = fixture(&data);
        let request = HashRequest::new(16, AlgorithmSet::SHA1, file.path());

        let mut calls = 0_u32;
        let error = FileHasher::new()
            .with_chunk_len(1024)
            .hash_file_async_with_progress(&request, |_| {
                calls += 1;
                if calls == 2 {
                    ProgressAction::Cancel
                } else {
                    ProgressAction::Continue
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(error, EngineError::Cancelled));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn progress_cadence_matches_the_blocking_pipeline() {
        let data = vec![0x77_u8; 25_000];
        let file = fixture(&data);
        let request = HashRequest::new(17, AlgorithmSet::CRC32, file.path());

        let mut seen = Vec::new();
        FileHasher::new()
            .with_chunk_len(1000)
            .hash_file_async_with_progress(&request, |update| {
                seen.push(update.bytes_hashed);
                ProgressAction::Continue
            })
            .await
            .expect("async hash");

        assert_eq!(seen, vec![0, 10_000, 20_000, 25_000]);
    }
}
