//! crates/engine/src/dispatch.rs
//!
//! Fan-out of one byte stream into every selected digest state.

use digests::{Crc32, Md4, Md5, Sha1};

use crate::ed2k::Ed2kHasher;
use crate::error::EngineError;
use crate::request::{AlgorithmSet, HashOutput};

/// Feeds a single pass over the file bytes to every selected digest.
///
/// Bytes reach each enabled consumer in stream order, exactly once; the
/// read pipelines never hash the same range twice.
#[derive(Debug)]
pub struct MultiHasher {
    crc32: Option<Crc32>,
    md4: Option<Md4>,
    md5: Option<Md5>,
    sha1: Option<Sha1>,
    ed2k: Option<Ed2kHasher>,
}

impl MultiHasher {
    /// Creates digest states for every algorithm in `algorithms`.
    ///
    /// `total_len` sizes the ed2k block table when the composite hash is
    /// selected; the other digests ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NothingSelected`] for an empty set and
    /// [`EngineError::Allocation`] when the ed2k table cannot be
    /// reserved.
    pub fn new(algorithms: AlgorithmSet, total_len: u64) -> Result<Self, EngineError> {
        if algorithms.is_empty() {
            return Err(EngineError::NothingSelected);
        }
        Ok(Self {
            crc32: algorithms.contains(AlgorithmSet::CRC32).then(Crc32::new),
            md4: algorithms.contains(AlgorithmSet::MD4).then(Md4::new),
            md5: algorithms.contains(AlgorithmSet::MD5).then(Md5::new),
            sha1: algorithms.contains(AlgorithmSet::SHA1).then(Sha1::new),
            ed2k: if algorithms.contains(AlgorithmSet::ED2K) {
                Some(Ed2kHasher::new(total_len)?)
            } else {
                None
            },
        })
    }

    /// Feeds `data` to every selected digest.
    pub fn update(&mut self, data: &[u8]) {
        if let Some(crc32) = &mut self.crc32 {
            crc32.update(data);
        }
        if let Some(md4) = &mut self.md4 {
            md4.update(data);
        }
        if let Some(md5) = &mut self.md5 {
            md5.update(data);
        }
        if let Some(sha1) = &mut self.sha1 {
            sha1.update(data);
        }
        if let Some(ed2k) = &mut self.ed2k {
            ed2k.update(data);
        }
    }

    /// Finalises every selected digest into its output slot.
    #[must_use]
    pub fn finalize(self) -> HashOutput {
        let mut output = HashOutput::default();
        if let Some(crc32) = self.crc32 {
            output.crc32 = Some(crc32.finalize());
        }
        if let Some(md4) = self.md4 {
            output.md4 = Some(md4.finalize());
        }
        if let Some(md5) = self.md5 {
            output.md5 = Some(md5.finalize());
        }
        if let Some(sha1) = self.sha1 {
            output.sha1 = Some(sha1.finalize());
        }
        if let Some(ed2k) = self.ed2k {
            output.ed2k = Some(ed2k.finalize());
        }
        output
    }
}
