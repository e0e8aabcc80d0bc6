//! crates/engine/src/ed2k.rs
//!
//! Composite block hash for ed2k-style file identification.

use digests::Md4;

use crate::error::EngineError;

/// Bytes per ed2k block.
pub const ED2K_BLOCK_LEN: u64 = 9_728_000;

/// Streaming composite block hash.
///
/// The stream is cut into [`ED2K_BLOCK_LEN`]-byte blocks and each block is
/// digested with MD4. Streams of at most one block are identified by that
/// block's own digest; longer streams by the MD4 of the concatenated
/// per-block digests. An exact multiple of the block length contributes no
/// trailing empty block.
#[derive(Debug, Clone)]
pub struct Ed2kHasher {
    block_digests: Vec<[u8; 16]>,
    current: Md4,
    current_len: u64,
    total_hashed: u64,
}

impl Ed2kHasher {
    /// Creates a hasher for a stream declared as `total_len` bytes.
    ///
    /// The declared length sizes the block digest table up front. The
    /// stream may still deliver a different byte count (the file changed
    /// underneath the reader); the digest always reflects the bytes
    /// actually hashed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] when the table reservation
    /// fails.
    pub fn new(total_len: u64) -> Result<Self, EngineError> {
        let blocks = total_len.div_ceil(ED2K_BLOCK_LEN).max(1);
        let mut block_digests: Vec<[u8; 16]> = Vec::new();
        if blocks > 1 {
            let entries = usize::try_from(blocks).unwrap_or(usize::MAX);
            block_digests
                .try_reserve_exact(entries)
                .map_err(|source| EngineError::Allocation {
                    bytes: entries.saturating_mul(16),
                    source,
                })?;
        }
        Ok(Self {
            block_digests,
            current: Md4::new(),
            current_len: 0,
            total_hashed: 0,
        })
    }

    /// Feeds additional bytes, rotating to a fresh block digest each time
    /// exactly [`ED2K_BLOCK_LEN`] bytes have entered the current one.
    ///
    /// Rotation is driven by byte counts, so results are independent of
    /// how the caller chunks the stream.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let remaining = ED2K_BLOCK_LEN - self.current_len;
            let take = remaining.min(data.len() as u64) as usize;
            let (chunk, rest) = data.split_at(take);

            self.current.update(chunk);
            self.current_len += take as u64;
            self.total_hashed += take as u64;
            data = rest;

            if self.current_len == ED2K_BLOCK_LEN {
                let finished = std::mem::replace(&mut self.current, Md4::new());
                self.block_digests.push(finished.finalize());
                self.current_len = 0;
            }
        }
    }

    /// Total bytes fed so far.
    #[must_use]
    pub const fn bytes_hashed(&self) -> u64 {
        self.total_hashed
    }

    /// Finalises the composite digest.
    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        let Self {
            mut block_digests,
            current,
            current_len,
            ..
        } = self;

        if current_len > 0 || block_digests.is_empty() {
            block_digests.push(current.finalize());
        }
        if let [single] = block_digests.as_slice() {
            return *single;
        }

        let mut outer = Md4::new();
        for digest in &block_digests {
            outer.update(digest);
        }
        outer.finalize()
    }
}
