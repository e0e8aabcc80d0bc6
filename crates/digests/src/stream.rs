//! Generic block-buffering driver shared by the MD4-family digests.

/// Bytes per compression block for every digest in the MD4 lineage.
pub(crate) const BLOCK_LEN: usize = 64;

/// Offset of the eight-byte length trailer inside the final block.
const TRAILER_OFFSET: usize = BLOCK_LEN - 8;

/// A compression function folding 64-byte blocks into a fixed chaining state.
///
/// [`Streaming`] supplies the buffering, length tracking and padding;
/// implementations describe only the block transform and how the trailer
/// encodes the message length.
pub(crate) trait BlockCompressor {
    /// Chaining state carried between blocks.
    type State: Copy;
    /// Finished digest bytes.
    type Output;

    /// Chaining state for the empty message.
    fn fresh() -> Self::State;

    /// Folds one block into `state`.
    fn compress(state: &mut Self::State, block: &[u8; BLOCK_LEN]);

    /// Encodes the message length in bits into the final block's trailer.
    fn write_length(trailer: &mut [u8; 8], bits: u64);

    /// Reads the digest out of the final chaining state.
    fn emit(state: &Self::State) -> Self::Output;
}

/// Incremental driver around a [`BlockCompressor`].
///
/// Holds at most one partial block between calls; `buffered` stays strictly
/// below [`BLOCK_LEN`].
pub(crate) struct Streaming<C: BlockCompressor> {
    state: C::State,
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
    length: u64,
}

impl<C: BlockCompressor> Clone for Streaming<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            buffer: self.buffer,
            buffered: self.buffered,
            length: self.length,
        }
    }
}

impl<C: BlockCompressor> Streaming<C> {
    pub(crate) fn new() -> Self {
        Self {
            state: C::fresh(),
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            length: 0,
        }
    }

    pub(crate) fn update(&mut self, mut data: &[u8]) {
        self.length = self.length.wrapping_add(data.len() as u64);

        if self.buffered > 0 {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered < BLOCK_LEN {
                return;
            }
            C::compress(&mut self.state, &self.buffer);
            self.buffered = 0;
        }

        let (blocks, tail) = data.as_chunks::<BLOCK_LEN>();
        for block in blocks {
            C::compress(&mut self.state, block);
        }
        self.buffer[..tail.len()].copy_from_slice(tail);
        self.buffered = tail.len();
    }

    pub(crate) fn finalize(mut self) -> C::Output {
        let bits = self.length.wrapping_mul(8);

        self.buffer[self.buffered] = 0x80;
        self.buffered += 1;
        if self.buffered > TRAILER_OFFSET {
            self.buffer[self.buffered..].fill(0);
            C::compress(&mut self.state, &self.buffer);
            self.buffered = 0;
        }
        self.buffer[self.buffered..TRAILER_OFFSET].fill(0);

        let mut trailer = [0_u8; 8];
        C::write_length(&mut trailer, bits);
        self.buffer[TRAILER_OFFSET..].copy_from_slice(&trailer);
        C::compress(&mut self.state, &self.buffer);

        C::emit(&self.state)
    }
}
