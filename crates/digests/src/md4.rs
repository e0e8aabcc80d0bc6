use std::fmt;

use crate::stream::{BLOCK_LEN, BlockCompressor, Streaming};

// Message word order and per-step rotations for rounds two and three;
// round one walks the words in block order.
const ROUND2_ORDER: [usize; 16] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];
const ROUND3_ORDER: [usize; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];
const ROUND1_SHIFTS: [u32; 4] = [3, 7, 11, 19];
const ROUND2_SHIFTS: [u32; 4] = [3, 5, 9, 13];
const ROUND3_SHIFTS: [u32; 4] = [3, 9, 11, 15];

#[derive(Clone, Copy)]
struct Md4Core;

impl BlockCompressor for Md4Core {
    type State = [u32; 4];
    type Output = [u8; 16];

    fn fresh() -> Self::State {
        [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476]
    }

    fn compress(state: &mut Self::State, block: &[u8; BLOCK_LEN]) {
        let mut words = [0_u32; 16];
        for (word, bytes) in words.iter_mut().zip(block.as_chunks::<4>().0) {
            *word = u32::from_le_bytes(*bytes);
        }

        let [mut a, mut b, mut c, mut d] = *state;

        for i in 0..16 {
            a = a
                .wrapping_add((b & c) | (!b & d))
                .wrapping_add(words[i])
                .rotate_left(ROUND1_SHIFTS[i % 4]);
            (a, b, c, d) = (d, a, b, c);
        }

        for i in 0..16 {
            a = a
                .wrapping_add((b & c) | (b & d) | (c & d))
                .wrapping_add(words[ROUND2_ORDER[i]])
                .wrapping_add(0x5a82_7999)
                .rotate_left(ROUND2_SHIFTS[i % 4]);
            (a, b, c, d) = (d, a, b, c);
        }

        for i in 0..16 {
            a = a
                .wrapping_add(b ^ c ^ d)
                .wrapping_add(words[ROUND3_ORDER[i]])
                .wrapping_add(0x6ed9_eba1)
                .rotate_left(ROUND3_SHIFTS[i % 4]);
            (a, b, c, d) = (d, a, b, c);
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
    }

    fn write_length(trailer: &mut [u8; 8], bits: u64) {
        trailer.copy_from_slice(&bits.to_le_bytes());
    }

    fn emit(state: &Self::State) -> Self::Output {
        let mut digest = [0_u8; 16];
        for (bytes, word) in digest.as_chunks_mut::<4>().0.iter_mut().zip(state) {
            *bytes = word.to_le_bytes();
        }
        digest
    }
}

/// Streaming MD4 hasher (RFC 1320).
#[derive(Clone)]
pub struct Md4 {
    inner: Streaming<Md4Core>,
}

impl fmt::Debug for Md4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md4").finish_non_exhaustive()
    }
}

impl Default for Md4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Md4 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Streaming::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the 128-bit MD4 output.
    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        self.inner.finalize()
    }

    /// Computes the MD4 digest of `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 16] {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}
