// Reflected IEEE 802.3 polynomial.
const POLYNOMIAL: u32 = 0xedb8_8320;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut index = 0;
    while index < 256 {
        let mut value = index as u32;
        let mut bit = 0;
        while bit < 8 {
            value = if value & 1 == 1 {
                (value >> 1) ^ POLYNOMIAL
            } else {
                value >> 1
            };
            bit += 1;
        }
        table[index] = value;
        index += 1;
    }
    table
}

/// Streaming CRC32 checksum (IEEE 802.3, reflected form).
///
/// The finalised bytes are big-endian, so their hex rendering matches the
/// conventional CRC32 display value.
#[derive(Clone, Debug)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    /// Creates a checksum with an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: 0xffff_ffff,
        }
    }

    /// Feeds additional bytes into the checksum state.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let index = ((self.state ^ u32::from(byte)) & 0xff) as usize;
            self.state = (self.state >> 8) ^ TABLE[index];
        }
    }

    /// Finalises the checksum and returns the 32-bit output.
    #[must_use]
    pub const fn finalize(self) -> [u8; 4] {
        (!self.state).to_be_bytes()
    }

    /// Computes the CRC32 checksum of `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 4] {
        let mut checksum = Self::new();
        checksum.update(data);
        checksum.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        use std::fmt::Write as _;

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    #[test]
    fn crc32_streaming_matches_known_values() {
        let vectors = [
            (b"".as_slice(), "00000000"),
            (b"a".as_slice(), "e8b7be43"),
            (b"123456789".as_slice(), "cbf43926"),
            (
                b"The quick brown fox jumps over the lazy dog".as_slice(),
                "414fa339",
            ),
        ];

        for (input, expected_hex) in vectors {
            let mut checksum = Crc32::new();
            let mid = input.len() / 2;
            checksum.update(&input[..mid]);
            checksum.update(&input[mid..]);
            assert_eq!(to_hex(&checksum.finalize()), expected_hex);

            assert_eq!(to_hex(&Crc32::digest(input)), expected_hex);
        }
    }
}
