//! crates/engine/src/request.rs
//!
//! Request and result value objects shared by the read pipelines.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

/// Byte length of the packed result layout.
pub const RESULT_LEN: usize = 72;

/// Bit set selecting which digests a request computes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorithmSet(u8);

impl AlgorithmSet {
    /// No algorithms. Requests built from this set are rejected.
    pub const EMPTY: Self = Self(0);
    /// CRC32 checksum.
    pub const CRC32: Self = Self(0x01);
    /// Composite ed2k block hash.
    pub const ED2K: Self = Self(0x02);
    /// MD4 digest.
    pub const MD4: Self = Self(0x04);
    /// MD5 digest.
    pub const MD5: Self = Self(0x08);
    /// SHA-1 digest.
    pub const SHA1: Self = Self(0x10);
    /// Every supported digest.
    pub const ALL: Self = Self(0x1f);

    /// Returns true when no algorithm is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true when every algorithm in `other` is selected.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of `self` and `other`.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for AlgorithmSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for AlgorithmSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.with(rhs);
    }
}

impl fmt::Debug for AlgorithmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(AlgorithmSet, &str); 5] = [
            (AlgorithmSet::CRC32, "CRC32"),
            (AlgorithmSet::ED2K, "ED2K"),
            (AlgorithmSet::MD4, "MD4"),
            (AlgorithmSet::MD5, "MD5"),
            (AlgorithmSet::SHA1, "SHA1"),
        ];

        f.write_str("AlgorithmSet(")?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        f.write_str(")")
    }
}

/// A single file hashing request.
#[derive(Debug, Clone)]
pub struct HashRequest {
    /// Opaque caller identifier echoed in progress updates.
    pub tag: u64,
    /// Digests to compute.
    pub algorithms: AlgorithmSet,
    /// File to hash.
    pub path: PathBuf,
}

impl HashRequest {
    /// Creates a request for `path`.
    pub fn new(tag: u64, algorithms: AlgorithmSet, path: impl Into<PathBuf>) -> Self {
        Self {
            tag,
            algorithms,
            path: path.into(),
        }
    }
}

/// Digest slots filled by a fully successful hashing run.
///
/// Slots for unselected algorithms stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashOutput {
    pub(crate) crc32: Option<[u8; 4]>,
    pub(crate) md4: Option<[u8; 16]>,
    pub(crate) md5: Option<[u8; 16]>,
    pub(crate) sha1: Option<[u8; 20]>,
    pub(crate) ed2k: Option<[u8; 16]>,
}

impl HashOutput {
    /// The CRC32 checksum, when selected.
    #[must_use]
    pub const fn crc32(&self) -> Option<[u8; 4]> {
        self.crc32
    }

    /// The MD4 digest, when selected.
    #[must_use]
    pub const fn md4(&self) -> Option<[u8; 16]> {
        self.md4
    }

    /// The MD5 digest, when selected.
    #[must_use]
    pub const fn md5(&self) -> Option<[u8; 16]> {
        self.md5
    }

    /// The SHA-1 digest, when selected.
    #[must_use]
    pub const fn sha1(&self) -> Option<[u8; 20]> {
        self.sha1
    }

    /// The composite ed2k hash, when selected.
    #[must_use]
    pub const fn ed2k(&self) -> Option<[u8; 16]> {
        self.ed2k
    }

    /// Packs the digests into the fixed 72-byte layout.
    ///
    /// CRC32 at offset 0, MD4 at 4, MD5 at 20, SHA-1 at 36 and ed2k at 56.
    /// Unselected slots are zero. The layout is a stable contract for
    /// callers that persist raw results.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RESULT_LEN] {
        let mut bytes = [0_u8; RESULT_LEN];
        if let Some(crc32) = self.crc32 {
            bytes[0..4].copy_from_slice(&crc32);
        }
        if let Some(md4) = self.md4 {
            bytes[4..20].copy_from_slice(&md4);
        }
        if let Some(md5) = self.md5 {
            bytes[20..36].copy_from_slice(&md5);
        }
        if let Some(sha1) = self.sha1 {
            bytes[36..56].copy_from_slice(&sha1);
        }
        if let Some(ed2k) = self.ed2k {
            bytes[56..72].copy_from_slice(&ed2k);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_set_bit_operations() {
        let set = AlgorithmSet::CRC32 | AlgorithmSet::SHA1;
        assert!(set.contains(AlgorithmSet::CRC32));
        assert!(set.contains(AlgorithmSet::SHA1));
        assert!(!set.contains(AlgorithmSet::MD4));
        assert!(!set.is_empty());

        let mut grown = AlgorithmSet::EMPTY;
        assert!(grown.is_empty());
        grown |= AlgorithmSet::MD5;
        assert!(grown.contains(AlgorithmSet::MD5));

        assert!(AlgorithmSet::ALL.contains(set));
        assert!(!set.contains(AlgorithmSet::ALL));
    }

    #[test]
    fn algorithm_set_debug_lists_names() {
        let set = AlgorithmSet::CRC32 | AlgorithmSet::MD4;
        assert_eq!(format!("{set:?}"), "AlgorithmSet(CRC32|MD4)");
        assert_eq!(format!("{:?}", AlgorithmSet::EMPTY), "AlgorithmSet(none)");
    }

    #[test]
    fn packed_layout_offsets_are_stable() {
        let output = HashOutput {
            crc32: Some([0x11; 4]),
            md4: Some([0x22; 16]),
            md5: Some([0x33; 16]),
            sha1: Some([0x44; 20]),
            ed2k: Some([0x55; 16]),
        };
        let bytes = output.to_bytes();

        assert_eq!(&bytes[0..4], &[0x11; 4]);
        assert_eq!(&bytes[4..20], &[0x22; 16]);
        assert_eq!(&bytes[20..36], &[0x33; 16]);
        assert_eq!(&bytes[36..56], &[0x44; 20]);
        assert_eq!(&bytes[56..72], &[0x55; 16]);
    }

    #[test]
    fn packed_layout_zero_fills_unselected_slots() {
        let output = HashOutput {
            md5: Some([0xab; 16]),
            ..HashOutput::default()
        };
        let bytes = output.to_bytes();

        assert_eq!(&bytes[0..20], &[0; 20]);
        assert_eq!(&bytes[20..36], &[0xab; 16]);
        assert_eq!(&bytes[36..72], &[0; 36]);
    }
}
