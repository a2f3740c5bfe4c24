//! Maps keys to a primary bucket and a fingerprint, and fingerprints to their alternate bucket.

use crate::djb2::djb2;
use crate::{Key, Tag};

/// The MurmurHash2 multiplier. The alternate bucket is `index ^ hash(tag)`, with this constant
/// standing in for `hash`, as in the reference C++ implementation.
const ALT_MIX: u32 = 0x5bd1_e995;

/// Computes bucket indices and fingerprints for a table of `num_buckets` buckets.
///
/// `num_buckets` is a power of two, so the modulo reductions are masks and
/// `alt_index(alt_index(i, tag), tag) == i` for every `i < num_buckets`.
#[derive(Debug, Clone, Copy)]
pub struct HashIndexer {
    mask: u32,
}

impl HashIndexer {
    pub const fn new(num_buckets: u32) -> Self {
        debug_assert!(num_buckets.is_power_of_two());
        Self {
            mask: num_buckets - 1,
        }
    }

    /// Hash of `key`; see [`djb2`].
    #[inline]
    pub fn hash(key: Key) -> u32 {
        djb2(key)
    }

    /// Returns `(index, tag)`: the bucket from the hash's upper 24 bits, the fingerprint from its
    /// low byte.
    ///
    /// A fingerprint of 0 would be indistinguishable from an empty slot, so it is stored as 1.
    #[inline]
    pub fn index_and_tag(&self, key: Key) -> (u32, Tag) {
        let hash = Self::hash(key);
        let tag = (hash & 0xff) as Tag;
        ((hash >> 8) & self.mask, tag.max(1))
    }

    #[inline]
    pub const fn alt_index(&self, index: u32, tag: Tag) -> u32 {
        (index ^ (tag as u32).wrapping_mul(ALT_MIX)) & self.mask
    }
}
