//! Bucket storage: each bucket is four 8-bit tag slots packed into one `u32`.

use crate::splitmix64::SplitMix64;
use crate::{Tag, ASSOCIATIVITY};
use alloc::{boxed::Box, vec};
use core::fmt;

const BITS_PER_TAG: u32 = 8;
const TAG_MASK: u32 = (1 << BITS_PER_TAG) - 1;

/// The slot value marking "no tag here".
const EMPTY: Tag = 0;

/// Outcome of placing a tag into a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The tag went into a free slot.
    Placed,
    /// The bucket was full; the tag took the slot of the returned tag, which now needs a home.
    Evicted(Tag),
    /// The bucket was full and eviction was not allowed.
    NoFreeSlot,
}

#[inline]
const fn shift(slot: usize) -> u32 {
    BITS_PER_TAG * slot as u32
}

/// A fixed number of buckets of [`ASSOCIATIVITY`] tag slots each.
#[derive(Debug, Clone)]
pub struct BucketTable {
    buckets: Box<[u32]>,
}

impl BucketTable {
    pub fn new(num_buckets: u32) -> Self {
        Self {
            buckets: vec![0u32; num_buckets as usize].into_boxed_slice(),
        }
    }

    #[inline]
    fn read_tag(&self, i: u32, slot: usize) -> Tag {
        ((self.buckets[i as usize] >> shift(slot)) & TAG_MASK) as Tag
    }

    #[inline]
    fn write_tag(&mut self, i: u32, slot: usize, tag: Tag) {
        let word = &mut self.buckets[i as usize];
        *word = (*word & !(TAG_MASK << shift(slot))) | ((tag as u32) << shift(slot));
    }

    /// Puts `tag` into the first free slot of bucket `i`. If there is none and `kickout` is set,
    /// a random occupant is swapped out for it.
    pub fn insert(&mut self, i: u32, tag: Tag, kickout: bool, rng: &mut SplitMix64) -> Insertion {
        if let Some(slot) = self.find_in_bucket(i, EMPTY) {
            self.write_tag(i, slot, tag);
            return Insertion::Placed;
        }
        if !kickout {
            return Insertion::NoFreeSlot;
        }

        let slot = rng.below(ASSOCIATIVITY);
        let old = self.read_tag(i, slot);
        self.write_tag(i, slot, tag);
        Insertion::Evicted(old)
    }

    /// Returns `true` if `tag` is in bucket `i1` or bucket `i2`.
    pub fn find_in_either(&self, i1: u32, i2: u32, tag: Tag) -> bool {
        (0..ASSOCIATIVITY)
            .any(|slot| self.read_tag(i1, slot) == tag || self.read_tag(i2, slot) == tag)
    }

    /// Returns the first slot of bucket `i` holding `tag`.
    pub fn find_in_bucket(&self, i: u32, tag: Tag) -> Option<usize> {
        (0..ASSOCIATIVITY).find(|&slot| self.read_tag(i, slot) == tag)
    }

    /// Clears the first slot of bucket `i` holding `tag`. Returns whether one was found.
    pub fn delete(&mut self, i: u32, tag: Tag) -> bool {
        match self.find_in_bucket(i, tag) {
            Some(slot) => {
                self.write_tag(i, slot, EMPTY);
                true
            }
            None => false,
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of tag slots.
    pub fn capacity_in_tags(&self) -> usize {
        ASSOCIATIVITY * self.buckets.len()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.buckets.len() * core::mem::size_of::<u32>()
    }
}

impl fmt::Display for BucketTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Packed table with tag size: {} bits", BITS_PER_TAG)?;
        writeln!(f, "\t\tAssociativity: {}", ASSOCIATIVITY)?;
        writeln!(f, "\t\tTotal # of rows: {}", self.num_buckets())?;
        write!(f, "\t\tTotal # slots: {}", self.capacity_in_tags())
    }
}
