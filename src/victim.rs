//! The one-entry overflow for a fingerprint the relocation loop could not seat.

use crate::Tag;

/// A fingerprint that could not be re-seated before the relocation budget ran out, along with
/// one of its two candidate buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    pub index: u32,
    pub tag: Tag,
}

/// Holds at most one [`Victim`]. While it is occupied the filter refuses new insertions.
#[derive(Debug, Clone, Default)]
pub struct VictimCache {
    slot: Option<Victim>,
}

impl VictimCache {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    #[inline]
    pub const fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    pub fn store(&mut self, index: u32, tag: Tag) {
        debug_assert!(self.slot.is_none(), "victim cache overwritten");
        self.slot = Some(Victim { index, tag });
    }

    /// Empties the cache, handing back whatever it held.
    pub fn clear(&mut self) -> Option<Victim> {
        self.slot.take()
    }

    /// Returns `true` if the victim has fingerprint `tag` and sits in bucket `i1` or `i2`.
    #[inline]
    pub fn matches(&self, i1: u32, i2: u32, tag: Tag) -> bool {
        matches!(self.slot, Some(v) if v.tag == tag && (v.index == i1 || v.index == i2))
    }
}
