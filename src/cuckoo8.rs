//! Implements a cuckoo filter with 8-bit fingerprints and four-way buckets, as described in
//! [Cuckoo Filter: Practically Better Than Bloom].
//!
//! [Cuckoo Filter: Practically Better Than Bloom]: https://www.cs.cmu.edu/~dga/papers/cuckoo-conext2014.pdf

use crate::{
    error::CuckooError,
    indexer::HashIndexer,
    splitmix64::SplitMix64,
    table::{BucketTable, Insertion},
    victim::{Victim, VictimCache},
    Filter, Key, Tag, ASSOCIATIVITY, MAX_BUCKETS, MAX_KICKS,
};
use core::fmt;
use tracing::{debug, trace};

/// Above this nominal load the bucket count is doubled at construction.
const MAX_LOAD: f64 = 0.96;

/// Smallest power of two at least `max_keys / ASSOCIATIVITY`, doubled if that would be loaded
/// past [`MAX_LOAD`].
fn bucket_count(max_keys: usize) -> Result<u32, CuckooError> {
    let too_many = |buckets| CuckooError::TooManyKeys { max_keys, buckets };

    let mut buckets = (max_keys / ASSOCIATIVITY)
        .max(1)
        .checked_next_power_of_two()
        .ok_or_else(|| too_many(usize::MAX))?;
    if max_keys as f64 / buckets as f64 / ASSOCIATIVITY as f64 > MAX_LOAD {
        buckets = buckets.saturating_mul(2);
    }
    if buckets > MAX_BUCKETS {
        return Err(too_many(buckets));
    }
    Ok(buckets as u32)
}

/// Cuckoo filter over integer keys using 8-bit fingerprints.
///
/// Each key maps to a fingerprint and two candidate buckets of four slots. An insertion that finds
/// its bucket full kicks a random occupant over to that occupant's other bucket, up to
/// [`MAX_KICKS`] times. If the chain of kicks never ends in a free slot, the last homeless
/// fingerprint is parked in a one-entry victim cache; it still answers lookups, but the filter
/// refuses further insertions until a delete makes room.
///
/// A `CuckooFilter` has no false negatives for keys that were added and not since deleted. It can
/// report false positives: two keys sharing a fingerprint and bucket pair are indistinguishable,
/// and deleting one removes "both".
///
/// ```
/// use cuckoof::{CuckooFilter, CuckooError};
///
/// let mut filter = CuckooFilter::new(8, 300)?;
/// for key in [2, 200, 6, 7] {
///     assert!(filter.add(key)?);
/// }
///
/// assert!(filter.contain(200));
/// assert!(!filter.contain(900));
///
/// assert!(filter.delete(200));
/// assert!(!filter.contain(200));
/// assert_eq!(filter.len(), 3);
/// # Ok::<(), CuckooError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CuckooFilter {
    table: BucketTable,
    indexer: HashIndexer,
    victim: VictimCache,
    num_items: usize,
    bits_per_item: u32,
    rng: SplitMix64,
}

impl CuckooFilter {
    /// Creates a filter sized for `max_keys` keys.
    ///
    /// `bits_per_item` is recorded and reported by the status string, but fingerprints are always
    /// stored in 8 bits whatever its value.
    ///
    /// The eviction slot choices are seeded from [`rand::thread_rng`] when the `uniform-random`
    /// feature is enabled, and from a fixed seed otherwise. Use [`CuckooFilter::with_seed`] for
    /// reproducible behavior.
    pub fn new(bits_per_item: u32, max_keys: usize) -> Result<Self, CuckooError> {
        Self::with_rng(bits_per_item, max_keys, SplitMix64::from_entropy())
    }

    /// Creates a filter sized for `max_keys` keys whose eviction choices are determined by `seed`.
    pub fn with_seed(bits_per_item: u32, max_keys: usize, seed: u64) -> Result<Self, CuckooError> {
        Self::with_rng(bits_per_item, max_keys, SplitMix64::new(seed))
    }

    fn with_rng(bits_per_item: u32, max_keys: usize, rng: SplitMix64) -> Result<Self, CuckooError> {
        let num_buckets = bucket_count(max_keys)?;
        debug!(
            max_keys,
            num_buckets,
            slots = num_buckets as usize * ASSOCIATIVITY,
            bits_per_item,
            "created cuckoo filter"
        );

        Ok(Self {
            table: BucketTable::new(num_buckets),
            indexer: HashIndexer::new(num_buckets),
            victim: VictimCache::new(),
            num_items: 0,
            bits_per_item,
            rng,
        })
    }

    /// Adds `key` to the filter.
    ///
    /// Returns `Ok(true)` when every fingerprint found a slot. `Ok(false)` means the key is stored
    /// but some displaced fingerprint ended up in the victim cache: the filter is full and the
    /// next `add` will fail with [`CuckooError::CapacityExceeded`] unless a delete frees room
    /// first.
    pub fn add(&mut self, key: Key) -> Result<bool, CuckooError> {
        if self.victim.is_occupied() {
            trace!(key, "add refused while a victim is outstanding");
            return Err(CuckooError::CapacityExceeded);
        }

        let (index, tag) = self.indexer.index_and_tag(key);
        Ok(self.relocate(index, tag))
    }

    /// Seats `tag` starting at bucket `index`, kicking occupants along to their alternate buckets.
    /// On exhaustion the last homeless fingerprint becomes the victim.
    fn relocate(&mut self, mut index: u32, mut tag: Tag) -> bool {
        for kick in 0..MAX_KICKS {
            // The first attempt only looks for a free slot.
            match self.table.insert(index, tag, kick > 0, &mut self.rng) {
                Insertion::Placed => {
                    self.num_items += 1;
                    return true;
                }
                Insertion::Evicted(old) => {
                    tag = old;
                    index = self.indexer.alt_index(index, tag);
                }
                Insertion::NoFreeSlot => {}
            }
        }

        debug!(index, tag, kicks = MAX_KICKS, "relocation budget exhausted, storing victim");
        self.victim.store(index, tag);
        false
    }

    /// Returns `true` if the filter probably contains `key`.
    ///
    /// There are no false negatives for keys still stored, but keys never added may collide with
    /// stored fingerprints.
    pub fn contain(&self, key: Key) -> bool {
        let (i1, tag) = self.indexer.index_and_tag(key);
        let i2 = self.indexer.alt_index(i1, tag);
        debug_assert_eq!(self.indexer.alt_index(i2, tag), i1);

        self.victim.matches(i1, i2, tag) || self.table.find_in_either(i1, i2, tag)
    }

    /// Removes one copy of `key`'s fingerprint. Returns `false` if none was found.
    ///
    /// A delete that frees a table slot also retries placing any outstanding victim.
    pub fn delete(&mut self, key: Key) -> bool {
        let (i1, tag) = self.indexer.index_and_tag(key);
        let i2 = self.indexer.alt_index(i1, tag);

        if self.victim.matches(i1, i2, tag) {
            self.victim.clear();
            debug!(key, tag, "deleted the victim");
            return true;
        }

        if self.table.delete(i1, tag) || self.table.delete(i2, tag) {
            self.num_items -= 1;
            self.resurrect_victim();
            return true;
        }
        false
    }

    /// Gives the outstanding victim, if any, another run through the relocation loop. That run may
    /// itself end by storing a victim.
    fn resurrect_victim(&mut self) {
        if let Some(Victim { index, tag }) = self.victim.clear() {
            let reseated = self.relocate(index, tag);
            debug!(index, tag, reseated, "resurrected victim");
        }
    }

    /// Fraction of tag slots occupied: `len() / capacity()`. The victim is not counted.
    pub fn load_factor(&self) -> f64 {
        self.num_items as f64 / self.table.capacity_in_tags() as f64
    }

    /// Number of fingerprints stored in the table.
    pub const fn len(&self) -> usize {
        self.num_items
    }

    /// Returns `true` if no fingerprint is stored in the table.
    pub const fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Returns `true` while a victim is outstanding, i.e. while [`CuckooFilter::add`] refuses keys.
    pub const fn is_full(&self) -> bool {
        self.victim.is_occupied()
    }

    /// Total number of tag slots.
    pub fn capacity(&self) -> usize {
        self.table.capacity_in_tags()
    }

    /// Number of buckets in the table.
    pub fn num_buckets(&self) -> usize {
        self.table.num_buckets()
    }

    /// The bits-per-item hint given at construction. Does not affect the 8-bit storage width.
    pub const fn bits_per_item(&self) -> u32 {
        self.bits_per_item
    }

    /// Bytes used by the bucket table.
    pub fn size_in_bytes(&self) -> usize {
        self.table.size_in_bytes()
    }
}

impl Filter<Key> for CuckooFilter {
    fn contains(&self, key: &Key) -> bool {
        self.contain(*key)
    }

    fn insert(&mut self, key: &Key) -> Result<bool, CuckooError> {
        self.add(*key)
    }

    fn remove(&mut self, key: &Key) -> bool {
        self.delete(*key)
    }

    fn len(&self) -> usize {
        self.num_items
    }
}

impl fmt::Display for CuckooFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CuckooFilter Status:")?;
        writeln!(f, "\t\t{}", self.table)?;
        writeln!(f, "\t\tKeys stored: {}", self.num_items)?;
        writeln!(f, "\t\tLoad factor: {}", self.load_factor())?;
        if self.num_items > 0 {
            writeln!(f, "\t\tbit/key:   {}", self.bits_per_item)
        } else {
            writeln!(f, "\t\tbit/key:   N/A")
        }
    }
}

#[cfg(test)]
mod test {
    use super::{bucket_count, CuckooFilter};
    use crate::{CuckooError, Filter, Key, MAX_BUCKETS};

    use proptest::prelude::*;
    use rand::Rng;
    use std::string::ToString;
    use std::vec::Vec;

    fn ipv4(a: u8, b: u8, c: u8, d: u8) -> Key {
        u32::from_be_bytes([a, b, c, d]) as Key
    }

    /// Adds distinct keys until the filter parks a victim. Returns the keys that were added.
    fn fill(filter: &mut CuckooFilter) -> Vec<Key> {
        let mut added = Vec::new();
        for key in 0.. {
            let placed = filter.add(key).unwrap();
            added.push(key);
            if !placed {
                break;
            }
        }
        added
    }

    #[test]
    fn test_bucket_count() {
        assert_eq!(bucket_count(0), Ok(1));
        assert_eq!(bucket_count(3), Ok(1));
        assert_eq!(bucket_count(100), Ok(32));
        assert_eq!(bucket_count(300), Ok(128));
        // 128 / 32 / 4 = 1.0 > 0.96
        assert_eq!(bucket_count(128), Ok(64));
        // 122 / 32 / 4 ~= 0.953
        assert_eq!(bucket_count(122), Ok(32));
        assert_eq!(bucket_count(4 * MAX_BUCKETS / 2), Ok(MAX_BUCKETS as u32));
        assert_eq!(
            bucket_count(4 * MAX_BUCKETS),
            Err(CuckooError::TooManyKeys {
                max_keys: 4 * MAX_BUCKETS,
                buckets: 2 * MAX_BUCKETS
            })
        );
        assert!(bucket_count(usize::MAX).is_err());
    }

    #[test]
    fn test_fixture_regression() {
        let mut filter = CuckooFilter::with_seed(32, 300, 0).unwrap();
        assert_eq!(filter.num_buckets(), 128);
        assert_eq!(filter.capacity(), 512);

        for key in [2, 200, 6, 7] {
            assert_eq!(filter.add(key), Ok(true));
        }
        assert!(filter.contain(200));
        assert!(!filter.contain(900));

        for key in [8, 700] {
            assert_eq!(filter.add(key), Ok(true));
        }
        assert!(filter.contain(8));
        assert!(filter.contain(7));
        assert!(filter.contain(700));
        assert_eq!(filter.load_factor() * 100.0, 1.171875);

        // 2, 6, 7 and 8 already fill 9's bucket, so this one kicks.
        assert_eq!(filter.add(9), Ok(true));
        assert_eq!(filter.load_factor() * 100.0, 1.3671875);
        for key in [2, 200, 6, 7, 8, 700, 9] {
            assert!(filter.contain(key), "lost key {}", key);
        }
    }

    #[test]
    fn test_contains_after_delete() {
        let mut filter = CuckooFilter::new(32, 100).unwrap();
        filter.add(2).unwrap();
        filter.add(200).unwrap();

        assert!(filter.delete(2));
        assert!(!filter.contain(2));
        assert!(filter.contain(200));
        assert!(!filter.delete(2));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_network_addresses() {
        let mut filter = CuckooFilter::new(8, 1000).unwrap();
        let addrs = [
            ipv4(192, 168, 1, 1),
            ipv4(192, 168, 1, 2),
            ipv4(192, 168, 1, 6),
        ];
        assert_eq!(addrs[0], 3_232_235_777);

        for &addr in &addrs {
            assert_eq!(filter.add(addr), Ok(true));
        }
        for &addr in &addrs {
            assert!(filter.contain(addr));
        }
    }

    #[test]
    fn test_exhaustion_refuses_until_delete() {
        let mut filter = CuckooFilter::with_seed(8, 8, 17).unwrap();
        assert_eq!(filter.capacity(), 16);

        let added = fill(&mut filter);
        assert!(filter.is_full());
        assert!(added.len() <= filter.capacity() + 1);
        for &key in &added {
            assert!(filter.contain(key));
        }

        let next = *added.last().unwrap() + 1;
        assert_eq!(filter.add(next), Err(CuckooError::CapacityExceeded));
        assert_eq!(filter.add(next + 1), Err(CuckooError::CapacityExceeded));

        let items = filter.len();
        assert!(filter.delete(added[0]));
        // Either the victim is re-seated into the freed room, or it stays parked.
        if filter.is_full() {
            assert_eq!(filter.len(), items - 1);
            assert_eq!(filter.add(next), Err(CuckooError::CapacityExceeded));
        } else {
            assert_eq!(filter.len(), items);
        }
        assert_eq!(
            filter.load_factor(),
            filter.len() as f64 / filter.capacity() as f64
        );
        // Re-seating the victim kicks other fingerprints around; none may get lost.
        for &key in &added[1..] {
            assert!(filter.contain(key), "lost key {}", key);
        }
    }

    #[test]
    fn test_full_table_exhausts_kick_budget() {
        // One bucket: once its four slots are taken every add must exhaust the loop.
        let mut filter = CuckooFilter::with_seed(8, 1, 5).unwrap();
        assert_eq!(filter.capacity(), 4);
        for key in 0..4 {
            assert_eq!(filter.add(key), Ok(true));
        }
        assert_eq!(filter.add(4), Ok(false));
        assert!(filter.is_full());
        assert_eq!(filter.len(), 4);
        assert_eq!(filter.load_factor(), 1.0);
        for key in 0..5 {
            assert!(filter.contain(key));
        }
        assert_eq!(filter.add(5), Err(CuckooError::CapacityExceeded));
    }

    #[test]
    fn test_delete_victim_leaves_table_alone() {
        let mut filter = CuckooFilter::with_seed(8, 300, 0).unwrap();
        filter.add(2).unwrap();

        let (i1, tag) = filter.indexer.index_and_tag(200);
        let i2 = filter.indexer.alt_index(i1, tag);
        filter.victim.store(i2, tag);
        assert!(filter.is_full());
        assert!(filter.contain(200));

        assert!(filter.delete(200));
        assert!(!filter.is_full());
        assert!(!filter.contain(200));
        assert!(filter.contain(2));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_delete_resurrects_victim() {
        let mut filter = CuckooFilter::with_seed(8, 300, 0).unwrap();
        filter.add(2).unwrap();

        let (index, tag) = filter.indexer.index_and_tag(200);
        filter.victim.store(index, tag);
        assert_eq!(filter.add(6), Err(CuckooError::CapacityExceeded));

        // The victim's bucket is empty, so it is placed straight away.
        assert!(filter.delete(2));
        assert!(!filter.is_full());
        assert!(filter.contain(200));
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.add(6), Ok(true));
    }

    #[test]
    fn test_duplicates_are_stored_twice() {
        let mut filter = CuckooFilter::new(8, 300).unwrap();
        filter.add(42).unwrap();
        filter.add(42).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.delete(42));
        assert!(filter.contain(42));
        assert!(filter.delete(42));
        assert!(!filter.contain(42));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_false_positives() {
        const SAMPLE_SIZE: usize = 10_000;
        let mut rng = rand::thread_rng();
        let mut filter = CuckooFilter::new(8, SAMPLE_SIZE).unwrap();
        let keys: Vec<Key> = (0..SAMPLE_SIZE / 2).map(|_| rng.gen_range(0..1 << 40)).collect();
        for &key in &keys {
            filter.add(key).unwrap();
        }
        for &key in &keys {
            assert!(filter.contain(key));
        }

        let false_positives = (0..SAMPLE_SIZE)
            .map(|_| rng.gen_range(1 << 41..1 << 42))
            .filter(|&key| filter.contain(key))
            .count();
        let fp_rate = false_positives as f64 * 100.0 / SAMPLE_SIZE as f64;
        assert!(fp_rate < 3.0, "False positive rate is {}", fp_rate);
    }

    #[test]
    fn test_status() {
        let mut filter = CuckooFilter::new(12, 300).unwrap();
        let status = filter.to_string();
        assert!(status.starts_with("CuckooFilter Status:"));
        assert!(status.contains("Total # of rows: 128"));
        assert!(status.contains("Keys stored: 0"));
        assert!(status.contains("bit/key:   N/A"));

        filter.add(2).unwrap();
        let status = filter.to_string();
        assert!(status.contains("Keys stored: 1"));
        assert!(status.contains("Load factor: 0.001953125"));
        assert!(status.contains("bit/key:   12"));
    }

    #[test]
    fn test_filter_trait() {
        fn exercise<F: Filter<Key>>(filter: &mut F) {
            assert_eq!(filter.insert(&7), Ok(true));
            assert!(filter.contains(&7));
            assert_eq!(filter.len(), 1);
            assert!(filter.remove(&7));
            assert_eq!(filter.len(), 0);
        }
        exercise(&mut CuckooFilter::new(8, 64).unwrap());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Key),
        Delete(Key),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0..512 as Key).prop_map(Op::Add),
            1 => (0..512 as Key).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn deletes_after_exhaustion_keep_the_rest(
            seed in any::<u64>(),
            max_keys in prop::sample::select(&[8usize, 16, 40, 100][..]),
        ) {
            let mut filter = CuckooFilter::with_seed(8, max_keys, seed).unwrap();
            let added = fill(&mut filter);
            prop_assert!(filter.is_full());

            let (deleted, kept): (Vec<_>, Vec<_>) =
                added.iter().enumerate().partition(|(i, _)| i % 3 == 0);
            for (_, &key) in deleted {
                prop_assert!(filter.delete(key));
            }
            for (_, &key) in kept {
                prop_assert!(filter.contain(key), "lost key {}", key);
            }
            prop_assert_eq!(filter.load_factor(), filter.len() as f64 / filter.capacity() as f64);
        }

        #[test]
        fn added_keys_are_contained(seed in any::<u64>(), keys in proptest::collection::vec(any::<i64>(), 0..200)) {
            let mut filter = CuckooFilter::with_seed(8, 64, seed).unwrap();
            let mut stored = Vec::new();
            for key in keys {
                if filter.add(key).is_ok() {
                    stored.push(key);
                }
            }
            for key in stored {
                prop_assert!(filter.contain(key));
            }
        }

        #[test]
        fn load_factor_tracks_len(seed in any::<u64>(), ops in proptest::collection::vec(op(), 0..300)) {
            let mut filter = CuckooFilter::with_seed(8, 32, seed).unwrap();
            for op in ops {
                match op {
                    Op::Add(key) => { let _ = filter.add(key); }
                    Op::Delete(key) => { filter.delete(key); }
                }
                prop_assert!(filter.len() <= filter.capacity());
                prop_assert_eq!(filter.load_factor(), filter.len() as f64 / filter.capacity() as f64);
                prop_assert!((0.0..=1.0).contains(&filter.load_factor()));
            }
        }
    }
}
