//! This library implements a Cuckoo Filter -- a data structure for fast approximation of set
//! membership using little memory. Probabilistic filters like cuckoo filters are useful for
//! quickly estimating the existence of an entity to avoid using an expensive resource. For
//! example, they can back an [IP blocklist] or act as a deduplication pre-check.
//!
//! Unlike Bloom and xor filters, cuckoo filters support deletion. Each key is reduced to an 8-bit
//! fingerprint that lives in one of two candidate buckets; the second bucket can be recomputed
//! from the first and the fingerprint alone, which is what lets stored fingerprints be moved
//! ("kicked out") to make room for new ones without knowing the original key.
//!
//! The filter operates on 64-bit signed integer keys. Arbitrary hashable keys can be used through
//! a [`HashProxy`]. The table is sized once at construction and never grows; when it is
//! effectively full, [`CuckooFilter::add`] reports so rather than resizing. This library is
//! `no_std` and [`needs_allocator`].
//!
//! The filter follows the paper [Cuckoo Filter: Practically Better Than Bloom] and the authors'
//! [reference implementation].
//!
//! [IP blocklist]: https://en.wikipedia.org/wiki/IP_address_blocking
//! [`needs_allocator`]: https://doc.rust-lang.org/1.9.0/book/custom-allocators.html
//! [Cuckoo Filter: Practically Better Than Bloom]: https://www.cs.cmu.edu/~dga/papers/cuckoo-conext2014.pdf
//! [reference implementation]: https://github.com/efficient/cuckoofilter

#![no_std]
// Configuration attributes
#![warn(missing_docs)]
#![forbid(clippy::all, clippy::nursery)]
#![allow(clippy::len_without_is_empty, clippy::useless_attribute)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod cuckoo8;
mod djb2;
mod error;
mod hash_proxy;
mod indexer;
mod splitmix64;
mod table;
mod victim;

pub use cuckoo8::CuckooFilter;
pub use error::CuckooError;
pub use hash_proxy::HashProxy;

/// Keys accepted by a [`CuckooFilter`].
pub type Key = i64;

/// An 8-bit fingerprint. The value 0 marks an empty slot and is never produced for a key.
pub type Tag = u8;

/// Number of fingerprint slots per bucket.
pub const ASSOCIATIVITY: usize = 4;

/// Number of placement attempts made for one insertion before giving up.
pub const MAX_KICKS: usize = 500;

/// Largest table, in buckets. Primary bucket indices come from the upper 24 bits of a 32-bit hash.
pub const MAX_BUCKETS: usize = 1 << 24;

/// Methods common to mutable probabilistic filters.
pub trait Filter<Type> {
    /// Returns `true` if the filter probably contains the specified key.
    ///
    /// There can never be a false negative for a stored key, but there is a small possibility of
    /// false positives.
    fn contains(&self, key: &Type) -> bool;

    /// Adds the key. See [`CuckooFilter::add`] for what the result means.
    fn insert(&mut self, key: &Type) -> Result<bool, CuckooError>;

    /// Removes one occurrence of the key's fingerprint. Returns `false` if none was found.
    fn remove(&mut self, key: &Type) -> bool;

    /// Returns the number of fingerprints in the filter.
    fn len(&self) -> usize;
}
