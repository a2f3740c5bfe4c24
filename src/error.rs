//! Errors returned by the filter.

use thiserror::Error;

/// Errors surfaced by [`CuckooFilter`](crate::CuckooFilter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CuckooError {
    /// A displaced fingerprint is already parked in the victim cache. Nothing more can be added
    /// until a successful delete frees room for it.
    #[error("filter is at capacity: a victim is outstanding")]
    CapacityExceeded,
    /// The requested capacity needs more buckets than a 24-bit bucket index can address.
    #[error("{max_keys} keys would need {buckets} buckets, more than the {} addressable", crate::MAX_BUCKETS)]
    TooManyKeys {
        /// Capacity hint passed at construction.
        max_keys: usize,
        /// Buckets that capacity would need.
        buckets: usize,
    },
}
