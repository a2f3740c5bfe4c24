//! Implements a hashing proxy for cuckoo filters.

use crate::{CuckooError, Filter, Key};
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Arbitrary key type proxy for cuckoo filters.
///
/// A `HashProxy` exposes a [`Filter`] trait for arbitrary key types, using a `Filter<Key>` as an
/// underlying keystore. Each key is hashed with `H` and the 64-bit digest is used as the integer
/// key. The collision rate of the proxy depends on the choice of [`Hasher`]; whatever it is, two
/// values hashing to the same digest are the same key as far as the filter is concerned.
///
/// ```
/// # extern crate std;
/// use std::collections::hash_map::DefaultHasher;
/// use cuckoof::{CuckooFilter, Filter, HashProxy};
///
/// let filter = CuckooFilter::new(8, 1_000)?;
/// let mut hosts: HashProxy<&str, DefaultHasher, _> = HashProxy::new(filter);
///
/// hosts.insert(&"spam.example")?;
/// assert!(hosts.contains(&"spam.example"));
///
/// assert!(hosts.remove(&"spam.example"));
/// assert!(!hosts.contains(&"spam.example"));
/// # Ok::<(), cuckoof::CuckooError>(())
/// ```
///
/// Because of the key type parameter, the existence of a key can only be checked using the type
/// the `HashProxy` was declared with.
///
/// ```compile_fail
/// # extern crate std;
/// use std::collections::hash_map::DefaultHasher;
/// use cuckoof::{CuckooFilter, Filter, HashProxy};
///
/// let filter = CuckooFilter::new(8, 1_000).unwrap();
/// let fruits: HashProxy<&str, DefaultHasher, _> = HashProxy::new(filter);
///
/// assert!(fruits.contains(&42u64)); // doesn't work!
/// ```
///
/// [`Hasher`]: core::hash::Hasher
#[derive(Debug)]
pub struct HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<Key>,
{
    filter: F,
    _hasher: PhantomData<H>,
    _type: PhantomData<T>,
}

#[inline]
fn hash<T: Hash, H: Hasher + Default>(key: &T) -> Key {
    let mut hasher = H::default();
    key.hash(&mut hasher);
    hasher.finish() as Key
}

impl<T, H, F> HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<Key>,
{
    /// Wraps `filter`, which should be empty or only ever have been fed through a proxy with the
    /// same hasher.
    pub const fn new(filter: F) -> Self {
        Self {
            filter,
            _hasher: PhantomData,
            _type: PhantomData,
        }
    }

    /// Returns the underlying filter.
    pub fn into_inner(self) -> F {
        self.filter
    }
}

impl<T, H, F> Filter<T> for HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<Key>,
{
    /// Returns `true` if the underlying filter contains the specified key.
    fn contains(&self, key: &T) -> bool {
        self.filter.contains(&hash::<T, H>(key))
    }

    fn insert(&mut self, key: &T) -> Result<bool, CuckooError> {
        self.filter.insert(&hash::<T, H>(key))
    }

    fn remove(&mut self, key: &T) -> bool {
        self.filter.remove(&hash::<T, H>(key))
    }

    fn len(&self) -> usize {
        self.filter.len()
    }
}
