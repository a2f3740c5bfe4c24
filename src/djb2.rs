//! djb2 hashing of integer keys.

/// Daniel J. Bernstein's [`djb2`] string hash, taken over the decimal representation of `key`.
///
/// The key is hashed as the ASCII digits it prints as (with a leading `-` when negative) rather
/// than its two's complement bytes, so `djb2(200)` is the djb2 of the string `"200"`. Bucket
/// indices and fingerprints are derived from this value, so changing it changes where every key
/// lives.
///
/// [`djb2`]: http://www.cse.yorku.ca/~oz/hash.html
pub fn djb2(key: i64) -> u32 {
    itoa::Buffer::new()
        .format(key)
        .as_bytes()
        .iter()
        .fold(5381u32, |hash, &byte| {
            hash.wrapping_mul(33).wrapping_add(byte as u32)
        })
}
