/// Pseudo-RNG using Sebastiano Vigna's [`SplitMix64`] algorithm, used to pick which slot of a
/// full bucket gets kicked out.
///
/// [`SplitMix64`]: http://xoroshiro.di.unimi.it/splitmix64.c
///
/// Written in 2015 by Sebastiano Vigna (vigna@acm.org)
///
/// To the extent possible under law, the author has dedicated all copyright and related and
/// neighboring rights to this software to the public domain worldwide. This software is
/// distributed without any warranty.
///
/// See <http://creativecommons.org/publicdomain/zero/1.0/>.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeds from the thread-local generator.
    #[cfg(feature = "uniform-random")]
    pub fn from_entropy() -> Self {
        use rand::Rng;
        Self::new(rand::thread_rng().gen())
    }

    /// Without `uniform-random` there is no entropy source, so every filter starts from the same
    /// seed.
    #[cfg(not(feature = "uniform-random"))]
    pub const fn from_entropy() -> Self {
        Self::new(0x5bd1_e995)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Returns a value in `[0, n)`. `n` must be a power of two.
    #[inline]
    pub fn below(&mut self, n: usize) -> usize {
        debug_assert!(n.is_power_of_two());
        // The high bits are the best mixed.
        (self.next_u64() >> 32) as usize & (n - 1)
    }
}

#[cfg(test)]
mod test {
    use super::SplitMix64;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SplitMix64::new(42);
        let mut b = SplitMix64::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_below_stays_in_range_and_covers_it() {
        let mut rng = SplitMix64::new(7);
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            let slot = rng.below(4);
            assert!(slot < 4);
            seen[slot] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
