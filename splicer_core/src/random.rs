use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

/// The random source every mutation decision is drawn from.
///
/// A thin wrapper over `ChaCha8Rng` that exposes the bounded draws the
/// mutators need. Two `Random`s created from the same seed produce the same
/// sequence of values, which makes every mutation reproducible.
#[derive(Debug, Clone)]
pub struct Random {
    rng: ChaCha8Rng,
}

impl Random {
    /// Creates a new random source from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns a value in `[0, bound)`.
    ///
    /// # Panics
    /// Panics if `bound` is zero. Callers must guard empty ranges themselves.
    pub fn below(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "Random::below called with an empty range");
        self.rng.random_range(0..bound)
    }

    /// Same as [`Random::below`] for 64-bit bounds.
    pub fn below_u64(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "Random::below_u64 called with an empty range");
        self.rng.random_range(0..bound)
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// A raw 32-bit value, handed to external hooks as their own seed.
    pub fn next_u32(&mut self) -> u32 {
        self.rng.random::<u32>()
    }

    pub fn next_byte(&mut self) -> u8 {
        self.rng.random::<u8>()
    }

    /// Shuffles `bytes` in place.
    pub fn shuffle(&mut self, bytes: &mut [u8]) {
        bytes.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = Random::new(7);
        let mut b = Random::new(7);
        for _ in 0..100 {
            assert_eq!(a.below(1000), b.below(1000));
            assert_eq!(a.next_bool(), b.next_bool());
        }
    }

    #[test]
    fn below_stays_in_range() {
        let mut rand = Random::new(1);
        for bound in 1..50usize {
            for _ in 0..20 {
                assert!(rand.below(bound) < bound);
            }
        }
        assert_eq!(rand.below(1), 0);
        assert!(rand.below_u64(3) < 3);
    }

    #[test]
    #[should_panic(expected = "empty range")]
    fn below_zero_panics() {
        let mut rand = Random::new(0);
        rand.below(0);
    }

    #[test]
    fn shuffle_keeps_the_same_bytes() {
        let mut rand = Random::new(3);
        let mut bytes = *b"abcdefgh";
        rand.shuffle(&mut bytes);
        let mut sorted = bytes;
        sorted.sort_unstable();
        assert_eq!(&sorted, b"abcdefgh");
    }
}
