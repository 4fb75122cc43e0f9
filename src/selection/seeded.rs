//! Seeded uniform integer draw shared by every instance.
//!
//! Independent instances agree on a choice only if they compute exactly the
//! same function of the observed seed, so both halves of the draw are fixed:
//!
//! 1. Generator: `ChaCha8Rng::seed_from_u64(seed as u64)` from `rand_chacha`,
//!    whose output stream is value-stable across releases.
//! 2. Interval mapping: Lemire's nearly-divisionless method (D. Lemire,
//!    "Fast Random Integer Generation in an Interval", ACM TOMACS 2019) over
//!    64-bit words from [`RngCore::next_u64`].
//!
//! `rand`'s own `Uniform` is deliberately not used here: its sampling
//! algorithm is allowed to change between major versions.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Creates the generator for one draw.
pub fn seeded_rng(seed: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from(seed))
}

/// Draws one value from `[lo, hi]` using a generator seeded only by `seed`.
///
/// The generator is discarded afterwards, so the result is a pure function
/// of the three arguments. `lo > hi` is treated as `[hi, lo]`.
pub fn seeded_uniform(lo: u64, hi: u64, seed: u32) -> u64 {
    let mut rng = seeded_rng(seed);
    uniform_inclusive(&mut rng, lo, hi)
}

/// Maps words from `rng` onto `[lo, hi]` without modulo bias.
pub fn uniform_inclusive<R: RngCore + ?Sized>(rng: &mut R, lo: u64, hi: u64) -> u64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let range = hi.wrapping_sub(lo).wrapping_add(1);
    if range == 0 {
        // [0, u64::MAX]: every word is already uniform
        return rng.next_u64();
    }

    let mut m = u128::from(rng.next_u64()) * u128::from(range);
    let mut low = m as u64;
    if low < range {
        let threshold = range.wrapping_neg() % range;
        while low < threshold {
            m = u128::from(rng.next_u64()) * u128::from(range);
            low = m as u64;
        }
    }
    lo + (m >> 64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of words.
    struct Words {
        words: Vec<u64>,
        next: usize,
    }

    impl Words {
        fn new(words: &[u64]) -> Self {
            Self {
                words: words.to_vec(),
                next: 0,
            }
        }
    }

    impl RngCore for Words {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            let word = self.words[self.next];
            self.next += 1;
            word
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                *byte = self.next_u64() as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn mapping_takes_high_word_of_product() {
        // range 3: x * 3 >> 64
        assert_eq!(uniform_inclusive(&mut Words::new(&[1]), 0, 2), 0);
        assert_eq!(uniform_inclusive(&mut Words::new(&[1 << 63]), 0, 2), 1);
        assert_eq!(uniform_inclusive(&mut Words::new(&[u64::MAX]), 0, 2), 2);
        assert_eq!(uniform_inclusive(&mut Words::new(&[1 << 63]), 10, 12), 11);
    }

    #[test]
    fn mapping_rejects_biased_words() {
        // range 3: threshold = 2^64 mod 3 = 1, so a zero low word is redrawn
        let mut rng = Words::new(&[0, 1 << 63]);
        assert_eq!(uniform_inclusive(&mut rng, 0, 2), 1);
        assert_eq!(rng.next, 2);
    }

    #[test]
    fn full_range_returns_raw_word() {
        assert_eq!(
            uniform_inclusive(&mut Words::new(&[0xdead_beef]), 0, u64::MAX),
            0xdead_beef
        );
    }

    #[test]
    fn generator_stream_is_pinned() {
        let mut rng = seeded_rng(0);
        assert_eq!(rng.next_u64(), 0xb585_f767_a79a_3b6c);
        assert_eq!(rng.next_u64(), 0x7746_a55f_bad8_c037);
        assert_eq!(seeded_rng(1).next_u64(), 0x6709_4cea_8ca4_0db1);
        assert_eq!(seeded_rng(0xabcd).next_u64(), 0xc918_95fd_f6e3_a359);
    }

    #[test]
    fn known_draws() {
        assert_eq!(
            [0u32, 1, 0xabcd, u32::MAX].map(|seed| seeded_uniform(0, 9, seed)),
            [7, 4, 7, 7]
        );
        assert_eq!(
            [0u32, 1, 2, 3, 4, 5, 6, 7].map(|seed| seeded_uniform(0, 3, seed)),
            [2, 1, 3, 2, 2, 0, 1, 0]
        );
    }

    #[test]
    fn same_seed_same_value() {
        for seed in [0u32, 1, 0xabcd, u32::MAX] {
            assert_eq!(seeded_uniform(0, 9, seed), seeded_uniform(0, 9, seed));
        }
    }

    #[test]
    fn single_value_range() {
        for seed in 0..100 {
            assert_eq!(seeded_uniform(7, 7, seed), 7);
        }
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        for seed in 0..100 {
            assert_eq!(seeded_uniform(9, 2, seed), seeded_uniform(2, 9, seed));
        }
    }

    #[test]
    fn values_stay_in_range() {
        for seed in 0..5000 {
            let v = seeded_uniform(3, 11, seed);
            assert!((3..=11).contains(&v));
        }
    }

    #[test]
    fn roughly_uniform_over_seeds() {
        let mut counts = [0u32; 4];
        for seed in 0..2000 {
            counts[seeded_uniform(0, 3, seed) as usize] += 1;
        }
        // expected 500 each, sd ~19
        for count in counts {
            assert!((400..=600).contains(&count), "counts: {:?}", counts);
        }
    }

    #[test]
    fn different_seeds_reach_different_values() {
        let distinct: std::collections::HashSet<u64> =
            (0..50).map(|seed| seeded_uniform(0, 1_000_000, seed)).collect();
        assert!(distinct.len() > 40);
    }
}
