//! Locality-sensitive hash families for wide (`&[u64]`) vectors.
//!
//! Wide families address bits with `(word, mask)` pairs: the word index
//! picks the `u64`, the single-bit (or multi-bit, for blur masks) mask
//! picks the position inside it. That keeps every family free of
//! division/modulo in the hot loop and works for any row width.
//!
//! The batch/single contract from the narrow module carries over:
//! `hash_many_wide(xs)[i] == hash_one_wide(xs[i])` for every family.

use rand::seq::SliceRandom;
use rand::Rng;

use super::hashes::Hash;

/// A bucket-ID hash over fixed-width rows of `u64` words.
pub trait HashWide {
    /// Hashes a single row.
    fn hash_one_wide(&self, x: &[u64]) -> u64;

    /// Hashes a slice of rows, one output per row.
    ///
    /// `out` must have the same length as `data`.
    fn hash_many_wide(&self, data: &[Vec<u64>], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        for (o, d) in out.iter_mut().zip(data) {
            *o = self.hash_one_wide(d);
        }
    }
}

/// Lifts a narrow hash to wide rows by hashing the first word only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstWord<H>(pub H);

impl<H: Hash> HashWide for FirstWord<H> {
    fn hash_one_wide(&self, x: &[u64]) -> u64 {
        self.0.hash_one(x[0])
    }
}

/// All distinct `(word, single-bit)` positions of a `width`-word row, in
/// index order.
fn all_positions(width: usize) -> Vec<(usize, u64)> {
    (0..width)
        .flat_map(|w| (0..64).map(move |b| (w, 1u64 << b)))
        .collect()
}

/// A fixed sampling of bit positions across all words of a row.
///
/// Output bit `i` (from the last sampled position upward) is the sampled
/// bit's value, so rows that agree on the sample collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSampleWide {
    /// Sampled `(word, single-bit mask)` positions; at most 64.
    pub bits: Vec<(usize, u64)>,
}

impl BitSampleWide {
    /// A random sample of `num_bits` positions from a `width`-word row.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits` exceeds 64 (the output width) or the number of
    /// available positions.
    #[must_use]
    pub fn random(width: usize, num_bits: usize, rng: &mut impl Rng) -> Self {
        assert!(num_bits <= 64, "output is a single word");
        let mut positions = all_positions(width);
        assert!(num_bits <= positions.len());
        positions.shuffle(rng);
        positions.truncate(num_bits);
        Self { bits: positions }
    }
}

impl HashWide for BitSampleWide {
    fn hash_one_wide(&self, x: &[u64]) -> u64 {
        let mut out = 0;
        for &(word, mask) in &self.bits {
            out <<= 1;
            if x[word] & mask != 0 {
                out |= 1;
            }
        }
        out
    }
}

/// A min-wise hash over all bit positions of a wide row.
///
/// Holds a permutation of the `64 * width` positions; the hash is the
/// permutation index of the first set bit, in `[0, 64 * width)`. As with
/// the narrow [`MinHash`](super::MinHash), an all-zero row hashes to 0
/// under every permutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashWide {
    /// Permuted `(word, single-bit mask)` positions.
    pub bits: Vec<(usize, u64)>,
}

impl MinHashWide {
    /// A min-hash over a random permutation of a `width`-word row's bits.
    #[must_use]
    pub fn random(width: usize, rng: &mut impl Rng) -> Self {
        let mut positions = all_positions(width);
        positions.shuffle(rng);
        Self { bits: positions }
    }
}

impl HashWide for MinHashWide {
    fn hash_one_wide(&self, x: &[u64]) -> u64 {
        for (j, &(word, mask)) in self.bits.iter().enumerate() {
            if x[word] & mask != 0 {
                return j as u64;
            }
        }
        0
    }
}

/// Thresholds the overlap between a row and a list of wide masks.
///
/// Each mask is a list of `(word, mask)` pairs; the overlap is the summed
/// popcount of the per-word intersections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlurWide {
    /// Wide masks, one output bit each.
    pub masks: Vec<Vec<(usize, u64)>>,
    /// Minimum overlap required to set the output bit.
    pub threshold: u32,
}

impl BlurWide {
    /// `num_masks` random wide masks of `bits_per_mask` set bits each,
    /// with majority threshold.
    #[must_use]
    pub fn random(
        width: usize,
        bits_per_mask: u32,
        num_masks: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let masks = (0..num_masks)
            .map(|_| {
                let mut positions = all_positions(width);
                positions.shuffle(rng);
                positions.truncate(bits_per_mask as usize);
                // Merge same-word bits so the overlap loop touches each
                // word once.
                positions.sort_unstable_by_key(|&(w, _)| w);
                let mut merged: Vec<(usize, u64)> = Vec::new();
                for (w, m) in positions {
                    match merged.last_mut() {
                        Some((lw, lm)) if *lw == w => *lm |= m,
                        _ => merged.push((w, m)),
                    }
                }
                merged
            })
            .collect();
        Self {
            masks,
            threshold: bits_per_mask / 2 + 1,
        }
    }
}

impl HashWide for BlurWide {
    fn hash_one_wide(&self, x: &[u64]) -> u64 {
        let mut bx = 0;
        for mask in &self.masks {
            let mut common = 0;
            for &(word, m) in mask {
                common += (x[word] & m).count_ones();
            }
            bx <<= 1;
            if common >= self.threshold {
                bx |= 1;
            }
        }
        bx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsh::BitSample;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batch_matches_one_shot<H: HashWide>(h: &H, data: &[Vec<u64>]) {
        let mut out = vec![0u64; data.len()];
        h.hash_many_wide(data, &mut out);
        for (i, d) in data.iter().enumerate() {
            assert_eq!(out[i], h.hash_one_wide(d), "batch/single mismatch at {i}");
        }
    }

    fn sample_rows(width: usize) -> Vec<Vec<u64>> {
        let mut rng = StdRng::seed_from_u64(0xB0A4);
        let mut rows: Vec<Vec<u64>> = (0..48)
            .map(|_| (0..width).map(|_| rng.gen()).collect())
            .collect();
        rows.push(vec![0; width]);
        rows.push(vec![u64::MAX; width]);
        rows
    }

    #[test]
    fn every_family_is_batch_consistent() {
        let mut rng = StdRng::seed_from_u64(17);
        for width in [1usize, 2, 4] {
            let rows = sample_rows(width);
            batch_matches_one_shot(&BitSampleWide::random(width, 24, &mut rng), &rows);
            batch_matches_one_shot(&MinHashWide::random(width, &mut rng), &rows);
            batch_matches_one_shot(&BlurWide::random(width, 4, 3, &mut rng), &rows);
            batch_matches_one_shot(&FirstWord(BitSample(0xFF00)), &rows);
        }
    }

    #[test]
    fn first_word_matches_the_narrow_hash() {
        let narrow = BitSample(0xF0F0);
        let lifted = FirstWord(narrow);
        let row = vec![0xABCDu64, u64::MAX];
        assert_eq!(lifted.hash_one_wide(&row), narrow.hash_one(0xABCD));
    }

    #[test]
    fn min_hash_wide_indexes_the_full_bit_range() {
        let width = 3;
        // Identity permutation: position j is bit j of word j / 64.
        let h = MinHashWide {
            bits: all_positions(width),
        };
        let mut row = vec![0u64; width];
        row[2] = 0b100; // first set bit is global position 2 * 64 + 2
        assert_eq!(h.hash_one_wide(&row), 130);
        assert_eq!(h.hash_one_wide(&vec![0; width]), 0);

        let mut rng = StdRng::seed_from_u64(23);
        let random = MinHashWide::random(width, &mut rng);
        assert!(random.hash_one_wide(&row) < 64 * width as u64);
    }

    #[test]
    fn blur_wide_counts_and_threshold_match_construction() {
        let mut rng = StdRng::seed_from_u64(29);
        let h = BlurWide::random(2, 4, 3, &mut rng);
        assert_eq!(h.masks.len(), 3);
        assert_eq!(h.threshold, 3);
        for mask in &h.masks {
            let bits: u32 = mask.iter().map(|&(_, m)| m.count_ones()).sum();
            assert_eq!(bits, 4);
        }
    }

    #[test]
    fn bit_sample_wide_collides_on_agreeing_samples() {
        let h = BitSampleWide {
            bits: vec![(0, 1 << 3), (1, 1 << 7)],
        };
        let a = vec![0b1000u64, 1 << 7];
        let b = vec![0b1001u64, (1 << 7) | (1 << 8)];
        assert_eq!(h.hash_one_wide(&a), h.hash_one_wide(&b));
        assert_eq!(h.hash_one_wide(&a), 0b11);
    }

    #[test]
    fn min_hash_wide_is_locality_sensitive() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let width = 2;
        let x = vec![0x0000_00FF_FF00_0000u64, 0x00FF_0000_0000_FF00];
        let mut y = x.clone();
        y[0] ^= 0b11; // distance 2
        let z: Vec<u64> = x.iter().map(|&w| !w).collect();

        let mut near = 0;
        let mut far = 0;
        for _ in 0..400 {
            let h = MinHashWide::random(width, &mut rng);
            if h.hash_one_wide(&x) == h.hash_one_wide(&y) {
                near += 1;
            }
            if h.hash_one_wide(&x) == h.hash_one_wide(&z) {
                far += 1;
            }
        }
        assert!(near > far, "near collisions {near} <= far collisions {far}");
    }
}
