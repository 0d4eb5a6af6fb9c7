//! Locality-sensitive hash families for narrow (`u64`) vectors.
//!
//! A hash family maps a 64-bit vector to a bucket ID. Locality-sensitivity
//! is statistical, not bit-exact: vectors that are close in Hamming
//! distance should collide more often than vectors that are far apart.
//! What *is* a hard contract, for every family, is batch/single
//! equivalence: `hash_many(xs)[i] == hash_one(xs[i])` for all `i`.
//!
//! ## Families
//!
//! - [`BitSample`]: keep a fixed subset of bit positions. Distances on the
//!   kept bits are preserved exactly.
//! - [`MinHash`]: a random permutation of the 64 bit positions; the hash is
//!   the permutation index of the first set bit, a Hamming-space take on
//!   min-wise hashing (Broder 1997).
//! - [`MinHashes`]: a concatenation of up to 10 independent [`MinHash`]es,
//!   6 bits each.
//! - [`Blur`]: threshold the overlap with a list of bitmasks; with
//!   contiguous windows ([`Blur::box_blur`]) this is a box blur over the
//!   bit string.
//! - [`Compose`]: chain several families.
//! - [`Identity`] / [`ConstantZero`]: degenerate families that force an
//!   LSH index into exact-search or single-bucket behaviour.
//!
//! Plain functions are families too: any `Fn(u64) -> u64` implements
//! [`Hash`].

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

/// A bucket-ID hash over single-word vectors.
///
/// `hash_many` must agree element-wise with `hash_one`; the default batch
/// form guarantees that, and specialised overrides keep the loop body
/// inlined for the hot fit path.
pub trait Hash {
    /// Hashes a single vector.
    fn hash_one(&self, x: u64) -> u64;

    /// Hashes a slice of vectors, one output per input.
    ///
    /// `out` must have the same length as `data`.
    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        for (o, &d) in out.iter_mut().zip(data) {
            *o = self.hash_one(d);
        }
    }
}

impl<F: Fn(u64) -> u64> Hash for F {
    fn hash_one(&self, x: u64) -> u64 {
        self(x)
    }
}

/// The identity hash: every point is its own bucket.
///
/// An LSH index built with this hash degrades to exact search (the exact
/// bucket holds only exact duplicates, and bucket-ID distance equals point
/// distance), which makes it the canonical regression oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Hash for Identity {
    fn hash_one(&self, x: u64) -> u64 {
        x
    }

    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        out.copy_from_slice(data);
    }
}

/// The constant-zero hash: one bucket holds everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantZero;

impl Hash for ConstantZero {
    fn hash_one(&self, _x: u64) -> u64 {
        0
    }

    fn hash_many(&self, _data: &[u64], out: &mut [u64]) {
        out.fill(0);
    }
}

/// A fixed sampling of bit positions: `hash(x) = x & mask`.
///
/// Hamming distances restricted to the kept bits are preserved exactly, so
/// nearby points collide whenever they agree on the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSample(pub u64);

impl BitSample {
    /// A random sample keeping `num_bits` of the 64 positions.
    #[must_use]
    pub fn random(num_bits: u32, rng: &mut impl Rng) -> Self {
        assert!(num_bits <= 64);
        let mut positions: Vec<u32> = (0..64).collect();
        positions.shuffle(rng);
        let mut mask = 0u64;
        for &p in &positions[..num_bits as usize] {
            mask |= 1 << p;
        }
        Self(mask)
    }
}

impl Hash for BitSample {
    fn hash_one(&self, x: u64) -> u64 {
        x & self.0
    }

    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        for (o, &d) in out.iter_mut().zip(data) {
            *o = d & self.0;
        }
    }
}

/// A min-wise hash for Hamming space.
///
/// Holds a permutation of the 64 bit positions as single-bit masks; the
/// hash of `x` is the index of the first mask with a set bit in `x`, in
/// `[0, 64)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHash(pub Vec<u64>);

impl MinHash {
    /// A min-hash over a random permutation of the bit positions.
    #[must_use]
    pub fn random(rng: &mut impl Rng) -> Self {
        let mut positions: Vec<u32> = (0..64).collect();
        positions.shuffle(rng);
        Self(positions.into_iter().map(|p| 1u64 << p).collect())
    }
}

impl Hash for MinHash {
    /// Returns the permutation index of the first set bit of `x`.
    ///
    /// `hash_one(0)` is 0: no mask matches an all-zero input, so all-zero
    /// points and queries collide under *every* permutation.
    fn hash_one(&self, x: u64) -> u64 {
        for (j, &mask) in self.0.iter().enumerate() {
            if x & mask != 0 {
                return j as u64;
            }
        }
        0
    }
}

/// A concatenation of up to 10 independent [`MinHash`]es.
///
/// Each member hash yields 6 bits; outputs are packed left to right, so the
/// first member occupies the highest bits. Ten members fill 60 of the 64
/// output bits, which is the cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashes(pub SmallVec<[MinHash; 10]>);

impl MinHashes {
    /// The most member hashes that fit a 64-bit output at 6 bits each.
    pub const MAX_HASHES: usize = 10;

    /// `n` independently random member hashes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`MinHashes::MAX_HASHES`].
    #[must_use]
    pub fn random(n: usize, rng: &mut impl Rng) -> Self {
        assert!(
            n <= Self::MAX_HASHES,
            "at most {} min-hashes fit a 64-bit output",
            Self::MAX_HASHES
        );
        Self((0..n).map(|_| MinHash::random(rng)).collect())
    }
}

impl Hash for MinHashes {
    fn hash_one(&self, x: u64) -> u64 {
        let mut out = 0;
        for h in &self.0 {
            out = (out << 6) | h.hash_one(x);
        }
        out
    }

    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        for (o, &d) in out.iter_mut().zip(data) {
            let mut m = 0;
            for h in &self.0 {
                m = (m << 6) | h.hash_one(d);
            }
            *o = m;
        }
    }
}

/// Thresholds the overlap between the input and a list of bitmasks.
///
/// Output bit `i` (counting from the last mask upward) is set iff
/// `popcount(x & masks[i]) >= threshold`. With masks of consecutive set
/// bits this blurs the bit string; with random masks it is a random
/// hyperplane-style sketch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blur {
    /// Bitmasks, one output bit each.
    pub masks: Vec<u64>,
    /// Minimum overlap required to set the output bit.
    pub threshold: u32,
}

impl Blur {
    /// A box blur: contiguous windows of width `2 * radius + 1`, one
    /// starting every `step` positions, with majority threshold.
    ///
    /// # Panics
    ///
    /// Panics if `step` is 0 or the window is wider than 64 bits.
    #[must_use]
    pub fn box_blur(radius: u32, step: u32) -> Self {
        assert!(step > 0, "step must be positive");
        let width = 2 * radius + 1;
        assert!(width <= 64, "window must fit a word");
        let window = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        let mut masks = Vec::new();
        let mut i = 0;
        while i + width <= 64 {
            masks.push(window << i);
            i += step;
        }
        Self {
            masks,
            threshold: width / 2 + 1,
        }
    }

    /// `num_masks` random masks of `bits_per_mask` set bits each, with
    /// majority threshold.
    #[must_use]
    pub fn random(bits_per_mask: u32, num_masks: usize, rng: &mut impl Rng) -> Self {
        let masks = (0..num_masks)
            .map(|_| BitSample::random(bits_per_mask, rng).0)
            .collect();
        Self {
            masks,
            threshold: bits_per_mask / 2 + 1,
        }
    }
}

impl Hash for Blur {
    fn hash_one(&self, x: u64) -> u64 {
        let mut bx = 0;
        for &mask in &self.masks {
            bx <<= 1;
            if (x & mask).count_ones() >= self.threshold {
                bx |= 1;
            }
        }
        bx
    }

    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        for (o, &d) in out.iter_mut().zip(data) {
            let mut bx = 0;
            for &mask in &self.masks {
                bx <<= 1;
                if (d & mask).count_ones() >= self.threshold {
                    bx |= 1;
                }
            }
            *o = bx;
        }
    }
}

/// Applies several hash families in order.
///
/// The batch form runs the first stage into the output buffer and pipes
/// the later stages through it, so one buffer serves the whole chain.
pub struct Compose(pub Vec<Box<dyn Hash>>);

impl Hash for Compose {
    fn hash_one(&self, x: u64) -> u64 {
        self.0.iter().fold(x, |acc, h| h.hash_one(acc))
    }

    fn hash_many(&self, data: &[u64], out: &mut [u64]) {
        debug_assert_eq!(data.len(), out.len());
        let Some((first, rest)) = self.0.split_first() else {
            out.copy_from_slice(data);
            return;
        };
        first.hash_many(data, out);
        for h in rest {
            for o in out.iter_mut() {
                *o = h.hash_one(*o);
            }
        }
    }
}
