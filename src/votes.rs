//! Vote counters for label prediction.
//!
//! After the selector has produced k neighbors, the model adds one weighted
//! vote per neighbor under the neighbor's label. The counter is pluggable:
//! a dense slice indexed by label for small label domains, a sparse map for
//! large ones, and a no-op counter for callers that only want the neighbor
//! scan.

use std::collections::HashMap;

/// A k-NN vote counter.
///
/// Aggregation is plain addition; weights may be any `f64`.
pub trait VoteCounter {
    /// Removes all votes.
    fn clear(&mut self);

    /// Adds `delta` to the vote count for `label`.
    fn add(&mut self, label: usize, delta: f64);

    /// The vote count for `label`.
    fn get(&self, label: usize) -> f64;

    /// The highest vote count, or 0.0 if there are no votes.
    fn max(&self) -> f64;

    /// The first label with the highest vote count, or 0 if there are no
    /// votes.
    fn argmax(&self) -> usize;
}

/// A dense vote counter backed by a slice indexed by label.
///
/// Efficient for small label domains; `labels` must all be below the slice
/// length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteSlice(pub Vec<f64>);

impl VoteSlice {
    /// A zeroed counter over the label domain `[0, num_labels)`.
    #[must_use]
    pub fn new(num_labels: usize) -> Self {
        Self(vec![0.0; num_labels])
    }
}

impl VoteCounter for VoteSlice {
    fn clear(&mut self) {
        self.0.fill(0.0);
    }

    fn add(&mut self, label: usize, delta: f64) {
        self.0[label] += delta;
    }

    fn get(&self, label: usize) -> f64 {
        self.0[label]
    }

    fn max(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn argmax(&self) -> usize {
        let mut best = 0;
        for (label, &v) in self.0.iter().enumerate().skip(1) {
            if v > self.0[best] {
                best = label;
            }
        }
        best
    }
}

/// A sparse vote counter backed by a label → weight map.
///
/// Good for large label domains. Iteration order is unspecified but stable
/// within one counter, so `argmax` is deterministic per instance.
#[derive(Debug, Clone, Default)]
pub struct VoteMap(pub HashMap<usize, f64>);

impl VoteMap {
    /// An empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }
}

impl VoteCounter for VoteMap {
    fn clear(&mut self) {
        self.0.clear();
    }

    fn add(&mut self, label: usize, delta: f64) {
        *self.0.entry(label).or_insert(0.0) += delta;
    }

    fn get(&self, label: usize) -> f64 {
        self.0.get(&label).copied().unwrap_or(0.0)
    }

    fn max(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.values().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn argmax(&self) -> usize {
        let mut best: Option<(usize, f64)> = None;
        for (&label, &v) in &self.0 {
            match best {
                Some((_, bv)) if v <= bv => {}
                _ => best = Some((label, v)),
            }
        }
        best.map_or(0, |(label, _)| label)
    }
}

/// A no-op vote counter, for callers that only want the neighbor scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardVotes;

impl VoteCounter for DiscardVotes {
    fn clear(&mut self) {}
    fn add(&mut self, _label: usize, _delta: f64) {}
    fn get(&self, _label: usize) -> f64 {
        0.0
    }
    fn max(&self) -> f64 {
        0.0
    }
    fn argmax(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_and_sparse_agree_on_argmax() {
        let adds = [(3usize, 1.0), (1, 2.5), (3, 2.0), (0, 0.5), (1, 0.4)];
        let mut dense = VoteSlice::new(4);
        let mut sparse = VoteMap::new();
        for &(label, delta) in &adds {
            dense.add(label, delta);
            sparse.add(label, delta);
        }
        assert_eq!(dense.argmax(), 3);
        assert_eq!(sparse.argmax(), 3);
        assert_eq!(dense.max(), 3.0);
        assert_eq!(sparse.max(), 3.0);
        assert_eq!(dense.get(1), sparse.get(1));
    }

    #[test]
    fn empty_counters_return_label_zero() {
        assert_eq!(VoteSlice::new(0).argmax(), 0);
        assert_eq!(VoteSlice::new(5).argmax(), 0);
        assert_eq!(VoteMap::new().argmax(), 0);
        assert_eq!(VoteSlice::new(0).max(), 0.0);
        assert_eq!(VoteMap::new().max(), 0.0);
    }

    #[test]
    fn dense_argmax_prefers_the_first_maximal_label() {
        let mut votes = VoteSlice::new(3);
        votes.add(0, 2.0);
        votes.add(2, 2.0);
        assert_eq!(votes.argmax(), 0);
    }

    #[test]
    fn clear_resets_to_zero() {
        let mut dense = VoteSlice::new(2);
        dense.add(1, 4.0);
        dense.clear();
        assert_eq!(dense.get(1), 0.0);

        let mut sparse = VoteMap::new();
        sparse.add(9, 4.0);
        sparse.clear();
        assert_eq!(sparse.get(9), 0.0);
        assert_eq!(sparse.argmax(), 0);
    }

    #[test]
    fn discard_ignores_everything() {
        let mut votes = DiscardVotes;
        votes.add(5, 10.0);
        assert_eq!(votes.get(5), 0.0);
        assert_eq!(votes.max(), 0.0);
        assert_eq!(votes.argmax(), 0);
    }
}
