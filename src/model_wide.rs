//! Exact k-NN model for wide (`&[u64]`) feature vectors.
//!
//! A wide model stores the rows and delegates labels, vote values, the
//! weighting regime and the heap scratch to an inner narrow [`Model`] with
//! an empty dataset, so the voting logic exists once. The extra entry
//! points here are the batch variants: they route the scan through the
//! [`crate::distance::hamming_batch`] contract in fixed-size chunks, which
//! is where a vectorised distance kernel pays off.

use crate::model::{Model, ModelOptions};
use crate::nearest::{nearest_wide, nearest_wide_batch};
use crate::votes::VoteCounter;

/// An exact k-NN model over fixed-width slices of `u64` words.
///
/// All rows must share one width; mismatched rows are a precondition
/// violation.
pub struct WideModel {
    /// Label, value, weighting and scratch configuration; `narrow.data` is
    /// empty.
    pub narrow: Model,
    /// Input data points.
    pub data: Vec<Vec<u64>>,

    batch: Vec<u32>,
}

impl WideModel {
    /// Builds a wide k-NN model from data rows and their labels.
    ///
    /// # Panics
    ///
    /// Panics if `labels` (or `values`, when set) does not match the number
    /// of rows.
    #[must_use]
    pub fn fit(data: Vec<Vec<u64>>, labels: Vec<usize>, opts: ModelOptions) -> Self {
        assert_eq!(data.len(), labels.len(), "one label per data point");
        if let Some(values) = &opts.values {
            assert_eq!(data.len(), values.len(), "one value per data point");
        }
        let narrow = Model {
            data: Vec::new(),
            labels,
            values: opts.values,
            weighting: opts.weighting,
            heap_distances: Vec::new(),
            heap_indices: Vec::new(),
        };
        Self {
            narrow,
            data,
            batch: Vec::new(),
        }
    }

    /// Ensures the heap scratch has room for k+1 entries.
    pub fn preallocate_heap(&mut self, k: usize) {
        self.narrow.preallocate_heap(k);
    }

    fn preallocate_batch(&mut self, k: usize) {
        // A chunk per 64 rows amortises the batch-call overhead; never less
        // than k, which the chunked selector requires for its initial fill.
        let want = k.max(64);
        if self.batch.len() < want {
            self.batch.resize(want, 0);
        }
    }

    /// Finds the k nearest neighbors of `x`, reusing the model's scratch.
    pub fn find(&mut self, k: usize, x: &[u64]) -> (&[u32], &[usize]) {
        self.preallocate_heap(k);
        let m = nearest_wide(
            &self.data,
            k,
            x,
            &mut self.narrow.heap_distances,
            &mut self.narrow.heap_indices,
        );
        (
            &self.narrow.heap_distances[..m],
            &self.narrow.heap_indices[..m],
        )
    }

    /// [`WideModel::find`], but batched through the batch-distance contract.
    pub fn find_batch(&mut self, k: usize, x: &[u64]) -> (&[u32], &[usize]) {
        self.preallocate_heap(k);
        self.preallocate_batch(k);
        let m = nearest_wide_batch(
            &self.data,
            k,
            x,
            &mut self.batch,
            &mut self.narrow.heap_distances,
            &mut self.narrow.heap_indices,
        );
        (
            &self.narrow.heap_distances[..m],
            &self.narrow.heap_indices[..m],
        )
    }

    /// Finds the k nearest neighbors of `x` using caller-supplied scratch
    /// slices of length ≥ k+1. Returns the number of neighbors found.
    pub fn find_into(
        &self,
        k: usize,
        x: &[u64],
        distances: &mut [u32],
        indices: &mut [usize],
    ) -> usize {
        nearest_wide(&self.data, k, x, distances, indices)
    }

    /// [`WideModel::find_into`], batched; `batch` must have length ≥ k.
    pub fn find_batch_into(
        &self,
        k: usize,
        x: &[u64],
        batch: &mut [u32],
        distances: &mut [u32],
        indices: &mut [usize],
    ) -> usize {
        nearest_wide_batch(&self.data, k, x, batch, distances, indices)
    }

    /// Predicts the label of `x` by tallying the k nearest neighbors into
    /// `votes`, reusing the model's scratch. Returns the number of
    /// contributing neighbors.
    pub fn predict<V: VoteCounter>(&mut self, k: usize, x: &[u64], votes: &mut V) -> usize {
        self.preallocate_heap(k);
        let m = nearest_wide(
            &self.data,
            k,
            x,
            &mut self.narrow.heap_distances,
            &mut self.narrow.heap_indices,
        );
        self.narrow
            .vote(m, &self.narrow.heap_distances, &self.narrow.heap_indices, votes);
        m
    }

    /// [`WideModel::predict`], batched through the batch-distance contract.
    pub fn predict_batch<V: VoteCounter>(&mut self, k: usize, x: &[u64], votes: &mut V) -> usize {
        self.preallocate_heap(k);
        self.preallocate_batch(k);
        let m = nearest_wide_batch(
            &self.data,
            k,
            x,
            &mut self.batch,
            &mut self.narrow.heap_distances,
            &mut self.narrow.heap_indices,
        );
        self.narrow
            .vote(m, &self.narrow.heap_distances, &self.narrow.heap_indices, votes);
        m
    }

    /// [`WideModel::predict`] with caller-supplied scratch slices of length
    /// ≥ k+1.
    pub fn predict_into<V: VoteCounter>(
        &self,
        k: usize,
        x: &[u64],
        distances: &mut [u32],
        indices: &mut [usize],
        votes: &mut V,
    ) -> usize {
        let m = nearest_wide(&self.data, k, x, distances, indices);
        self.narrow.vote(m, distances, indices, votes);
        m
    }

    /// [`WideModel::predict_into`], batched; `batch` must have length ≥ k.
    pub fn predict_batch_into<V: VoteCounter>(
        &self,
        k: usize,
        x: &[u64],
        batch: &mut [u32],
        distances: &mut [u32],
        indices: &mut [usize],
        votes: &mut V,
    ) -> usize {
        let m = nearest_wide_batch(&self.data, k, x, batch, distances, indices);
        self.narrow.vote(m, distances, indices, votes);
        m
    }

    /// [`WideModel::predict`], allocating fresh scratch per call.
    pub fn predict_alloc<V: VoteCounter>(&self, k: usize, x: &[u64], votes: &mut V) -> usize {
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];
        self.predict_into(k, x, &mut distances, &mut indices, votes)
    }
}
