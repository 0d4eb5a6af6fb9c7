//! LSH k-NN model for narrow vectors.
//!
//! Fitting hashes every data point to a bucket ID, then reorders the
//! dataset in place so each bucket is a contiguous slice: a stable sort of
//! an index permutation by bucket ID, applied with the cycle-following
//! in-place reorder, followed by one grouping scan over the sorted IDs.
//! Points with equal hashes keep their original relative order.
//!
//! Queries run the two-stage search in [`super::nearest`]: exact bucket
//! first, hash-nearest buckets second.

use std::collections::HashMap;

use crate::model::ModelOptions;
use crate::reorder::{group_sorted, reorder_in_place, IndexRange};
use crate::votes::VoteCounter;

use super::hashes::Hash;
use super::nearest::nearest;

/// An LSH k-NN model over `u64` feature vectors.
///
/// Wraps an exact [`Model`](crate::Model) whose dataset has been reordered
/// bucket-contiguously, plus the bucket table and the bucket-heap scratch.
pub struct Model<H> {
    /// The exact model over the reordered dataset; holds labels, values,
    /// the weighting regime and the neighbor-heap scratch.
    pub inner: crate::Model,
    /// The hash mapping points to bucket IDs.
    pub hash: H,
    /// All bucket IDs, ascending.
    pub bucket_ids: Vec<u64>,
    /// Each bucket's contiguous range in the reordered dataset.
    pub buckets: HashMap<u64, IndexRange>,

    pub(crate) heap_bucket_distances: Vec<u32>,
    pub(crate) heap_bucket_ids: Vec<u64>,
}

impl<H: Hash> Model<H> {
    /// Builds an LSH k-NN model by bucketing `data` under `hash`.
    ///
    /// The dataset (with its labels and values) is reordered in place so
    /// that every bucket occupies one contiguous slice; within a bucket,
    /// points keep their original relative order.
    ///
    /// # Panics
    ///
    /// Panics if `labels` (or `values`, when set) does not match the length
    /// of `data`.
    #[must_use]
    pub fn fit(data: Vec<u64>, labels: Vec<usize>, hash: H, opts: ModelOptions) -> Self {
        let mut inner = crate::Model::fit(data, labels, opts);

        let mut bucket_of = vec![0u64; inner.data.len()];
        hash.hash_many(&inner.data, &mut bucket_of);

        // Stable sort, so equal hashes keep insertion order.
        let mut order: Vec<usize> = (0..inner.data.len()).collect();
        order.sort_by_key(|&i| bucket_of[i]);

        {
            let crate::Model {
                data,
                labels,
                values,
                ..
            } = &mut inner;
            let mut values = values.as_mut();
            reorder_in_place(
                |i, j| {
                    bucket_of.swap(i, j);
                    data.swap(i, j);
                    labels.swap(i, j);
                    if let Some(values) = values.as_deref_mut() {
                        values.swap(i, j);
                    }
                },
                &order,
            );
        }

        let (buckets, bucket_ids) = group_sorted(&bucket_of);

        Self {
            inner,
            hash,
            bucket_ids,
            buckets,
            heap_bucket_distances: Vec::new(),
            heap_bucket_ids: Vec::new(),
        }
    }

    /// Ensures the neighbor-heap and bucket-heap scratch have room for k+1
    /// entries each.
    pub fn preallocate_heap(&mut self, k: usize) {
        if self.heap_bucket_distances.len() < k + 1 {
            self.heap_bucket_distances.resize(k + 1, 0);
        }
        if self.heap_bucket_ids.len() < k + 1 {
            self.heap_bucket_ids.resize(k + 1, 0);
        }
        self.inner.preallocate_heap(k);
    }

    /// Finds the approximate k nearest neighbors of `x`, reusing the
    /// model's scratch.
    pub fn find(&mut self, k: usize, x: u64) -> (&[u32], &[usize]) {
        self.preallocate_heap(k);
        let x_hash = self.hash.hash_one(x);
        let (m, _) = nearest(
            &self.inner.data,
            &self.bucket_ids,
            &self.buckets,
            k,
            x_hash,
            x,
            &mut self.heap_bucket_distances,
            &mut self.heap_bucket_ids,
            &mut self.inner.heap_distances,
            &mut self.inner.heap_indices,
        );
        (
            &self.inner.heap_distances[..m],
            &self.inner.heap_indices[..m],
        )
    }

    /// [`Model::find`] with caller-supplied scratch slices of length ≥ k+1.
    ///
    /// Returns the number of neighbors found.
    #[allow(clippy::too_many_arguments)]
    pub fn find_into(
        &self,
        k: usize,
        x: u64,
        bucket_distances: &mut [u32],
        bucket_ids: &mut [u64],
        distances: &mut [u32],
        indices: &mut [usize],
    ) -> usize {
        let x_hash = self.hash.hash_one(x);
        let (m, _) = nearest(
            &self.inner.data,
            &self.bucket_ids,
            &self.buckets,
            k,
            x_hash,
            x,
            bucket_distances,
            bucket_ids,
            distances,
            indices,
        );
        m
    }

    /// Predicts the label of `x` by tallying the approximate k nearest
    /// neighbors into `votes`, reusing the model's scratch. Returns the
    /// number of contributing neighbors.
    pub fn predict<V: VoteCounter>(&mut self, k: usize, x: u64, votes: &mut V) -> usize {
        self.preallocate_heap(k);
        let x_hash = self.hash.hash_one(x);
        let (m, _) = nearest(
            &self.inner.data,
            &self.bucket_ids,
            &self.buckets,
            k,
            x_hash,
            x,
            &mut self.heap_bucket_distances,
            &mut self.heap_bucket_ids,
            &mut self.inner.heap_distances,
            &mut self.inner.heap_indices,
        );
        self.inner.vote(
            m,
            &self.inner.heap_distances,
            &self.inner.heap_indices,
            votes,
        );
        m
    }

    /// [`Model::predict`] with caller-supplied scratch slices of length
    /// ≥ k+1 each.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_into<V: VoteCounter>(
        &self,
        k: usize,
        x: u64,
        bucket_distances: &mut [u32],
        bucket_ids: &mut [u64],
        distances: &mut [u32],
        indices: &mut [usize],
        votes: &mut V,
    ) -> usize {
        let m = self.find_into(k, x, bucket_distances, bucket_ids, distances, indices);
        self.inner.vote(m, distances, indices, votes);
        m
    }

    /// [`Model::predict`], allocating fresh scratch per call.
    pub fn predict_alloc<V: VoteCounter>(&self, k: usize, x: u64, votes: &mut V) -> usize {
        let mut bucket_distances = vec![0u32; k + 1];
        let mut bucket_ids = vec![0u64; k + 1];
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];
        self.predict_into(
            k,
            x,
            &mut bucket_distances,
            &mut bucket_ids,
            &mut distances,
            &mut indices,
            votes,
        )
    }
}
