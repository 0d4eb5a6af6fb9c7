//! LSH k-NN model for wide vectors.

use std::collections::HashMap;

use crate::model::ModelOptions;
use crate::model_wide::WideModel;
use crate::reorder::{group_sorted, reorder_in_place, IndexRange};
use crate::votes::VoteCounter;

use super::hashes_wide::HashWide;
use super::nearest_wide::nearest_wide;

/// An LSH k-NN model over fixed-width slices of `u64` words.
///
/// Wraps an exact [`WideModel`] whose rows have been reordered
/// bucket-contiguously; the wide model in turn keeps labels, values and the
/// weighting regime in its narrow sub-model, so ownership stays
/// tree-shaped.
pub struct Model<H> {
    /// The exact wide model over the reordered rows.
    pub inner: WideModel,
    /// The hash mapping rows to bucket IDs.
    pub hash: H,
    /// All bucket IDs, ascending.
    pub bucket_ids: Vec<u64>,
    /// Each bucket's contiguous range in the reordered rows.
    pub buckets: HashMap<u64, IndexRange>,

    heap_bucket_distances: Vec<u32>,
    heap_bucket_ids: Vec<u64>,
}

impl<H: HashWide> Model<H> {
    /// Builds a wide LSH k-NN model by bucketing `data` under `hash`.
    ///
    /// The rows (with their labels and values) are reordered in place so
    /// that every bucket occupies one contiguous slice; within a bucket,
    /// rows keep their original relative order.
    ///
    /// # Panics
    ///
    /// Panics if `labels` (or `values`, when set) does not match the number
    /// of rows.
    #[must_use]
    pub fn fit(data: Vec<Vec<u64>>, labels: Vec<usize>, hash: H, opts: ModelOptions) -> Self {
        let mut inner = WideModel::fit(data, labels, opts);

        let mut bucket_of = vec![0u64; inner.data.len()];
        hash.hash_many_wide(&inner.data, &mut bucket_of);

        let mut order: Vec<usize> = (0..inner.data.len()).collect();
        order.sort_by_key(|&i| bucket_of[i]);

        {
            let data = &mut inner.data;
            let labels = &mut inner.narrow.labels;
            let mut values = inner.narrow.values.as_mut();
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
    pub fn find(&mut self, k: usize, x: &[u64]) -> (&[u32], &[usize]) {
        self.preallocate_heap(k);
        let x_hash = self.hash.hash_one_wide(x);
        let (m, _) = nearest_wide(
            &self.inner.data,
            &self.bucket_ids,
            &self.buckets,
            k,
            x_hash,
            x,
            &mut self.heap_bucket_distances,
            &mut self.heap_bucket_ids,
            &mut self.inner.narrow.heap_distances,
            &mut self.inner.narrow.heap_indices,
        );
        (
            &self.inner.narrow.heap_distances[..m],
            &self.inner.narrow.heap_indices[..m],
        )
    }

    /// [`Model::find`] with caller-supplied scratch slices of length ≥ k+1.
    ///
    /// Returns the number of neighbors found.
    #[allow(clippy::too_many_arguments)]
    pub fn find_into(
        &self,
        k: usize,
        x: &[u64],
        bucket_distances: &mut [u32],
        bucket_ids: &mut [u64],
        distances: &mut [u32],
        indices: &mut [usize],
    ) -> usize {
        let x_hash = self.hash.hash_one_wide(x);
        let (m, _) = nearest_wide(
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
    pub fn predict<V: VoteCounter>(&mut self, k: usize, x: &[u64], votes: &mut V) -> usize {
        self.preallocate_heap(k);
        let x_hash = self.hash.hash_one_wide(x);
        let (m, _) = nearest_wide(
            &self.inner.data,
            &self.bucket_ids,
            &self.buckets,
            k,
            x_hash,
            x,
            &mut self.heap_bucket_distances,
            &mut self.heap_bucket_ids,
            &mut self.inner.narrow.heap_distances,
            &mut self.inner.narrow.heap_indices,
        );
        self.inner.narrow.vote(
            m,
            &self.inner.narrow.heap_distances,
            &self.inner.narrow.heap_indices,
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
        x: &[u64],
        bucket_distances: &mut [u32],
        bucket_ids: &mut [u64],
        distances: &mut [u32],
        indices: &mut [usize],
        votes: &mut V,
    ) -> usize {
        let m = self.find_into(k, x, bucket_distances, bucket_ids, distances, indices);
        self.inner.narrow.vote(m, distances, indices, votes);
        m
    }

    /// [`Model::predict`], allocating fresh scratch per call.
    pub fn predict_alloc<V: VoteCounter>(&self, k: usize, x: &[u64], votes: &mut V) -> usize {
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
