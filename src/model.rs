//! Exact k-NN model for narrow (single `u64`) feature vectors.
//!
//! A model owns the dataset, its labels, optional per-point vote values, a
//! distance-weighting regime and the scratch buffers the selector works in.
//! Build once with [`Model::fit`], then query many times; scratch grows
//! monotonically to k+1 and is reused across queries, so `find`/`predict`
//! take `&mut self`. The `*_into` and `*_alloc` variants take `&self` and
//! leave buffer management to the caller, which keeps multiple threads over
//! one shared dataset ergonomic (each thread brings its own scratch).

use std::fmt;

use crate::nearest::nearest;
use crate::votes::VoteCounter;

/// Weight applied to a neighbor's vote as a function of its distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DistanceWeighting {
    /// Every neighbor contributes 1.
    #[default]
    None,
    /// `1 / (1 + d)`.
    Linear,
    /// `1 / (1 + d²)`.
    Quadratic,
    /// A caller-supplied function of the distance.
    Custom(fn(u32) -> f64),
}

impl fmt::Display for DistanceWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceWeighting::None => write!(f, "none"),
            DistanceWeighting::Linear => write!(f, "linear"),
            DistanceWeighting::Quadratic => write!(f, "quadratic"),
            DistanceWeighting::Custom(_) => write!(f, "custom"),
        }
    }
}

/// Linear distance decay, `1 / (1 + d)`.
#[inline]
#[must_use]
pub fn linear_decay(dist: u32) -> f64 {
    1.0 / (1.0 + f64::from(dist))
}

/// Quadratic distance decay, `1 / (1 + d²)`.
#[inline]
#[must_use]
pub fn quadratic_decay(dist: u32) -> f64 {
    1.0 / (1.0 + f64::from(dist) * f64::from(dist))
}

/// Configuration for [`Model::fit`] and the wide/LSH fits.
///
/// Options are order-independent; setting the same field twice keeps the
/// last value.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    pub(crate) values: Option<Vec<f64>>,
    pub(crate) weighting: DistanceWeighting,
}

impl ModelOptions {
    /// The default configuration: unweighted votes, no per-point values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a vote value to each data point; vote weights are multiplied
    /// by the neighbor's value.
    #[must_use]
    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = Some(values);
        self
    }

    /// Applies linear distance weighting, `1 / (1 + d)`.
    #[must_use]
    pub fn with_linear_weighting(mut self) -> Self {
        self.weighting = DistanceWeighting::Linear;
        self
    }

    /// Applies quadratic distance weighting, `1 / (1 + d²)`.
    #[must_use]
    pub fn with_quadratic_weighting(mut self) -> Self {
        self.weighting = DistanceWeighting::Quadratic;
        self
    }

    /// Applies a custom distance-weighting function.
    #[must_use]
    pub fn with_custom_weighting(mut self, f: fn(u32) -> f64) -> Self {
        self.weighting = DistanceWeighting::Custom(f);
        self
    }
}

/// An exact k-NN model over `u64` feature vectors.
pub struct Model {
    /// Input data points.
    pub data: Vec<u64>,
    /// Class label for each data point.
    pub labels: Vec<usize>,
    /// Optional vote value for each data point.
    pub values: Option<Vec<f64>>,
    /// Distance weighting regime.
    pub weighting: DistanceWeighting,

    pub(crate) heap_distances: Vec<u32>,
    pub(crate) heap_indices: Vec<usize>,
}

impl Model {
    /// Builds a k-NN model from data points and their labels.
    ///
    /// # Panics
    ///
    /// Panics if `labels` (or `values`, when set) does not match the length
    /// of `data`.
    #[must_use]
    pub fn fit(data: Vec<u64>, labels: Vec<usize>, opts: ModelOptions) -> Self {
        assert_eq!(data.len(), labels.len(), "one label per data point");
        if let Some(values) = &opts.values {
            assert_eq!(data.len(), values.len(), "one value per data point");
        }
        Self {
            data,
            labels,
            values: opts.values,
            weighting: opts.weighting,
            heap_distances: Vec::new(),
            heap_indices: Vec::new(),
        }
    }

    /// Ensures the internal heap scratch has room for k+1 entries.
    ///
    /// Scratch capacity only grows; it is never shrunk between queries.
    pub fn preallocate_heap(&mut self, k: usize) {
        if self.heap_distances.len() < k + 1 {
            self.heap_distances.resize(k + 1, 0);
        }
        if self.heap_indices.len() < k + 1 {
            self.heap_indices.resize(k + 1, 0);
        }
    }

    /// Finds the k nearest neighbors of `x`, reusing the model's scratch.
    ///
    /// Returns the distances and dataset indices of the neighbors found
    /// (internal heap order, not sorted).
    pub fn find(&mut self, k: usize, x: u64) -> (&[u32], &[usize]) {
        self.preallocate_heap(k);
        let m = nearest(
            &self.data,
            k,
            x,
            &mut self.heap_distances,
            &mut self.heap_indices,
        );
        (&self.heap_distances[..m], &self.heap_indices[..m])
    }

    /// Finds the k nearest neighbors of `x` using caller-supplied scratch.
    ///
    /// Returns the number of neighbors found; the results are in
    /// `distances[..m]`/`indices[..m]`.
    ///
    /// # Panics
    ///
    /// Panics if either slice is shorter than k+1.
    pub fn find_into(
        &self,
        k: usize,
        x: u64,
        distances: &mut [u32],
        indices: &mut [usize],
    ) -> usize {
        nearest(&self.data, k, x, distances, indices)
    }

    /// Predicts the label of `x` by tallying the k nearest neighbors into
    /// `votes`, reusing the model's scratch. Returns the number of
    /// contributing neighbors.
    pub fn predict<V: VoteCounter>(&mut self, k: usize, x: u64, votes: &mut V) -> usize {
        self.preallocate_heap(k);
        let m = nearest(
            &self.data,
            k,
            x,
            &mut self.heap_distances,
            &mut self.heap_indices,
        );
        self.vote(m, &self.heap_distances, &self.heap_indices, votes);
        m
    }

    /// [`Model::predict`] with caller-supplied scratch slices of length ≥ k+1.
    pub fn predict_into<V: VoteCounter>(
        &self,
        k: usize,
        x: u64,
        distances: &mut [u32],
        indices: &mut [usize],
        votes: &mut V,
    ) -> usize {
        let m = nearest(&self.data, k, x, distances, indices);
        self.vote(m, distances, indices, votes);
        m
    }

    /// [`Model::predict`], allocating fresh scratch per call.
    ///
    /// Takes `&self`, so independent callers can share one model if each
    /// brings its own vote counter.
    pub fn predict_alloc<V: VoteCounter>(&self, k: usize, x: u64, votes: &mut V) -> usize {
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];
        self.predict_into(k, x, &mut distances, &mut indices, votes)
    }

    /// Tallies the first `m` (distance, index) pairs into `votes` under the
    /// model's weighting regime.
    ///
    /// Each regime × values combination gets its own loop so the dispatch
    /// happens once per query, not once per neighbor.
    pub fn vote<V: VoteCounter>(
        &self,
        m: usize,
        distances: &[u32],
        indices: &[usize],
        votes: &mut V,
    ) {
        votes.clear();
        match (self.weighting, &self.values) {
            (DistanceWeighting::None, None) => {
                for &index in &indices[..m] {
                    votes.add(self.labels[index], 1.0);
                }
            }
            (DistanceWeighting::None, Some(values)) => {
                for &index in &indices[..m] {
                    votes.add(self.labels[index], values[index]);
                }
            }
            (DistanceWeighting::Linear, None) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(self.labels[index], linear_decay(distances[i]));
                }
            }
            (DistanceWeighting::Linear, Some(values)) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(self.labels[index], values[index] * linear_decay(distances[i]));
                }
            }
            (DistanceWeighting::Quadratic, None) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(self.labels[index], quadratic_decay(distances[i]));
                }
            }
            (DistanceWeighting::Quadratic, Some(values)) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(
                        self.labels[index],
                        values[index] * quadratic_decay(distances[i]),
                    );
                }
            }
            (DistanceWeighting::Custom(f), None) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(self.labels[index], f(distances[i]));
                }
            }
            (DistanceWeighting::Custom(f), Some(values)) => {
                for i in 0..m {
                    let index = indices[i];
                    votes.add(self.labels[index], values[index] * f(distances[i]));
                }
            }
        }
    }
}
