//! bitnear: fast exact and approximate k-nearest-neighbor search for
//! binary feature vectors in Hamming space.
//!
//! Feature vectors are packed bits — a single `u64` ("narrow") or a
//! fixed-width slice of `u64` words ("wide") — and distance is the Hamming
//! distance, a popcount of an XOR. On top of the distance sit two query
//! engines and a voting layer:
//!
//! - **Exact search**: [`Model`] / [`WideModel`] scan the whole dataset
//!   through a bounded max-heap top-k selector.
//! - **Approximate search**: [`lsh::Model`] / [`lsh::WideModel`] bucket the
//!   dataset by a locality-sensitive hash at fit time, then scan only the
//!   query's bucket and the k hash-nearest buckets.
//! - **Voting**: a [`VoteCounter`] tallies the neighbors' labels under a
//!   [`DistanceWeighting`] regime, optionally scaled by per-point values.
//!
//! # Which engine should I use?
//!
//! | Situation | Recommendation |
//! |-----------|----------------|
//! | Small dataset (< ~100K points) | Exact [`Model`] — a linear popcount scan is hard to beat |
//! | Large dataset, recall can be < 100% | [`lsh::Model`] with a [`lsh::Blur`] or [`lsh::BitSample`] hash |
//! | Wide vectors, throughput-bound | [`WideModel::predict_batch`], which routes distances through the batch kernel |
//!
//! # Example
//!
//! ```rust
//! use bitnear::{Model, ModelOptions, VoteCounter, VoteSlice};
//!
//! let data = vec![0b1010, 0b1111, 0b0000];
//! let labels = vec![0, 1, 1];
//! let mut model = Model::fit(data, labels, ModelOptions::new().with_linear_weighting());
//!
//! let mut votes = VoteSlice::new(2);
//! model.predict(2, 0b1011, &mut votes);
//! assert_eq!(votes.argmax(), 0);
//! ```
//!
//! # Critical nuances
//!
//! - A model reuses internal scratch buffers across queries, so `find` and
//!   `predict` take `&mut self` and one model must not be shared across
//!   threads. The `*_into`/`*_alloc` variants take `&self`; give each
//!   thread its own scratch (or its own model over a shared dataset) and
//!   queries parallelise freely.
//! - LSH fitting reorders the dataset in place so each bucket is one
//!   contiguous slice; neighbor indices refer to the reordered dataset.
//! - Ties at the kth distance go to the point seen first in dataset order.
//!
//! Failures are precondition violations (scratch shorter than k+1,
//! mismatched row widths, label/value lengths) and panic; semantically
//! small inputs — empty datasets, k larger than the dataset, empty buckets
//! — are defined behaviour and simply return fewer neighbors.

pub mod distance;
pub mod lsh;
pub mod pack;

mod heap;
mod model;
mod model_wide;
mod nearest;
mod reorder;
mod votes;

pub use model::{linear_decay, quadratic_decay, DistanceWeighting, Model, ModelOptions};
pub use model_wide::WideModel;
pub use nearest::{nearest, nearest_wide, nearest_wide_batch};
pub use reorder::IndexRange;
pub use votes::{DiscardVotes, VoteCounter, VoteMap, VoteSlice};
