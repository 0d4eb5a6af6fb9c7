//! Locality-sensitive hashing for approximate k-NN in Hamming space.
//!
//! An LSH model trades exactness for probe volume: fitting buckets the
//! dataset by a locality-sensitive hash, and a query only scans its own
//! bucket plus the k buckets whose IDs are Hamming-nearest to its hash.
//! With a well-matched hash family most true neighbors share or nearly
//! share the query's bucket, so recall stays high while the scan touches a
//! small fraction of the dataset.
//!
//! ## Hash families
//!
//! - [`BitSample`] / [`BitSampleWide`]: keep a fixed subset of bit
//!   positions.
//! - [`MinHash`] / [`MinHashes`] / [`MinHashWide`]: min-wise hashing over a
//!   random bit-position permutation.
//! - [`Blur`] / [`BlurWide`]: threshold the overlap with a list of
//!   bitmasks.
//! - [`Compose`]: chain families; [`FirstWord`]: lift a narrow family to
//!   wide rows.
//! - [`Identity`] / [`ConstantZero`]: degenerate families. Identity turns
//!   the index into exact search over singleton buckets; constant-zero puts
//!   everything in one bucket. Both are useful as oracles in tests.
//!
//! ## References
//!
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards
//!   removing the curse of dimensionality"
//! - Gionis, Indyk & Motwani (1999): "Similarity search in high dimensions
//!   via hashing"
//! - Broder (1997): "On the resemblance and containment of documents"

mod hashes;
mod hashes_wide;
mod model;
mod model_wide;
mod nearest;
mod nearest_wide;

pub use hashes::{BitSample, Blur, Compose, ConstantZero, Hash, Identity, MinHash, MinHashes};
pub use hashes_wide::{BitSampleWide, BlurWide, FirstWord, HashWide, MinHashWide};
pub use model::Model;
pub use model_wide::Model as WideModel;
pub use nearest::nearest;
pub use nearest_wide::nearest_wide;
