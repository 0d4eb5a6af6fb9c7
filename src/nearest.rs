//! Exact top-k selectors over Hamming distance.
//!
//! A selector scans a dataset, keeps the k nearest points in a bounded
//! max-heap over caller-supplied scratch slices, and returns the number of
//! neighbors found. The scan has two phases: fill the heap with the first
//! min(k, n) points, then sweep the tail skipping every candidate whose
//! distance is not strictly below the current kth-nearest distance. Ties are
//! broken first-seen-wins: a later candidate at an equal distance is
//! skipped.
//!
//! On return, `distances[..m]` and `indices[..m]` hold the result in
//! internal heap order (not sorted); cells beyond `m` contain transient heap
//! state.

use crate::distance::{hamming, hamming_batch, hamming_wide};
use crate::heap::BoundedMaxHeap;

/// Finds the k nearest neighbors of `x` in `data` by Hamming distance.
///
/// Writes distances and dataset indices into the scratch slices and returns
/// the number of neighbors found, `min(k, data.len())`.
///
/// # Panics
///
/// Panics if `distances` or `indices` is shorter than k+1.
pub fn nearest(
    data: &[u64],
    k: usize,
    x: u64,
    distances: &mut [u32],
    indices: &mut [usize],
) -> usize {
    if k == 0 {
        return 0;
    }
    assert!(
        distances.len() > k && indices.len() > k,
        "scratch slices must have length at least k+1"
    );
    let mut heap = BoundedMaxHeap::new(&mut distances[..k + 1], &mut indices[..k + 1]);

    let k0 = k.min(data.len());
    for (i, &d) in data[..k0].iter().enumerate() {
        heap.push(hamming(x, d), i);
    }
    if k0 < k {
        return k0;
    }

    let mut max_dist = heap.root_distance();
    for (i, &d) in data.iter().enumerate().skip(k) {
        let dist = hamming(x, d);
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, i);
        max_dist = heap.root_distance();
    }
    k
}

/// [`nearest`], but for wide data.
///
/// # Panics
///
/// Panics if `distances` or `indices` is shorter than k+1.
pub fn nearest_wide(
    data: &[Vec<u64>],
    k: usize,
    x: &[u64],
    distances: &mut [u32],
    indices: &mut [usize],
) -> usize {
    if k == 0 {
        return 0;
    }
    assert!(
        distances.len() > k && indices.len() > k,
        "scratch slices must have length at least k+1"
    );
    let mut heap = BoundedMaxHeap::new(&mut distances[..k + 1], &mut indices[..k + 1]);

    let k0 = k.min(data.len());
    for (i, d) in data[..k0].iter().enumerate() {
        heap.push(hamming_wide(x, d), i);
    }
    if k0 < k {
        return k0;
    }

    let mut max_dist = heap.root_distance();
    for (i, d) in data.iter().enumerate().skip(k) {
        let dist = hamming_wide(x, d);
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, i);
        max_dist = heap.root_distance();
    }
    k
}

/// [`nearest_wide`], but batched through [`hamming_batch`].
///
/// The tail of the dataset is processed in `batch.len()`-sized chunks: each
/// chunk's distances are computed in one batch call (the vectorisation
/// seam), then fed through the usual guarded push-pop. The final partial
/// chunk is handled the same way. Results are identical to [`nearest_wide`]
/// for every batch length.
///
/// # Panics
///
/// Panics if `batch` is shorter than k, or if `distances`/`indices` is
/// shorter than k+1.
pub fn nearest_wide_batch(
    data: &[Vec<u64>],
    k: usize,
    x: &[u64],
    batch: &mut [u32],
    distances: &mut [u32],
    indices: &mut [usize],
) -> usize {
    if k == 0 || data.is_empty() {
        return 0;
    }
    assert!(batch.len() >= k, "batch scratch must have length at least k");
    assert!(
        distances.len() > k && indices.len() > k,
        "scratch slices must have length at least k+1"
    );
    let mut heap = BoundedMaxHeap::new(&mut distances[..k + 1], &mut indices[..k + 1]);

    let k0 = k.min(data.len());
    hamming_batch(x, &data[..k0], &mut batch[..k0]);
    for i in 0..k0 {
        heap.push(batch[i], i);
    }
    if data.len() <= k {
        return k0;
    }

    let mut max_dist = heap.root_distance();

    let b = batch.len();
    let mut i = k;
    while i + b <= data.len() {
        hamming_batch(x, &data[i..i + b], batch);
        for (j, &dist) in batch.iter().enumerate() {
            if dist >= max_dist {
                continue;
            }
            heap.push_pop(dist, i + j);
            max_dist = heap.root_distance();
        }
        i += b;
    }

    let remainder = data.len() - i;
    if remainder == 0 {
        return k;
    }
    hamming_batch(x, &data[i..], &mut batch[..remainder]);
    for (j, &dist) in batch[..remainder].iter().enumerate() {
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, i + j);
        max_dist = heap.root_distance();
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Reference: full stable sort by (distance, index).
    fn k_smallest(data: &[u64], k: usize, x: u64) -> Vec<(u32, usize)> {
        let mut all: Vec<(u32, usize)> = data
            .iter()
            .enumerate()
            .map(|(i, &d)| (hamming(x, d), i))
            .collect();
        all.sort_by_key(|&(d, i)| (d, i));
        all.truncate(k);
        all
    }

    fn sorted_result(distances: &[u32], indices: &[usize], m: usize) -> Vec<(u32, usize)> {
        let mut out: Vec<(u32, usize)> = distances[..m]
            .iter()
            .copied()
            .zip(indices[..m].iter().copied())
            .collect();
        out.sort_by_key(|&(d, i)| (d, i));
        out
    }

    #[test]
    fn matches_reference_on_random_data() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in [1usize, 2, 7, 33, 200] {
            let data: Vec<u64> = (0..n).map(|_| rng.gen()).collect();
            for k in [1usize, 2, 3, 10] {
                let x: u64 = rng.gen();
                let mut distances = vec![0u32; k + 1];
                let mut indices = vec![0usize; k + 1];
                let m = nearest(&data, k, x, &mut distances, &mut indices);
                assert_eq!(m, k.min(n));
                assert_eq!(
                    sorted_result(&distances, &indices, m),
                    k_smallest(&data, k, x)
                );
            }
        }
    }

    #[test]
    fn ties_go_to_the_first_seen() {
        // All points equidistant from the query.
        let data = vec![0b0001u64, 0b0010, 0b0100, 0b1000];
        let mut distances = vec![0u32; 3];
        let mut indices = vec![0usize; 3];
        let m = nearest(&data, 2, 0, &mut distances, &mut indices);
        assert_eq!(m, 2);
        let mut kept = indices[..m].to_vec();
        kept.sort_unstable();
        assert_eq!(kept, [0, 1]);
    }

    #[test]
    fn k_zero_returns_nothing() {
        let data = vec![1u64, 2, 3];
        let mut distances = vec![0u32; 1];
        let mut indices = vec![0usize; 1];
        assert_eq!(nearest(&data, 0, 7, &mut distances, &mut indices), 0);
    }

    #[test]
    fn small_dataset_returns_actual_count() {
        let data = vec![0u64, u64::MAX];
        let mut distances = vec![0u32; 6];
        let mut indices = vec![0usize; 6];
        let m = nearest(&data, 5, 3, &mut distances, &mut indices);
        assert_eq!(m, 2);
        assert_eq!(
            sorted_result(&distances, &indices, m),
            vec![(2, 0), (62, 1)]
        );
    }

    #[test]
    fn empty_dataset_returns_zero() {
        let mut distances = vec![0u32; 4];
        let mut indices = vec![0usize; 4];
        assert_eq!(nearest(&[], 3, 7, &mut distances, &mut indices), 0);
    }

    #[test]
    fn wide_agrees_with_narrow_on_single_words() {
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<u64> = (0..50).map(|_| rng.gen()).collect();
        let wide: Vec<Vec<u64>> = data.iter().map(|&d| vec![d]).collect();
        let x: u64 = rng.gen();
        let k = 5;

        let mut dn = vec![0u32; k + 1];
        let mut in_ = vec![0usize; k + 1];
        let mn = nearest(&data, k, x, &mut dn, &mut in_);

        let mut dw = vec![0u32; k + 1];
        let mut iw = vec![0usize; k + 1];
        let mw = nearest_wide(&wide, k, &[x], &mut dw, &mut iw);

        assert_eq!(mn, mw);
        assert_eq!(
            sorted_result(&dn, &in_, mn),
            sorted_result(&dw, &iw, mw)
        );
    }

    #[test]
    fn batch_variant_agrees_for_every_chunk_alignment() {
        let mut rng = StdRng::seed_from_u64(99);
        let dim = 3;
        let data: Vec<Vec<u64>> = (0..67)
            .map(|_| (0..dim).map(|_| rng.gen()).collect())
            .collect();
        let x: Vec<u64> = (0..dim).map(|_| rng.gen()).collect();
        let k = 6;

        let mut dref = vec![0u32; k + 1];
        let mut iref = vec![0usize; k + 1];
        let mref = nearest_wide(&data, k, &x, &mut dref, &mut iref);
        let expected = sorted_result(&dref, &iref, mref);

        for batch_len in [k, k + 1, 13, 32, 67, 100] {
            let mut batch = vec![0u32; batch_len];
            let mut dv = vec![0u32; k + 1];
            let mut iv = vec![0usize; k + 1];
            let mv = nearest_wide_batch(&data, k, &x, &mut batch, &mut dv, &mut iv);
            assert_eq!(mv, mref, "batch_len={batch_len}");
            assert_eq!(sorted_result(&dv, &iv, mv), expected, "batch_len={batch_len}");
        }
    }
}
