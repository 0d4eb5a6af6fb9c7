//! Two-stage approximate nearest-neighbor search for narrow vectors.
//!
//! Stage one scans the query's exact bucket, the cheapest and usually
//! highest-recall source of neighbors. If that already yields k, the search
//! stops. Otherwise stage two ranks all bucket IDs by Hamming distance to
//! the query's hash with a second bounded heap — the locality-sensitive
//! intuition operationalised: similar points tend to land in buckets whose
//! IDs are close — and probes the k nearest buckets, carrying the neighbor
//! heap over from stage one. Total work is bounded by k times the largest
//! bucket.

use std::collections::HashMap;

use crate::distance::hamming;
use crate::heap::BoundedMaxHeap;
use crate::reorder::IndexRange;

/// Finds the k nearest neighbors of `x` within the buckets nearest to its
/// hash `x_hash`.
///
/// `data` is the bucket-contiguous (reordered) dataset; `bucket_ids` and
/// `buckets` describe the bucket table. The four scratch slices must each
/// have length ≥ k+1.
///
/// Returns `(found, examined)`: the number of neighbors in
/// `distances[..found]`/`indices[..found]`, and the total number of data
/// points scanned.
#[allow(clippy::too_many_arguments)]
pub fn nearest(
    data: &[u64],
    bucket_ids: &[u64],
    buckets: &HashMap<u64, IndexRange>,
    k: usize,
    x_hash: u64,
    x: u64,
    bucket_distances: &mut [u32],
    heap_bucket_ids: &mut [u64],
    distances: &mut [u32],
    indices: &mut [usize],
) -> (usize, usize) {
    if k == 0 {
        return (0, 0);
    }
    assert!(
        distances.len() > k
            && indices.len() > k
            && bucket_distances.len() > k
            && heap_bucket_ids.len() > k,
        "scratch slices must have length at least k+1"
    );
    let mut heap = BoundedMaxHeap::new(&mut distances[..k + 1], &mut indices[..k + 1]);
    let exact_bucket = buckets.get(&x_hash).copied().unwrap_or_default();
    let examined = exact_bucket.length;
    nearest_in_bucket(data, exact_bucket, k, x, &mut heap);

    // The exact bucket alone was enough.
    if heap.len() == k {
        return (k, examined);
    }

    let selected = {
        let mut bucket_heap = BoundedMaxHeap::new(
            &mut bucket_distances[..k + 1],
            &mut heap_bucket_ids[..k + 1],
        );
        nearest_buckets(bucket_ids, k, x_hash, &mut bucket_heap);
        bucket_heap.len()
    };
    let scanned = nearest_in_buckets(
        data,
        &heap_bucket_ids[..selected],
        buckets,
        k,
        x,
        x_hash,
        &mut heap,
    );

    (heap.len(), examined + scanned)
}

/// Runs the top-k scan over a single bucket's slice of the dataset.
pub(super) fn nearest_in_bucket(
    data: &[u64],
    b: IndexRange,
    k: usize,
    x: u64,
    heap: &mut BoundedMaxHeap<usize>,
) {
    if b.length == 0 {
        return;
    }

    let end = b.offset + b.length;
    let end0 = b.offset + b.length.min(k);

    for i in b.offset..end0 {
        heap.push(hamming(x, data[i]), i);
    }
    if b.length < k {
        return;
    }

    let mut max_dist = heap.root_distance();
    for i in (b.offset + k)..end {
        let dist = hamming(x, data[i]);
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, i);
        max_dist = heap.root_distance();
    }
}

/// Scans the selected buckets, skipping the exact bucket, improving the
/// carried-over neighbor heap. Entries are pushed until the heap is full,
/// then the usual root-distance guard applies.
///
/// Returns the number of points examined.
pub(super) fn nearest_in_buckets(
    data: &[u64],
    in_buckets: &[u64],
    buckets: &HashMap<u64, IndexRange>,
    k: usize,
    x: u64,
    x_hash: u64,
    heap: &mut BoundedMaxHeap<usize>,
) -> usize {
    let mut filled = heap.len();
    let mut max_dist = if filled > 0 { heap.root_distance() } else { 0 };
    let mut examined = 0;
    for &bid in in_buckets {
        // The exact bucket was already scanned in stage one.
        if bid == x_hash {
            continue;
        }
        let b = buckets.get(&bid).copied().unwrap_or_default();
        let end = b.offset + b.length;
        examined += b.length;
        if filled >= k {
            for i in b.offset..end {
                let dist = hamming(x, data[i]);
                if dist >= max_dist {
                    continue;
                }
                heap.push_pop(dist, i);
                max_dist = heap.root_distance();
            }
            continue;
        }
        for i in b.offset..end {
            let dist = hamming(x, data[i]);
            if filled < k {
                heap.push(dist, i);
                max_dist = heap.root_distance();
                filled += 1;
                continue;
            }
            if dist >= max_dist {
                continue;
            }
            heap.push_pop(dist, i);
            max_dist = heap.root_distance();
        }
    }
    examined
}

/// Keeps the k bucket IDs nearest to `x_hash` by Hamming distance.
pub(super) fn nearest_buckets(
    bucket_ids: &[u64],
    k: usize,
    x_hash: u64,
    heap: &mut BoundedMaxHeap<u64>,
) {
    let k0 = k.min(bucket_ids.len());
    for &bid in &bucket_ids[..k0] {
        heap.push(hamming(x_hash, bid), bid);
    }
    if k0 < k {
        return;
    }
    let mut max_dist = heap.root_distance();
    for &bid in &bucket_ids[k0..] {
        let dist = hamming(x_hash, bid);
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, bid);
        max_dist = heap.root_distance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_table(
        ranges: &[(u64, usize, usize)],
    ) -> (Vec<u64>, HashMap<u64, IndexRange>) {
        let ids: Vec<u64> = ranges.iter().map(|&(id, _, _)| id).collect();
        let map = ranges
            .iter()
            .map(|&(id, offset, length)| (id, IndexRange { offset, length }))
            .collect();
        (ids, map)
    }

    #[test]
    fn exact_bucket_short_circuits_when_full() {
        // Bucket 0 holds the first three points, bucket 1 the fourth.
        let data = vec![0b0000u64, 0b0001, 0b0011, 0b1111];
        let (ids, map) = bucket_table(&[(0, 0, 3), (1, 3, 1)]);

        let k = 2;
        let mut bd = vec![0u32; k + 1];
        let mut bi = vec![0u64; k + 1];
        let mut d = vec![0u32; k + 1];
        let mut i = vec![0usize; k + 1];
        let (found, examined) = nearest(&data, &ids, &map, k, 0, 0, &mut bd, &mut bi, &mut d, &mut i);

        assert_eq!(found, 2);
        // Only the exact bucket was scanned.
        assert_eq!(examined, 3);
        let mut kept = i[..found].to_vec();
        kept.sort_unstable();
        assert_eq!(kept, [0, 1]);
    }

    #[test]
    fn falls_through_to_nearest_buckets_when_exact_is_small() {
        let data = vec![0b0000u64, 0b1110, 0b1111];
        let (ids, map) = bucket_table(&[(0, 0, 1), (0b1110, 1, 2)]);

        let k = 2;
        let mut bd = vec![0u32; k + 1];
        let mut bi = vec![0u64; k + 1];
        let mut d = vec![0u32; k + 1];
        let mut i = vec![0usize; k + 1];
        let (found, examined) = nearest(&data, &ids, &map, k, 0, 0, &mut bd, &mut bi, &mut d, &mut i);

        assert_eq!(found, 2);
        // Exact bucket (1 point) plus the probed second bucket (2 points).
        assert_eq!(examined, 3);
        let mut kept = i[..found].to_vec();
        kept.sort_unstable();
        assert_eq!(kept, [0, 1]);
    }

    #[test]
    fn missing_exact_bucket_probes_neighbors() {
        // Query hash has no bucket of its own.
        let data = vec![0b0111u64, 0b1000];
        let (ids, map) = bucket_table(&[(0b0111, 0, 1), (0b1000, 1, 1)]);

        let k = 1;
        let mut bd = vec![0u32; k + 1];
        let mut bi = vec![0u64; k + 1];
        let mut d = vec![0u32; k + 1];
        let mut i = vec![0usize; k + 1];
        let (found, examined) =
            nearest(&data, &ids, &map, k, 0b0011, 0b0011, &mut bd, &mut bi, &mut d, &mut i);

        assert_eq!(found, 1);
        assert_eq!(examined, 1);
        // Bucket 0b0111 is hash-nearer to 0b0011 than 0b1000 is.
        assert_eq!(i[0], 0);
    }

    #[test]
    fn k_zero_finds_nothing() {
        let data = vec![1u64];
        let (ids, map) = bucket_table(&[(1, 0, 1)]);
        let mut bd = [0u32; 1];
        let mut bi = [0u64; 1];
        let mut d = [0u32; 1];
        let mut i = [0usize; 1];
        assert_eq!(
            nearest(&data, &ids, &map, 0, 1, 1, &mut bd, &mut bi, &mut d, &mut i),
            (0, 0)
        );
    }
}
