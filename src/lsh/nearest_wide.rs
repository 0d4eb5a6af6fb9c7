//! Two-stage approximate nearest-neighbor search for wide vectors.
//!
//! Same shape as the narrow search, with one difference: the exact-bucket
//! short-circuit only fires for k == 1. A wide probe costs a full
//! word-array scan per point, so for k > 1 the fuller probe set is always
//! worth scanning before settling on the exact bucket's k.

use std::collections::HashMap;

use crate::distance::hamming_wide;
use crate::heap::BoundedMaxHeap;
use crate::reorder::IndexRange;

use super::nearest::nearest_buckets;

/// [`nearest`](super::nearest()), but for wide data.
///
/// Returns `(found, examined)`.
#[allow(clippy::too_many_arguments)]
pub fn nearest_wide(
    data: &[Vec<u64>],
    bucket_ids: &[u64],
    buckets: &HashMap<u64, IndexRange>,
    k: usize,
    x_hash: u64,
    x: &[u64],
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
    nearest_wide_in_bucket(data, exact_bucket, k, x, &mut heap);

    // Stop early for 1-NN only.
    if k == 1 && heap.len() == k {
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
    let scanned = nearest_wide_in_buckets(
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

fn nearest_wide_in_bucket(
    data: &[Vec<u64>],
    b: IndexRange,
    k: usize,
    x: &[u64],
    heap: &mut BoundedMaxHeap<usize>,
) {
    if b.length == 0 {
        return;
    }

    let end = b.offset + b.length;
    let end0 = b.offset + b.length.min(k);

    for i in b.offset..end0 {
        heap.push(hamming_wide(x, &data[i]), i);
    }
    if b.length < k {
        return;
    }

    let mut max_dist = heap.root_distance();
    for i in (b.offset + k)..end {
        let dist = hamming_wide(x, &data[i]);
        if dist >= max_dist {
            continue;
        }
        heap.push_pop(dist, i);
        max_dist = heap.root_distance();
    }
}

fn nearest_wide_in_buckets(
    data: &[Vec<u64>],
    in_buckets: &[u64],
    buckets: &HashMap<u64, IndexRange>,
    k: usize,
    x: &[u64],
    x_hash: u64,
    heap: &mut BoundedMaxHeap<usize>,
) -> usize {
    let mut filled = heap.len();
    let mut max_dist = if filled > 0 { heap.root_distance() } else { 0 };
    let mut examined = 0;
    for &bid in in_buckets {
        if bid == x_hash {
            continue;
        }
        let b = buckets.get(&bid).copied().unwrap_or_default();
        let end = b.offset + b.length;
        examined += b.length;
        if filled >= k {
            for i in b.offset..end {
                let dist = hamming_wide(x, &data[i]);
                if dist >= max_dist {
                    continue;
                }
                heap.push_pop(dist, i);
                max_dist = heap.root_distance();
            }
            continue;
        }
        for i in b.offset..end {
            let dist = hamming_wide(x, &data[i]);
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
