//! In-place permutation and sorted-run grouping, used by LSH fitting.

use std::collections::HashMap;
use std::hash::Hash;

/// A contiguous index range into the reordered dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRange {
    pub offset: usize,
    pub length: usize,
}

/// Applies the permutation described by `indices` in place.
///
/// `indices[i]` is the source position of the element that ends up at `i`
/// after a sort of the index array. Earlier iterations may already have
/// moved that element, so the walk follows the index chain downward until it
/// lands on the element's current position ("walk the index until it reaches
/// you"), then swaps once. `swap` performs the actual exchange, so one pass
/// can reorder any number of parallel columns.
pub(crate) fn reorder_in_place(mut swap: impl FnMut(usize, usize), indices: &[usize]) {
    for (i, &idx) in indices.iter().enumerate() {
        let mut target = idx;
        while target < i {
            target = indices[target];
        }
        swap(i, target);
    }
}

/// Counts distinct values in a sorted slice.
fn count_unique_sorted<T: PartialEq>(s: &[T]) -> usize {
    let mut out = 0;
    let mut prev: Option<&T> = None;
    for b in s {
        if prev != Some(b) {
            out += 1;
            prev = Some(b);
        }
    }
    out
}

/// Groups a sorted key column into per-key index ranges.
///
/// Returns the range map and the distinct keys in ascending (sorted) order.
/// The ranges partition `[0, keys.len())`.
pub(crate) fn group_sorted<K: Copy + Eq + Hash + PartialEq>(
    keys: &[K],
) -> (HashMap<K, IndexRange>, Vec<K>) {
    let num_groups = count_unique_sorted(keys);
    let mut groups = HashMap::with_capacity(num_groups);
    let mut distinct = Vec::with_capacity(num_groups);

    let mut run_start = 0;
    for (i, &key) in keys.iter().enumerate() {
        if i == 0 {
            distinct.push(key);
            continue;
        }
        if key != keys[run_start] {
            groups.insert(
                keys[run_start],
                IndexRange {
                    offset: run_start,
                    length: i - run_start,
                },
            );
            distinct.push(key);
            run_start = i;
        }
    }
    if !keys.is_empty() {
        groups.insert(
            keys[run_start],
            IndexRange {
                offset: run_start,
                length: keys.len() - run_start,
            },
        );
    }
    (groups, distinct)
}
