//! Ordering utilities used to keep face, edge and vertex collections in a
//! deterministic, lookup-friendly order.
//!
//! - [`binary_search_le`]: index of the *last* record whose key is `<=` a target.
//! - [`radix_sort`]: stable byte-wise counting sort, 1 to 4 passes.
//! - [`quick_sort_by`]: middle-pivot quicksort down to small partitions,
//!   finished by one insertion-sort pass. Not stable.

use crate::errors::MeshError;
use std::cmp::Ordering;

/// Partitions at or below this size are left for the final insertion pass.
pub const QUICK_SORT_CUTOFF: usize = 8;

/// Soft limit on pending partitions in [`quick_sort_by`].
/// The smaller partition is always processed first, so the stack never holds
/// more than `log2(len) + 1` entries and the limit is reached only by
/// comparators that are not a total order.
pub const QUICK_SORT_STACK_LIMIT: usize = 1024;

/// Find the index of the largest record whose key is `<=` `target`.
///
/// `array` must be sorted by `key`. Returns `None` when every key is greater
/// than `target` (or the array is empty). With duplicate keys the last
/// duplicate is returned.
///
/// # Example
/// ```
/// # use mesh_effect::sort::binary_search_le;
/// let keys = [0, 0, 2, 2, 5, 9, 9, 20];
/// assert_eq!(binary_search_le(&keys, &7, |k| *k), Some(4));
/// assert_eq!(binary_search_le(&keys, &2, |k| *k), Some(3));
/// assert_eq!(binary_search_le(&keys, &-1, |k| *k), None);
/// ```
pub fn binary_search_le<T, K, F>(array: &[T], target: &K, key: F) -> Option<usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    debug_assert!(
        array.windows(2).all(|w| key(&w[0]) <= key(&w[1])),
        "binary_search_le requires a sorted array"
    );

    // invariant: key(array[i]) <= target for i < lo, > target for i >= hi
    let mut lo = 0usize;
    let mut hi = array.len();
    while lo < hi {
        let mid = lo + ((hi - lo) >> 1);
        if key(&array[mid]) <= *target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo.checked_sub(1)
}

/// Stable radix sort on the low `passes` bytes of a `u32` key.
///
/// Each pass is a counting sort over one byte, least significant first, so
/// records with equal keys keep their relative order.
///
/// ## Errors
/// [`MeshError::InvalidRadixPasses`] unless `1 <= passes <= 4`.
pub fn radix_sort<T, F>(array: &mut [T], passes: usize, key: F) -> Result<(), MeshError>
where
    T: Clone,
    F: Fn(&T) -> u32,
{
    if !(1..=4).contains(&passes) {
        return Err(MeshError::InvalidRadixPasses(passes));
    }
    if array.len() < 2 {
        return Ok(());
    }

    let mut histogram = [[0usize; 256]; 4];
    for item in array.iter() {
        let k = key(item);
        for (pass, counts) in histogram.iter_mut().enumerate().take(passes) {
            counts[((k >> (pass << 3)) & 0xff) as usize] += 1;
        }
    }

    let mut scratch: Vec<T> = array.to_vec();
    for (pass, counts) in histogram.iter().enumerate().take(passes) {
        // a pass where every key shares one byte value is a no-op
        if counts.iter().any(|&c| c == array.len()) {
            continue;
        }

        let mut scan = [0usize; 256];
        for radix in 1..256 {
            scan[radix] = scan[radix - 1] + counts[radix - 1];
        }

        let shift = pass << 3;
        scratch.clone_from_slice(array);
        for item in scratch.iter() {
            let radix = ((key(item) >> shift) & 0xff) as usize;
            array[scan[radix]] = item.clone();
            scan[radix] += 1;
        }
    }

    let mask = if passes == 4 {
        u32::MAX
    } else {
        (1u32 << (passes << 3)) - 1
    };
    debug_assert!(
        array
            .windows(2)
            .all(|w| (key(&w[0]) & mask) <= (key(&w[1]) & mask))
    );
    Ok(())
}

/// Quicksort (pivot = middle element) with an explicit partition stack,
/// stopping at partitions of [`QUICK_SORT_CUTOFF`] elements, then a single
/// insertion-sort pass over the whole slice.
///
/// ## Errors
/// [`MeshError::StackLimit`] if the pending partition stack grows past
/// [`QUICK_SORT_STACK_LIMIT`]. The slice is left partially ordered.
pub fn quick_sort_by<T, F>(array: &mut [T], mut compare: F) -> Result<(), MeshError>
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    if array.len() < 2 {
        return Ok(());
    }

    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(64);
    stack.push((0, array.len() - 1));

    while let Some((lo, hi)) = stack.pop() {
        if hi - lo <= QUICK_SORT_CUTOFF {
            continue;
        }

        let pivot = array[(lo + hi) >> 1].clone();
        let mut i = lo;
        let mut j = hi;
        loop {
            while compare(&array[i], &pivot) == Ordering::Less {
                i += 1;
            }
            while compare(&array[j], &pivot) == Ordering::Greater {
                j -= 1;
            }
            if i <= j {
                array.swap(i, j);
                i += 1;
                if j == 0 {
                    break;
                }
                j -= 1;
            }
            if i > j {
                break;
            }
        }

        // push the larger side first so the smaller one is processed next
        let left = (lo < j).then_some((lo, j));
        let right = (i < hi).then_some((i, hi));
        let (first, second) = match (left, right) {
            (Some(l), Some(r)) if (l.1 - l.0) < (r.1 - r.0) => (Some(r), Some(l)),
            (l, r) => (l, r),
        };
        stack.extend(first);
        stack.extend(second);

        if stack.len() > QUICK_SORT_STACK_LIMIT {
            return Err(MeshError::StackLimit {
                limit: QUICK_SORT_STACK_LIMIT,
            });
        }
    }

    for i in 1..array.len() {
        let tmp = array[i].clone();
        let mut j = i;
        while j > 0 && compare(&array[j - 1], &tmp) == Ordering::Greater {
            array[j] = array[j - 1].clone();
            j -= 1;
        }
        array[j] = tmp;
    }

    debug_assert!(
        array
            .windows(2)
            .all(|w| compare(&w[0], &w[1]) != Ordering::Greater)
    );
    Ok(())
}
