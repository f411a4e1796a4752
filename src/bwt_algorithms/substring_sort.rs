//! Sorts the B* (LMS) substrings of a block.
//!
//! A B* substring runs from one LMS position to the next, both included, wrapping around the
//! end of the block. Substrings are compared as sequences of typed keys `2 * byte + is_s`, so
//! that an L position sorts before an S position holding the same byte.
//!
//! The substrings are first bucketed on their first two bytes with a 256 x 256 counting sort.
//! Each bucket is then ordered with a multi-key introsort: three-way partitioning on the key at
//! the current depth, an explicit work stack instead of recursion, insertion sort for small
//! ranges and heapsort once the depth limit runs out.
//!
use std::cmp::Ordering;

use super::induced_sort::SuffixTypes;

/// Ranges up to this size are insertion sorted.
const INSERTION_THRESHOLD: usize = 16;

/// Typed keys of the B* substrings of one block.
struct LmsKeys<'a> {
    data: &'a [u8],
    types: &'a SuffixTypes,
    lms: &'a [u32],
    /// Length of each substring, both end points included.
    lens: Vec<u32>,
}

impl<'a> LmsKeys<'a> {
    fn new(data: &'a [u8], types: &'a SuffixTypes, lms: &'a [u32]) -> Self {
        let len = data.len();
        let count = lms.len();
        let lens = (0..count)
            .map(|t| {
                let start = lms[t] as usize;
                let end = lms[(t + 1) % count] as usize;
                // A lone LMS position reaches all the way around to itself.
                let span = if end > start {
                    end - start
                } else {
                    end + len - start
                };
                span as u32 + 1
            })
            .collect();
        Self {
            data,
            types,
            lms,
            lens,
        }
    }

    /// Key of substring `t` at `depth`, or -1 past its end.
    #[inline]
    fn key(&self, t: u32, depth: usize) -> i32 {
        if depth >= self.lens[t as usize] as usize {
            return -1;
        }
        let mut k = self.lms[t as usize] as usize + depth;
        if k >= self.data.len() {
            k -= self.data.len();
        }
        2 * self.data[k] as i32 + self.types.is_s(k) as i32
    }

    /// Compare two substrings from `depth` on.
    fn compare(&self, a: u32, b: u32, mut depth: usize) -> Ordering {
        loop {
            let (ka, kb) = (self.key(a, depth), self.key(b, depth));
            if ka != kb {
                return ka.cmp(&kb);
            }
            if ka < 0 {
                return Ordering::Equal;
            }
            depth += 1;
        }
    }

    /// The first two bytes of substring `t`, for bucketing.
    fn bucket(&self, t: u32) -> usize {
        let start = self.lms[t as usize] as usize;
        let second = if start + 1 == self.data.len() {
            0
        } else {
            start + 1
        };
        (self.data[start] as usize) << 8 | self.data[second] as usize
    }
}

/// Sort the B* substrings starting at `lms` (block order).
///
/// Returns the substring indices in sorted order, the name (rank among distinct substrings)
/// of each substring in block order, and the number of distinct names.
pub fn sort_lms_substrings(
    data: &[u8],
    types: &SuffixTypes,
    lms: &[u32],
) -> (Vec<u32>, Vec<u32>, u32) {
    let keys = LmsKeys::new(data, types, lms);
    let count = lms.len();

    // Counting sort on the first two bytes
    let mut starts = vec![0_u32; 65_537];
    for t in 0..count as u32 {
        starts[keys.bucket(t) + 1] += 1;
    }
    for b in 1..starts.len() {
        starts[b] += starts[b - 1];
    }
    let mut order = vec![0_u32; count];
    let mut fill = starts.clone();
    for t in 0..count as u32 {
        let b = keys.bucket(t);
        order[fill[b] as usize] = t;
        fill[b] += 1;
    }

    // Then each bucket on its own. Key 0 (an S type byte) is shared by the whole bucket.
    for b in 0..65_536 {
        let (first, last) = (starts[b] as usize, starts[b + 1] as usize);
        if last - first > 1 {
            multikey_introsort(&keys, &mut order[first..last], 1);
        }
    }

    // Name the substrings; equal substrings share a name.
    let mut names = vec![0_u32; count];
    let mut name = 0_u32;
    for w in 0..count {
        if w > 0 {
            let (prev, cur) = (order[w - 1], order[w]);
            if keys.lens[prev as usize] != keys.lens[cur as usize]
                || keys.compare(prev, cur, 0) != Ordering::Equal
            {
                name += 1;
            }
        }
        names[order[w] as usize] = name;
    }
    (order, names, if count == 0 { 0 } else { name + 1 })
}

/// Multi-key introsort over `items`, all of which agree on keys before `depth`.
fn multikey_introsort(keys: &LmsKeys, items: &mut [u32], depth: usize) {
    let limit = 2 * (usize::BITS - items.len().leading_zeros()) as usize;
    // Work stack of (first, last, depth, limit)
    let mut stack = vec![(0, items.len(), depth, limit)];

    while let Some((first, last, depth, limit)) = stack.pop() {
        let slice = &mut items[first..last];
        let len = slice.len();
        if len < 2 {
            continue;
        }
        if len <= INSERTION_THRESHOLD {
            insertion_sort(keys, slice, depth);
            continue;
        }
        if limit == 0 {
            heap_sort(keys, slice, depth);
            continue;
        }

        let pivot = median_of_three(
            keys.key(slice[0], depth),
            keys.key(slice[len / 2], depth),
            keys.key(slice[len - 1], depth),
        );

        // Three-way partition: [0, lt) below, [lt, gt) equal, [gt, len) above the pivot
        let (mut lt, mut i, mut gt) = (0, 0, len);
        while i < gt {
            let k = keys.key(slice[i], depth);
            match k.cmp(&pivot) {
                Ordering::Less => {
                    slice.swap(lt, i);
                    lt += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    gt -= 1;
                    slice.swap(i, gt);
                }
                Ordering::Equal => i += 1,
            }
        }

        stack.push((first, first + lt, depth, limit - 1));
        stack.push((first + gt, last, depth, limit - 1));
        // Substrings that ended together are equal
        if pivot >= 0 {
            stack.push((first + lt, first + gt, depth + 1, limit));
        }
    }
}

fn median_of_three(a: i32, b: i32, c: i32) -> i32 {
    if a < b {
        if b < c {
            b
        } else if a < c {
            c
        } else {
            a
        }
    } else if a < c {
        a
    } else if b < c {
        c
    } else {
        b
    }
}

fn insertion_sort(keys: &LmsKeys, items: &mut [u32], depth: usize) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && keys.compare(items[j - 1], items[j], depth) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn heap_sort(keys: &LmsKeys, items: &mut [u32], depth: usize) {
    let len = items.len();
    for root in (0..len / 2).rev() {
        sift_down(keys, items, root, len, depth);
    }
    for end in (1..len).rev() {
        items.swap(0, end);
        sift_down(keys, items, 0, end, depth);
    }
}

fn sift_down(keys: &LmsKeys, items: &mut [u32], mut root: usize, end: usize, depth: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end
            && keys.compare(items[child], items[child + 1], depth) == Ordering::Less
        {
            child += 1;
        }
        if keys.compare(items[root], items[child], depth) != Ordering::Less {
            return;
        }
        items.swap(root, child);
        root = child;
    }
}

#[cfg(test)]
mod test {
    use super::{heap_sort, insertion_sort, median_of_three, sort_lms_substrings, LmsKeys};
    use crate::bwt_algorithms::induced_sort::SuffixTypes;

    #[test]
    fn mississippi_substrings() {
        let data = b"mississippi";
        let types = SuffixTypes::classify(data);
        let lms = types.lms_positions();
        let (order, names, count) = sort_lms_substrings(data, &types, &lms);
        // imi < ippi < issi = issi
        assert_eq!(order[0], 3);
        assert_eq!(order[1], 2);
        assert_eq!(names, vec![2, 2, 1, 0]);
        assert_eq!(count, 3);
    }

    #[test]
    fn lone_lms_wraps_around() {
        let data = b"ba";
        let types = SuffixTypes::classify(data);
        let lms = types.lms_positions();
        let keys = LmsKeys::new(data, &types, &lms);
        assert_eq!(keys.lens, vec![3]);
        // a(S) b(L) a(S)
        assert_eq!(keys.key(0, 0), 2 * b'a' as i32 + 1);
        assert_eq!(keys.key(0, 1), 2 * b'b' as i32);
        assert_eq!(keys.key(0, 3), -1);
    }

    #[test]
    fn fallback_sorts_agree() {
        // Many B* substrings with long shared prefixes
        let data = (0..2_000_u32)
            .map(|i| if i % 7 == 0 { b'a' } else { b'b' + (i % 3 == 0) as u8 })
            .collect::<Vec<u8>>();
        let types = SuffixTypes::classify(&data);
        let lms = types.lms_positions();
        let keys = LmsKeys::new(&data, &types, &lms);
        let mut a = (0..lms.len() as u32).collect::<Vec<u32>>();
        let mut b = a.clone();
        insertion_sort(&keys, &mut a, 0);
        heap_sort(&keys, &mut b, 0);
        let ka = a.iter().map(|&t| keys.lens[t as usize]).collect::<Vec<u32>>();
        let kb = b.iter().map(|&t| keys.lens[t as usize]).collect::<Vec<u32>>();
        assert_eq!(ka, kb);
        for w in a.windows(2) {
            assert_ne!(keys.compare(w[0], w[1], 0), std::cmp::Ordering::Greater);
        }
        for w in b.windows(2) {
            assert_ne!(keys.compare(w[0], w[1], 0), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn median_test() {
        assert_eq!(median_of_three(1, 2, 3), 2);
        assert_eq!(median_of_three(3, 1, 2), 2);
        assert_eq!(median_of_three(2, 3, 1), 2);
        assert_eq!(median_of_three(-1, -1, 5), -1);
    }
}
