use log::{debug, trace};
use rayon::prelude::*;

use super::induced_sort::sais_cyclic;

/// Returns the start offsets of all rotations of `block`, sorted by rotation. Equal rotations
/// (which only occur in blocks that repeat a shorter string) are ordered by offset.
///
/// The block is compared cyclically, so no wraparound byte needs to be appended.
pub fn suffix_array(block: &[u8]) -> Vec<u32> {
    let len = block.len();
    if len < 2 {
        return (0..len as u32).collect();
    }

    // A block that is k copies of a shorter root has k equal copies of each root rotation.
    let period = primitive_period(block);
    if period == len {
        return sais_cyclic(block);
    }
    debug!(
        "Block of {} bytes repeats a root of {} bytes.",
        len, period
    );
    let root = if period == 1 {
        vec![0]
    } else {
        sais_cyclic(&block[..period])
    };
    let mut sa = Vec::with_capacity(len);
    for r in root {
        sa.extend((r as usize..len).step_by(period).map(|i| i as u32));
    }
    sa
}

/// Length of the shortest string that `block` is a whole number of copies of.
fn primitive_period(block: &[u8]) -> usize {
    let len = block.len();
    // KMP failure function: length of the longest proper border of block[..=i]
    let mut fail = vec![0_usize; len];
    let mut k = 0;
    for i in 1..len {
        while k > 0 && block[i] != block[k] {
            k = fail[k - 1];
        }
        if block[i] == block[k] {
            k += 1;
        }
        fail[i] = k;
    }
    let period = len - fail[len - 1];
    if len % period == 0 {
        period
    } else {
        len
    }
}

/// Burrows-Wheeler-Transform. Returns the start pointer (the row of the sorted rotations that
/// holds the original block) and the last column of the sorted rotations.
pub fn bwt_encode(block: &[u8]) -> (u32, Vec<u8>) {
    let len = block.len();
    if len == 0 {
        return (0, Vec::new());
    }
    let sa = suffix_array(block);

    // Get key and BWT output
    let mut key = 0_u32;
    let bwt = sa
        .iter()
        .enumerate()
        .map(|(row, &idx)| {
            if idx == 0 {
                key = row as u32;
                block[len - 1]
            } else {
                block[idx as usize - 1]
            }
        })
        .collect::<Vec<u8>>();
    trace!("BWT start pointer is {}.", key);
    (key, bwt)
}

/// Reference rotation sort by direct comparison. Slow, but obviously right.
pub fn naive_rotation_sort(block: &[u8]) -> Vec<u32> {
    let mut index = (0_u32..block.len() as u32).collect::<Vec<u32>>();
    if block.len() > 40_000 {
        index.par_sort_unstable_by(|a, b| {
            block_compare(*a as usize, *b as usize, block).then(a.cmp(b))
        });
    } else {
        index.sort_unstable_by(|a, b| block_compare(*a as usize, *b as usize, block).then(a.cmp(b)));
    }
    index
}

/// Compare the rotations starting at a and b, one full turn of the block.
fn block_compare(a: usize, b: usize, block: &[u8]) -> std::cmp::Ordering {
    let len = block.len();
    // Compare to the end of the block from whichever start is later, then wrap it around.
    let (first, second) = (a.max(b), a.min(b));
    let head = len - first;
    let result = block[a..a + head].cmp(&block[b..b + head]);
    if result != std::cmp::Ordering::Equal {
        return result;
    }
    // The later start has wrapped; the earlier start is `head` bytes further on.
    let mid = first - second;
    let (ra, rb) = if a == first {
        (&block[..mid], &block[second + head..])
    } else {
        (&block[second + head..], &block[..mid])
    };
    let result = ra.cmp(rb);
    if result != std::cmp::Ordering::Equal {
        return result;
    }
    // Both have wrapped; what is left is the part of the block before the earlier start.
    let rest = second;
    let (ra, rb) = if a == first {
        (&block[mid..mid + rest], &block[..rest])
    } else {
        (&block[..rest], &block[mid..mid + rest])
    };
    ra.cmp(rb)
}
