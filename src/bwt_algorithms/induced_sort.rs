//! Cyclic SA-IS: sorts every rotation of a primitive block from a sorted subset.
//!
//! Each position is typed S if its rotation sorts before the rotation one to the right, L if
//! after. Because the block is compared cyclically there is no sentinel: the types are worked
//! out backwards from any position where two neighbouring bytes differ. An S position whose
//! left neighbour is L is a B* (LMS) position. Once the B* rotations are in order, one pass left
//! to right places every L rotation and one pass right to left places every S rotation.
//!
use log::debug;

use super::rank_doubling::sort_rotations;
use super::substring_sort::sort_lms_substrings;

const EMPTY: u32 = u32::MAX;

// Bit flags, 32 positions per word.
const S: u32 = 1;
const LMS: u32 = 1;

/// Packed L/S and LMS types of every position of a block.
pub struct SuffixTypes {
    /// Set bit marks an S type position, clear bit an L type.
    ls: Vec<u32>,
    /// Set bit marks an LMS (B*) position.
    lms: Vec<u32>,
    len: usize,
}

impl SuffixTypes {
    /// Classify the rotations of `data`. `data` must contain at least two different bytes.
    pub fn classify(data: &[u8]) -> Self {
        let len = data.len();
        let mut types = Self {
            ls: vec![0; len / 32 + 1],
            lms: vec![0; len / 32 + 1],
            len,
        };
        if len < 2 {
            return types;
        }
        let next = |i: usize| if i + 1 == len { 0 } else { i + 1 };

        // Start from a position whose type is decided by its own byte pair.
        let Some(start) = (0..len).find(|&i| data[i] != data[next(i)]) else {
            return types;
        };
        let mut current = data[start] < data[next(start)];
        if current {
            types.set_s(start);
        }

        // Walk left around the block. Equal neighbours share a type.
        let mut idx = start;
        for _ in 1..len {
            idx = if idx == 0 { len - 1 } else { idx - 1 };
            let (el, after) = (data[idx], data[next(idx)]);
            current = match el.cmp(&after) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Greater => false,
                std::cmp::Ordering::Equal => current,
            };
            if current {
                types.set_s(idx);
            }
        }

        // An S preceded by an L is an LMS.
        for idx in 0..len {
            let prev = if idx == 0 { len - 1 } else { idx - 1 };
            if types.is_s(idx) && types.is_l(prev) {
                types.lms[idx >> 5] |= LMS << (idx % 32);
            }
        }
        types
    }

    fn set_s(&mut self, idx: usize) {
        self.ls[idx >> 5] |= S << (idx % 32);
    }

    /// data element at idx is set (is an S)
    #[inline]
    pub fn is_s(&self, idx: usize) -> bool {
        self.ls[idx >> 5] & (S << (idx % 32)) > 0
    }

    /// data element at idx is not set (is an L)
    #[inline]
    pub fn is_l(&self, idx: usize) -> bool {
        !self.is_s(idx)
    }

    /// Checks if element at index is set (is an LMS element)
    #[inline]
    pub fn is_lms(&self, idx: usize) -> bool {
        self.lms[idx >> 5] & (LMS << (idx % 32)) > 0
    }

    /// LMS positions in block order.
    pub fn lms_positions(&self) -> Vec<u32> {
        (0..self.len)
            .filter(|&idx| self.is_lms(idx))
            .map(|idx| idx as u32)
            .collect()
    }
}

/// Bucket boundaries by first byte. Returns (heads, tails).
fn buckets(counts: &[u32; 256]) -> ([u32; 256], [u32; 256]) {
    let mut heads = [0_u32; 256];
    let mut tails = [0_u32; 256];
    let mut sum = 0;
    for c in 0..256 {
        heads[c] = sum;
        sum += counts[c];
        tails[c] = sum;
    }
    (heads, tails)
}

/// Induce the full rotation order from the LMS positions in sorted order.
pub fn induce(data: &[u8], types: &SuffixTypes, sorted_lms: &[u32], sa: &mut [u32]) {
    let len = data.len();
    let mut counts = [0_u32; 256];
    data.iter().for_each(|&b| counts[b as usize] += 1);
    let prev = |j: u32| if j == 0 { len - 1 } else { j as usize - 1 };

    sa.fill(EMPTY);

    // Seed the LMS rotations at the tails of their buckets, largest first.
    let (_, mut tails) = buckets(&counts);
    for &p in sorted_lms.iter().rev() {
        let c = data[p as usize] as usize;
        tails[c] -= 1;
        sa[tails[c] as usize] = p;
    }

    // L pass: left to right, each L predecessor goes to the head of its bucket.
    let (mut heads, _) = buckets(&counts);
    for k in 0..len {
        let j = sa[k];
        if j == EMPTY {
            continue;
        }
        let i = prev(j);
        if types.is_l(i) {
            let c = data[i] as usize;
            sa[heads[c] as usize] = i as u32;
            heads[c] += 1;
        }
    }

    // S pass: right to left, each S predecessor goes to the tail of its bucket. This rewrites
    // the seeds in their final places.
    let (_, mut tails) = buckets(&counts);
    for k in (0..len).rev() {
        let j = sa[k];
        if j == EMPTY {
            continue;
        }
        let i = prev(j);
        if types.is_s(i) {
            let c = data[i] as usize;
            tails[c] -= 1;
            sa[tails[c] as usize] = i as u32;
        }
    }
}

/// Sort all rotations of a primitive block (one that is not a repeat of a shorter string).
/// Returns the rotation start offsets in sorted order.
pub fn sais_cyclic(data: &[u8]) -> Vec<u32> {
    let len = data.len();
    if len < 2 {
        return (0..len as u32).collect();
    }
    let types = SuffixTypes::classify(data);
    let lms = types.lms_positions();

    // Sort the B* substrings; ties are settled over the reduced string of their names.
    let (order, names, name_count) = sort_lms_substrings(data, &types, &lms);
    debug!(
        "{} bytes, {} B* positions, {} distinct B* substrings.",
        len,
        lms.len(),
        name_count
    );
    let sorted_lms = if name_count as usize == lms.len() {
        order.iter().map(|&t| lms[t as usize]).collect::<Vec<u32>>()
    } else {
        sort_rotations(&names)
            .iter()
            .map(|&t| lms[t as usize])
            .collect::<Vec<u32>>()
    };

    let mut sa = vec![EMPTY; len];
    induce(data, &types, &sorted_lms, &mut sa);
    sa
}
