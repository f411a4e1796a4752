use rayon::prelude::*;

/// Sorts the rotations of the reduced string (the names of the B* substrings in block order).
///
/// Ranks start as the names. Each round sorts on the pair (rank of i, rank of i + h) and
/// renumbers, so that after the round ranks describe the first 2h names of every rotation.
/// The reduced string of a primitive block is itself primitive, so all ranks become unique
/// once h reaches its length.
pub fn sort_rotations(names: &[u32]) -> Vec<u32> {
    let len = names.len();
    let mut order = (0..len as u32).collect::<Vec<u32>>();
    if len < 2 {
        return order;
    }
    let mut rank = names.to_vec();
    let mut new_rank = vec![0_u32; len];
    let mut h = 1;

    loop {
        let keys = (0..len)
            .map(|i| (rank[i] as u64) << 32 | rank[(i + h) % len] as u64)
            .collect::<Vec<u64>>();
        if len > 40_000 {
            order.par_sort_unstable_by_key(|&i| keys[i as usize]);
        } else {
            order.sort_unstable_by_key(|&i| keys[i as usize]);
        }

        let mut r = 0;
        new_rank[order[0] as usize] = 0;
        for w in 1..len {
            if keys[order[w] as usize] != keys[order[w - 1] as usize] {
                r += 1;
            }
            new_rank[order[w] as usize] = r;
        }
        std::mem::swap(&mut rank, &mut new_rank);

        if r as usize == len - 1 || 2 * h >= len {
            break;
        }
        h *= 2;
    }
    order
}
