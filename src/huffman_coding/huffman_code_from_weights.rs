//! This helper is part of the huffman encoding system.
//!
//! The main huffman encoding function collects frequency weights for each table. This helper
//! turns those weights into code lengths (depths) no longer than a given maximum, and then into
//! canonical codes.
//!
//! The lengths are allocated in place over the sorted weight array, without building a tree.
//! A first pass turns the weights into parent pointers of the equivalent Huffman tree. If that
//! tree is too deep, the nodes below the cut-off are relocated higher in the tree, which bounds
//! the maximum length directly instead of flattening the weights and trying again.
//!

/// Find the lowest node in `array` (from `i` down to `nodes_to_move`) whose parent is above `i`.
fn first(array: &[i32], mut i: i32, nodes_to_move: i32) -> i32 {
    let length = array.len() as i32;
    let limit = i;
    let mut k = length - 2;

    while i >= nodes_to_move && array[i as usize] % length > limit {
        k = i;
        i -= limit - i + 1;
    }
    i = i.max(nodes_to_move - 1);

    while k > i + 1 {
        let temp = (i + k) >> 1;
        if array[temp as usize] % length > limit {
            k = temp;
        } else {
            i = temp;
        }
    }
    k
}

/// Replace the sorted weights with the parent pointers of their Huffman tree. Pointers to
/// internal nodes are offset by the array length.
fn set_extended_parent_pointers(array: &mut [i32]) {
    let length = array.len();
    array[0] += array[1];

    let (mut head_node, mut top_node) = (0, 2);
    for tail_node in 1..length - 1 {
        let mut temp;
        if top_node >= length || array[head_node] < array[top_node] {
            temp = array[head_node];
            array[head_node] = tail_node as i32;
            head_node += 1;
        } else {
            temp = array[top_node];
            top_node += 1;
        }

        if top_node >= length || (head_node < tail_node && array[head_node] < array[top_node]) {
            temp += array[head_node];
            array[head_node] = (tail_node + length) as i32;
            head_node += 1;
        } else {
            temp += array[top_node];
            top_node += 1;
        }

        array[tail_node] = temp;
    }
}

/// Number of leaf nodes that must move to keep every code within `maximum_length`.
fn find_nodes_to_relocate(array: &[i32], maximum_length: i32) -> i32 {
    let mut current_node = array.len() as i32 - 2;
    let mut current_depth = 1;
    while current_depth < maximum_length - 1 && current_node > 1 {
        current_node = first(array, current_node - 1, 0);
        current_depth += 1;
    }
    current_node
}

/// Turn parent pointers into code lengths, when no node needs to move.
fn allocate_node_lengths(array: &mut [i32]) {
    let mut first_node = array.len() as i32 - 2;
    let mut next_node = array.len() as i32 - 1;
    let mut current_depth = 1;
    let mut available_nodes = 2;

    while available_nodes > 0 {
        let last_node = first_node;
        first_node = first(array, last_node - 1, 0);

        for _ in 0..(available_nodes - (last_node - first_node)).max(0) {
            array[next_node as usize] = current_depth;
            next_node -= 1;
        }

        available_nodes = (last_node - first_node) << 1;
        current_depth += 1;
    }
}

/// Turn parent pointers into code lengths, moving `nodes_to_move` leaves up to `insert_depth`.
fn allocate_node_lengths_with_relocation(array: &mut [i32], nodes_to_move: i32, insert_depth: i32) {
    let mut first_node = array.len() as i32 - 2;
    let mut next_node = array.len() as i32 - 1;
    let mut current_depth = if insert_depth == 1 { 2 } else { 1 };
    let mut nodes_left_to_move = if insert_depth == 1 {
        nodes_to_move - 2
    } else {
        nodes_to_move
    };
    let mut available_nodes = current_depth << 1;

    while available_nodes > 0 {
        let last_node = first_node;
        first_node = if first_node <= nodes_to_move {
            first_node
        } else {
            first(array, last_node - 1, nodes_to_move)
        };

        let mut offset = 0;
        if current_depth >= insert_depth {
            offset = nodes_left_to_move.min(1 << (current_depth - insert_depth));
        } else if current_depth == insert_depth - 1 {
            offset = 1;
            if array[first_node as usize] == last_node {
                first_node += 1;
            }
        }

        for _ in 0..(available_nodes - (last_node - first_node + offset)).max(0) {
            array[next_node as usize] = current_depth;
            next_node -= 1;
        }

        nodes_left_to_move -= offset;
        available_nodes = (last_node - first_node + offset) << 1;
        current_depth += 1;
    }
}

fn significant_bits(x: i32) -> i32 {
    if x <= 0 {
        0
    } else {
        (u32::BITS - (x as u32).leading_zeros()) as i32
    }
}

/// Replace the ascending weights in `array` with code lengths of at most `maximum_length`.
pub fn allocate_huffman_code_lengths(array: &mut [i32], maximum_length: i32) {
    match array.len() {
        0 => return,
        1 => {
            array[0] = 1;
            return;
        }
        2 => {
            array[0] = 1;
            array[1] = 1;
            return;
        }
        _ => {}
    }

    set_extended_parent_pointers(array);
    let nodes_to_relocate = find_nodes_to_relocate(array, maximum_length);

    if array[0] % array.len() as i32 >= nodes_to_relocate {
        allocate_node_lengths(array);
    } else {
        let insert_depth = maximum_length - significant_bits(nodes_to_relocate - 1);
        allocate_node_lengths_with_relocation(array, nodes_to_relocate, insert_depth);
    }
}

/// Code lengths (at most `max_len`) for every symbol of an alphabet, given its weights.
/// Every symbol gets a code, including those with a weight of 0.
pub fn code_lengths_from_weights(sym_weight: &[u32], max_len: u32) -> Vec<u8> {
    // Merge each weight with its symbol so one sort orders both; ties go by symbol.
    let mut merged = sym_weight
        .iter()
        .enumerate()
        .map(|(i, &w)| (w << 9) | i as u32)
        .collect::<Vec<u32>>();
    merged.sort_unstable();

    let mut sorted = merged.iter().map(|&m| (m >> 9) as i32).collect::<Vec<i32>>();
    allocate_huffman_code_lengths(&mut sorted, max_len as i32);

    let mut lengths = vec![0_u8; sym_weight.len()];
    for (&m, &len) in merged.iter().zip(sorted.iter()) {
        lengths[(m & 0x1ff) as usize] = len as u8;
    }
    lengths
}

/// Canonical codes for a table of code lengths, merged as (length << 24) | code, ready for
/// BitPacker::out24. Within a length, codes are handed out in symbol order.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let min = lengths.iter().copied().min().unwrap_or(0) as u32;
    let max = lengths.iter().copied().max().unwrap_or(0) as u32;
    let mut codes = vec![0_u32; lengths.len()];
    let mut code = 0_u32;
    for len in min..=max {
        for (sym, &l) in lengths.iter().enumerate() {
            if l as u32 == len {
                codes[sym] = (len << 24) | code;
                code += 1;
            }
        }
        code <<= 1;
    }
    codes
}

#[cfg(test)]
mod test {
    use super::{canonical_codes, code_lengths_from_weights};

    /// Kraft sum of the lengths, scaled by 2^max.
    fn kraft(lengths: &[u8], max: u32) -> u64 {
        lengths.iter().map(|&l| 1_u64 << (max - l as u32)).sum()
    }

    #[test]
    fn simple_weights_test() {
        let lengths = code_lengths_from_weights(&[10, 1, 1, 5], 20);
        // 10 -> 1 bit, 5 -> 2 bits, the two rare symbols -> 3 bits
        assert_eq!(lengths, vec![1, 3, 3, 2]);
    }

    #[test]
    fn zero_weights_get_codes() {
        let lengths = code_lengths_from_weights(&[0, 0, 7, 0, 0], 20);
        assert!(lengths.iter().all(|&l| l >= 1));
        assert!(kraft(&lengths, 20) <= 1 << 20);
    }

    #[test]
    fn lengths_are_limited() {
        // Fibonacci weights would give a 24 deep tree without a limit.
        let mut weights = vec![1_u32, 1];
        while weights.len() < 26 {
            let n = weights.len();
            weights.push(weights[n - 1] + weights[n - 2]);
        }
        let lengths = code_lengths_from_weights(&weights, 20);
        assert!(lengths.iter().all(|&l| (1..=20).contains(&l)));
        assert!(kraft(&lengths, 20) <= 1 << 20);
        let unlimited = code_lengths_from_weights(&weights, 32);
        assert!(unlimited.iter().any(|&l| l > 20));
    }

    #[test]
    fn full_alphabet_test() {
        let weights = (0..258_u32).map(|i| (i * 37) % 1000).collect::<Vec<u32>>();
        let lengths = code_lengths_from_weights(&weights, 20);
        assert!(lengths.iter().all(|&l| (1..=20).contains(&l)));
        assert!(kraft(&lengths, 20) <= 1 << 20);
    }

    #[test]
    fn canonical_codes_test() {
        let codes = canonical_codes(&[1, 3, 3, 2]);
        assert_eq!(codes[0], 1 << 24);
        assert_eq!(codes[3], 2 << 24 | 0b10);
        assert_eq!(codes[1], 3 << 24 | 0b110);
        assert_eq!(codes[2], 3 << 24 | 0b111);
    }
}
