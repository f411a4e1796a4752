use log::{debug, trace};

use super::huffman_code_from_weights::{canonical_codes, code_lengths_from_weights};
use super::{GROUP_SIZE, HIGH_SYMBOL_COST, MAX_ENCODE_CODE_LEN};
use crate::bitstream::bitpacker::BitPacker;
use crate::tools::mtf::MoveToFront;
use crate::tools::rle2_mtf::Rle2Block;

/// We can have 2-6 coding tables depending on how much data we have coming in.
pub fn select_table_count(symbols: usize) -> usize {
    match symbols {
        0..=199 => 2,
        200..=599 => 3,
        600..=1199 => 4,
        1200..=2399 => 5,
        _ => 6,
    }
}

/// Encode MTF/RLE2 data using the multi-table system. Writes the table count, selectors, code
/// length tables and the coded symbols. `iterations` is the number of table optimisation
/// passes (bzip2 uses 4).
pub fn huf_encode(bp: &mut BitPacker, block: &Rle2Block, iterations: usize) {
    let data = &block.symbols;
    let alpha_size = block.alpha_size;
    let table_count = select_table_count(data.len());
    let iterations = iterations.max(1);

    // Now we can initialize the coding tables based on our frequency counts
    let mut tables = init_tables(&block.freqs, table_count, data.len());

    // And initialize a count of how many selectors we need, and a vec to store them
    let selector_count = (data.len() + GROUP_SIZE - 1) / GROUP_SIZE;
    let mut selectors = vec![0_u8; selector_count];

    /*
     Each table starts out as 0s over its share of the symbols and 15s elsewhere. Every
     pass picks the cheapest table for each group of 50, counts the symbols of the groups
     each table won, and rebuilds each table's code lengths from those counts.
    */
    for iter in 0..iterations {
        // for reporting only
        let mut favorites = [0; 6];
        let mut total_cost = 0;

        // "Recalculated" frequency array for each table
        let mut rfreq = vec![vec![0_u32; alpha_size]; table_count];

        data.chunks(GROUP_SIZE).enumerate().for_each(|(i, chunk)| {
            // the cost array helps us find which table is best for each 50 byte chunk
            let mut cost = [0_u32; 6];
            chunk.iter().for_each(|&symbol| {
                (0..table_count).for_each(|t| cost[t] += tables[t][symbol as usize] as u32)
            });

            // Lowest cost wins; the first table on a tie
            let mut bt = 0;
            for t in 1..table_count {
                if cost[t] < cost[bt] {
                    bt = t;
                }
            }

            total_cost += cost[bt];
            favorites[bt] += 1;

            chunk
                .iter()
                .for_each(|&symbol| rfreq[bt][symbol as usize] += 1);

            // On the last iteration, collect the selector list
            if iter == iterations - 1 {
                selectors[i] = bt as u8;
            }
        });

        debug!(
            " pass {}: best cost is {}, grp uses are {:?}",
            iter + 1,
            total_cost / 8,
            &favorites[..table_count]
        );

        for (table, freqs) in tables.iter_mut().zip(rfreq.iter()) {
            *table = code_lengths_from_weights(freqs, MAX_ENCODE_CODE_LEN);
        }
    }

    // Symbol maps are followed by a 3 bit number of Huffman trees that exist
    trace!("\r\x1b[43mTable count written at {}.     \x1b[0m", bp.loc());
    bp.out24((3 << 24) | table_count as u32);

    // Then a 15 bit number indicating the how many selectors are used
    trace!(
        "\r\x1b[43mSelector count written at {}.     \x1b[0m",
        bp.loc()
    );
    bp.out24((15 << 24) | selector_count as u32);

    /*
    Selectors tell us which table is to be used for each 50 symbol chunk of input
    data in this block. They are written after a Move-To-Front transform, in unary.
    */
    let mut table_idx = MoveToFront::new();
    trace!(
        "\r\x1b[43m{} Selectors written at {}.     \x1b[0m",
        selector_count,
        bp.loc()
    );
    for &selector in &selectors {
        bp.write_unary(table_idx.value_to_front(selector) as u32);
    }

    // Now write out the code length tables: a 5 bit start, then deltas for each symbol
    trace!("\r\x1b[43mCode tables written at {}.     \x1b[0m", bp.loc());
    for table in &tables {
        let mut current = table[0] as i32;
        bp.write_bits(5, current as u32);
        for &len in table.iter() {
            let len = len as i32;
            // 10 adds one, 11 takes one away, 0 moves on to the next symbol
            let value = if current < len { 2 } else { 3 };
            for _ in 0..(len - current).abs() {
                bp.write_bits(2, value);
            }
            bp.write_bool(false);
            current = len;
        }
    }

    // Finally the data itself, switching tables every 50 symbols
    let codes = tables
        .iter()
        .map(|table| canonical_codes(table))
        .collect::<Vec<Vec<u32>>>();
    trace!("\r\x1b[43mBlock data written at {}.     \x1b[0m", bp.loc());
    for (chunk, &selector) in data.chunks(GROUP_SIZE).zip(selectors.iter()) {
        let table = &codes[selector as usize];
        for &symbol in chunk {
            bp.out24(table[symbol as usize]);
        }
    }
    trace!("\r\x1b[43mBlock data ends at {}.     \x1b[0m", bp.loc());
}

/// Seed the tables: each one covers a run of symbols holding about an equal share of the
/// remaining frequency, at cost 0, with every other symbol at a high cost.
fn init_tables(freqs: &[u32], table_count: usize, symbols: usize) -> Vec<Vec<u8>> {
    let alpha_size = freqs.len();
    let mut tables = vec![vec![0_u8; alpha_size]; table_count];
    let mut remaining = symbols as u32;
    let mut low_cost_end: isize = -1;

    for (i, table) in tables.iter_mut().enumerate() {
        let target = remaining / (table_count - i) as u32;
        let low_cost_start = low_cost_end + 1;
        let mut actual = 0;

        while actual < target && low_cost_end < alpha_size as isize - 1 {
            low_cost_end += 1;
            actual += freqs[low_cost_end as usize];
        }

        // Alternate tables give back their last symbol, so the split lands on both sides
        if low_cost_end > low_cost_start
            && i != 0
            && i != table_count - 1
            && (table_count - i) % 2 == 0
        {
            actual -= freqs[low_cost_end as usize];
            low_cost_end -= 1;
        }

        for (sym, cost) in table.iter_mut().enumerate() {
            let sym = sym as isize;
            if sym < low_cost_start || sym > low_cost_end {
                *cost = HIGH_SYMBOL_COST;
            }
        }
        remaining -= actual;
    }
    tables
}

#[cfg(test)]
mod test {
    use super::{huf_encode, init_tables, select_table_count};
    use crate::bitstream::bitpacker::BitPacker;
    use crate::tools::rle2_mtf::rle2_mtf_encode;

    #[test]
    fn table_count_test() {
        assert_eq!(select_table_count(0), 2);
        assert_eq!(select_table_count(199), 2);
        assert_eq!(select_table_count(200), 3);
        assert_eq!(select_table_count(599), 3);
        assert_eq!(select_table_count(600), 4);
        assert_eq!(select_table_count(1200), 5);
        assert_eq!(select_table_count(2399), 5);
        assert_eq!(select_table_count(2400), 6);
    }

    #[test]
    fn seed_tables_split_the_alphabet() {
        let freqs = [10, 10, 10, 10];
        let tables = init_tables(&freqs, 2, 40);
        assert_eq!(tables[0], vec![0, 0, 15, 15]);
        assert_eq!(tables[1], vec![15, 15, 0, 0]);
    }

    #[test]
    fn encoded_header_fields() {
        let data = b"abracadabra";
        let mut in_use = [false; 256];
        data.iter().for_each(|&b| in_use[b as usize] = true);
        let rle2 = rle2_mtf_encode(data, &in_use);
        let mut bp = BitPacker::new(64);
        huf_encode(&mut bp, &rle2, 4);
        bp.flush();
        // 3 bit table count (2), then 15 bit selector count (1)
        assert_eq!(bp.output[0] >> 5, 2);
        let selectors = ((bp.output[0] as u32 & 0x1f) << 10)
            | (bp.output[1] as u32) << 2
            | (bp.output[2] as u32) >> 6;
        assert_eq!(selectors, 1);
    }
}
