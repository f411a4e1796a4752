//! Reads the Huffman tables of a block and decodes its MTF/RLE2 symbols.
//!
//! Each table is rebuilt from its code lengths in canonical form: codes of one length are
//! consecutive numbers, so a table only needs, per length, the largest code of that length
//! (the limit) and the offset from a code to its position in the length-sorted symbol list
//! (the base). Decoding reads the minimum length, then adds a bit at a time until the code is
//! within the limit of its length.
//!
use std::io::Read;

use log::{debug, trace};

use super::{GROUP_SIZE, MAX_DECODE_CODE_LEN, MAX_ENCODE_CODE_LEN, MAX_SELECTORS, MAX_TABLES, MIN_TABLES};
use crate::bitstream::bitreader::BitReader;
use crate::error::{FormatReason, Result};
use crate::tools::mtf::MoveToFront;

const LIMIT_SLOTS: usize = MAX_DECODE_CODE_LEN as usize + 2;

/// Canonical decoding table for one set of code lengths.
#[derive(Debug, Clone)]
pub struct DecodeTable {
    limits: [i32; LIMIT_SLOTS],
    bases: [i32; LIMIT_SLOTS],
    symbols: Vec<u16>,
    min_len: u32,
}

impl DecodeTable {
    /// Build the table. Lengths must be 1..=23.
    pub fn new(lengths: &[u8]) -> Self {
        let min_len = lengths.iter().copied().min().unwrap_or(1) as usize;
        let max_len = lengths.iter().copied().max().unwrap_or(1) as usize;

        // Count the codes of each length, then turn the counts into first positions.
        let mut bases = [0_i32; LIMIT_SLOTS];
        lengths.iter().for_each(|&l| bases[l as usize + 1] += 1);
        for i in 1..LIMIT_SLOTS {
            bases[i] += bases[i - 1];
        }

        // No code of an unused length ever matches.
        let mut limits = [-1_i32; LIMIT_SLOTS];
        let mut code = 0;
        for len in min_len..=max_len {
            let base = code;
            code += bases[len + 1] - bases[len];
            bases[len] = base - bases[len];
            limits[len] = code - 1;
            code <<= 1;
        }

        // Symbols sorted by code length, then by value
        let mut symbols = Vec::with_capacity(lengths.len());
        for len in min_len..=max_len {
            for (sym, &l) in lengths.iter().enumerate() {
                if l as usize == len {
                    symbols.push(sym as u16);
                }
            }
        }

        Self {
            limits,
            bases,
            symbols,
            min_len: min_len as u32,
        }
    }

    /// Decode one symbol.
    pub fn decode<R: Read>(&self, br: &mut BitReader<R>) -> Result<u16> {
        let mut len = self.min_len;
        let mut code = br.read_bits(len)? as i32;
        while len <= MAX_DECODE_CODE_LEN {
            if code <= self.limits[len as usize] {
                let idx = code - self.bases[len as usize];
                return self
                    .symbols
                    .get(idx as usize)
                    .copied()
                    .ok_or_else(|| br.error(FormatReason::CodeTooLong));
            }
            code = (code << 1) | br.read_bits(1)? as i32;
            len += 1;
        }
        Err(br.error(FormatReason::CodeTooLong))
    }
}

/// The tables and selectors of one block, and the position in its selector list.
#[derive(Debug)]
pub struct HuffmanDecoder {
    tables: Vec<DecodeTable>,
    selectors: Vec<u8>,
    group_index: usize,
    group_position: usize,
}

impl HuffmanDecoder {
    /// Read table count, selectors and code lengths for an alphabet of `alpha_size` symbols.
    pub fn read<R: Read>(br: &mut BitReader<R>, alpha_size: usize) -> Result<Self> {
        trace!("\r\x1b[43mTable count read at {}.     \x1b[0m", br.loc());
        let table_count = br.read_bits(3)? as usize;
        if !(MIN_TABLES..=MAX_TABLES).contains(&table_count) {
            return Err(br.error(FormatReason::BadTableCount));
        }
        let selector_count = br.read_bits(15)? as usize;
        if !(1..=MAX_SELECTORS).contains(&selector_count) {
            return Err(br.error(FormatReason::BadSelectorCount));
        }
        debug!("{} tables, {} selectors.", table_count, selector_count);

        // Selectors are MTF'd and written in unary
        let mut table_idx = MoveToFront::new();
        let mut selectors = Vec::with_capacity(selector_count);
        for _ in 0..selector_count {
            let mut rank = 0;
            while br.read_bool()? {
                rank += 1;
                if rank >= table_count {
                    return Err(br.error(FormatReason::BadSelector));
                }
            }
            selectors.push(table_idx.index_to_front(rank));
        }

        // Code lengths: a 5 bit start, then per symbol 10 (+1) / 11 (-1) until a 0
        trace!("\r\x1b[43mCode tables read at {}.     \x1b[0m", br.loc());
        let mut tables = Vec::with_capacity(table_count);
        for _ in 0..table_count {
            let mut current = br.read_bits(5)? as i32;
            let mut lengths = Vec::with_capacity(alpha_size);
            for _ in 0..alpha_size {
                while br.read_bool()? {
                    current += if br.read_bool()? { -1 } else { 1 };
                    if !(0..=MAX_DECODE_CODE_LEN as i32).contains(&current) {
                        return Err(br.error(FormatReason::BadCodeLength));
                    }
                }
                if !(1..=MAX_ENCODE_CODE_LEN as i32).contains(&current) {
                    return Err(br.error(FormatReason::BadCodeLength));
                }
                lengths.push(current as u8);
            }
            tables.push(DecodeTable::new(&lengths));
        }

        Ok(Self {
            tables,
            selectors,
            group_index: 0,
            group_position: 0,
        })
    }

    /// Decode the next symbol, switching tables every 50 symbols.
    pub fn next_symbol<R: Read>(&mut self, br: &mut BitReader<R>) -> Result<u16> {
        if self.group_position == GROUP_SIZE {
            self.group_index += 1;
            self.group_position = 0;
            if self.group_index == self.selectors.len() {
                return Err(br.error(FormatReason::SelectorOverrun));
            }
        }
        self.group_position += 1;
        let table = self.selectors[self.group_index] as usize;
        self.tables[table].decode(br)
    }
}

#[cfg(test)]
mod test {
    use super::{DecodeTable, HuffmanDecoder};
    use crate::bitstream::bitpacker::BitPacker;
    use crate::bitstream::bitreader::BitReader;
    use crate::error::FormatReason;
    use crate::huffman_coding::huffman::huf_encode;
    use crate::huffman_coding::huffman_code_from_weights::canonical_codes;
    use crate::tools::rle2_mtf::rle2_mtf_encode;

    #[test]
    fn canonical_table_test() {
        let lengths = [1, 3, 3, 2];
        let codes = canonical_codes(&lengths);
        let mut bp = BitPacker::new(8);
        for sym in [2_usize, 0, 3, 1, 0] {
            bp.out24(codes[sym]);
        }
        bp.flush();
        let table = DecodeTable::new(&lengths);
        let mut br = BitReader::new(&bp.output[..]);
        for sym in [2_u16, 0, 3, 1, 0] {
            assert_eq!(table.decode(&mut br).unwrap(), sym);
        }
    }

    #[test]
    fn encoder_output_decodes() {
        let data = "Peter Piper picked a peck of pickled peppers. ".repeat(40);
        let data = data.as_bytes();
        let mut in_use = [false; 256];
        data.iter().for_each(|&b| in_use[b as usize] = true);
        let rle2 = rle2_mtf_encode(data, &in_use);

        let mut bp = BitPacker::new(data.len());
        huf_encode(&mut bp, &rle2, 4);
        bp.flush();

        let mut br = BitReader::new(&bp.output[..]);
        let mut dec = HuffmanDecoder::read(&mut br, rle2.alpha_size).unwrap();
        for &expected in &rle2.symbols {
            assert_eq!(dec.next_symbol(&mut br).unwrap(), expected);
        }
    }

    #[test]
    fn bad_table_count_test() {
        // 3 bits of 7 tables
        let data = [0b1110_0000_u8, 0, 0, 0];
        let mut br = BitReader::new(&data[..]);
        let err = HuffmanDecoder::read(&mut br, 3).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::BadTableCount));
    }

    #[test]
    fn zero_selectors_test() {
        // 2 tables, 0 selectors
        let data = [0b0100_0000_u8, 0, 0, 0];
        let mut br = BitReader::new(&data[..]);
        let err = HuffmanDecoder::read(&mut br, 3).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::BadSelectorCount));
    }

    #[test]
    fn selector_overrun_test() {
        let mut bp = BitPacker::new(64);
        bp.write_bits(3, 2); // 2 tables
        bp.write_bits(15, 1); // 1 selector
        bp.write_unary(0);
        for _ in 0..2 {
            // 3 symbols, all length 2
            bp.write_bits(5, 2);
            for _ in 0..3 {
                bp.write_bool(false);
            }
        }
        // 51 codes of 00
        bp.write_bits(32, 0);
        bp.write_bits(32, 0);
        bp.write_bits(32, 0);
        bp.write_bits(32, 0);
        bp.flush();
        let mut br = BitReader::new(&bp.output[..]);
        let mut dec = HuffmanDecoder::read(&mut br, 3).unwrap();
        for _ in 0..50 {
            assert_eq!(dec.next_symbol(&mut br).unwrap(), 0);
        }
        let err = dec.next_symbol(&mut br).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::SelectorOverrun));
    }
}
