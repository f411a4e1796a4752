//! The symbol map records which byte values occur in a block.
//!
//! There are 256 possible u8s, which equals 16 sets of 16 u8s. A 16 bit word marks which of
//! the 16 sets contain at least one used byte, and each marked set is followed by a 16 bit word
//! with a bit set for every used byte in that set. Sets with no used bytes cost nothing.
//!
use std::io::Read;

use log::trace;

use crate::bitstream::bitpacker::BitPacker;
use crate::bitstream::bitreader::BitReader;
use crate::error::{FormatReason, Result};

const BIT_MASK: u16 = 0x8000;

/// Takes an array of all u8s used at the BWT stage and returns a bzip2 symbol map: the range
/// word followed by one word per used range.
pub fn encode_sym_map(symbols: &[bool; 256]) -> Vec<u16> {
    let mut sym_maps: Vec<u16> = vec![0; 17]; // Index and 16 maps

    // The high nibble of a byte picks the map, the low nibble picks the bit within the map.
    // Eg 'A' is 0100_0001, so map 4 would have bit 1 set.
    symbols.iter().enumerate().for_each(|(idx, &sym)| {
        if sym {
            sym_maps[0] |= BIT_MASK >> (idx >> 4);
            sym_maps[1 + (idx >> 4)] |= BIT_MASK >> (idx & 15)
        }
    });

    // Return only those words that have bits set.
    sym_maps.retain(|&map| map > 0);
    sym_maps
}

/// Write the symbol map for `symbols` to the block.
pub fn write_sym_map(bp: &mut BitPacker, symbols: &[bool; 256]) {
    let maps = encode_sym_map(symbols);
    trace!("\r\x1b[43mSymbol map at {}: {:?}\x1b[0m", bp.loc(), maps);
    for map in maps {
        bp.write_bits(16, map as u32);
    }
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all u8s used in the input.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    let mut map_idx = 0;

    for block in 0..16 {
        // Check the range word to see if this set of bytes has a map of its own
        if (symbol_map[0] & (BIT_MASK >> block)) > 0 {
            map_idx += 1;
            for byte_idx in 0..16_u8 {
                if (symbol_map[map_idx] & (BIT_MASK >> byte_idx)) > 0 {
                    // block * 16 + byte_idx = u8 value we found
                    symbols.push((block << 4) + byte_idx);
                };
            }
        }
    }
    symbols
}

/// Read a symbol map from the stream. A map with no symbols is a format error.
pub fn read_sym_map<R: Read>(br: &mut BitReader<R>) -> Result<Vec<u8>> {
    let mut maps = vec![br.read_bits(16)? as u16];
    for _ in 0..maps[0].count_ones() {
        maps.push(br.read_bits(16)? as u16);
    }
    let symbols = decode_sym_map(&maps);
    if symbols.is_empty() {
        return Err(br.error(FormatReason::EmptySymbolMap));
    }
    Ok(symbols)
}

#[cfg(test)]
mod test {
    use super::{decode_sym_map, encode_sym_map, read_sym_map, write_sym_map};
    use crate::bitstream::bitpacker::BitPacker;
    use crate::bitstream::bitreader::BitReader;
    use crate::error::FormatReason;

    #[test]
    fn decode_symbol_map_test() {
        let maps = vec![11008, 32770, 4, 17754, 6208];
        let mut compare = "Making a silly test.".as_bytes().to_vec();
        compare.sort_unstable();
        compare.dedup();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn decode_symbol_map_full_test() {
        let maps = vec![0xffff; 17];
        let compare = (0..=255).collect::<Vec<u8>>();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn encode_symbol_map_test() {
        let mut used = [false; 256];
        "Making a silly test."
            .bytes()
            .for_each(|b| used[b as usize] = true);
        assert_eq!(encode_sym_map(&used), vec![11008, 32770, 4, 17754, 6208]);
    }

    #[test]
    fn stream_round_trip_test() {
        let mut used = [false; 256];
        used[0] = true;
        used[255] = true;
        let mut bp = BitPacker::new(16);
        write_sym_map(&mut bp, &used);
        assert_eq!(bp.bit_len(), 48);
        bp.flush();
        let mut br = BitReader::new(&bp.output[..]);
        assert_eq!(read_sym_map(&mut br).unwrap(), vec![0, 255]);
    }

    #[test]
    fn empty_map_is_rejected() {
        let data = [0_u8, 0, 0];
        let mut br = BitReader::new(&data[..]);
        let err = read_sym_map(&mut br).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::EmptySymbolMap));
    }
}
