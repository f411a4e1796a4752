use log::{debug, info, trace};

use crate::bitstream::bitpacker::{BitPacker, PackedBlock};
use crate::bwt_algorithms::bwt_sort::bwt_encode;
use crate::huffman_coding::huffman::huf_encode;
use crate::tools::rle1::{Rle1Block, Rle1Encoder};
use crate::tools::rle2_mtf::rle2_mtf_encode;
use crate::tools::symbol_map::write_sym_map;
use crate::BLOCK_MAGIC;

/// Accumulates one block of input through RLE1, then closes it into a packed block.
#[derive(Debug)]
pub struct BlockCompressor {
    rle1: Rle1Encoder,
    huffman_passes: usize,
}

impl BlockCompressor {
    /// New, empty block of at most `block_size` RLE1 bytes.
    pub fn new(block_size: usize, huffman_passes: usize) -> Self {
        Self {
            rle1: Rle1Encoder::new(block_size),
            huffman_passes,
        }
    }

    /// Add one byte. Returns false, without taking the byte, when the block is full and must
    /// be closed.
    pub fn write(&mut self, value: u8) -> bool {
        self.rle1.write(value)
    }

    /// Add as many bytes from `data` as fit. Returns how many were taken.
    pub fn write_slice(&mut self, data: &[u8]) -> usize {
        self.rle1.write_slice(data)
    }

    /// True if no byte has been written to the block.
    pub fn is_empty(&self) -> bool {
        self.rle1.is_empty()
    }

    /// Flush the pending run and encode the block.
    pub fn close(self) -> PackedBlock {
        close_block(&self.rle1.finish(), self.huffman_passes)
    }
}

#[allow(clippy::unusual_byte_groupings)]
/// Encode one RLE1 block: BWT, block header, symbol map, MTF/RLE2 and the Huffman stage.
/// The result is packed into whole bytes, ready for BitWriter::add_block.
pub fn close_block(block: &Rle1Block, huffman_passes: usize) -> PackedBlock {
    let mut bp = BitPacker::new(block.data.len());

    // For each block, write the block header:
    // Six bytes of magic, 4 bytes of crc data, 1 bit for Randomized flag.
    trace!("\r\x1b[43mWriting magic and CRC at {}.    \x1b[0m", bp.loc());
    BLOCK_MAGIC.iter().for_each(|&b| bp.write_bits(8, b as u32));
    bp.write_int(block.crc);
    trace!("\r\x1b[43mWriting randomize bit at {}.    \x1b[0m", bp.loc());
    bp.write_bool(false);

    let (key, bwt) = bwt_encode(&block.data);

    // Now that we have the key, we can write the 24bit BWT key
    trace!("\r\x1b[43mWriting key at {}.    \x1b[0m", bp.loc());
    bp.out24(0x18_000000 | key);

    // Symbol map, the same for the RLE1 data and its BWT
    trace!("\r\x1b[43mWriting symbol map at {}.    \x1b[0m", bp.loc());
    write_sym_map(&mut bp, &block.in_use);

    let rle2 = rle2_mtf_encode(&bwt, &block.in_use);

    // Now for the compression - the Huffman encoding (which also writes out data)
    huf_encode(&mut bp, &rle2, huffman_passes);

    debug!(
        "{} bytes in block, {} after MTF & RLE2 coding, {} syms in use",
        block.data.len(),
        rle2.symbols.len(),
        rle2.alpha_size,
    );
    let packed = bp.into_block(block.crc);
    info!(
        "Closed block: {} RLE1 bytes into {} bytes, CRC {:#010x}.",
        block.data.len(),
        packed.bytes.len(),
        block.crc
    );
    packed
}

#[cfg(test)]
mod test {
    use super::BlockCompressor;
    use crate::bitstream::bitreader::BitReader;
    use crate::tools::crc::do_crc;

    #[test]
    fn block_header_test() {
        let mut block = BlockCompressor::new(100_000, 4);
        assert!(block.is_empty());
        assert_eq!(block.write_slice(b"banana"), 6);
        assert!(!block.is_empty());
        let packed = block.close();
        assert_eq!(packed.crc, do_crc(b"banana"));

        let mut br = BitReader::new(&packed.bytes[..]);
        assert_eq!(br.read_bits(24).unwrap(), 0x314159);
        assert_eq!(br.read_bits(24).unwrap(), 0x265359);
        assert_eq!(br.read_int().unwrap(), do_crc(b"banana"));
        assert!(!br.read_bool().unwrap());
        // banana sorts to row 3
        assert_eq!(br.read_bits(24).unwrap(), 3);
    }

    #[test]
    fn full_block_refuses_bytes() {
        let mut block = BlockCompressor::new(100, 1);
        let data = (0..200_u32).map(|i| (i * 7 % 251) as u8).collect::<Vec<u8>>();
        let taken = block.write_slice(&data);
        assert!(taken < data.len());
        assert!(!block.write(data[taken]));
        let packed = block.close();
        assert_eq!(packed.crc, do_crc(&data[..taken]));
        assert!(packed.padding < 8);
    }
}
