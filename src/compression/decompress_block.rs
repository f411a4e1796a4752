use std::io::Read;

use log::{debug, error, trace};

use crate::bitstream::bitreader::BitReader;
use crate::bwt_algorithms::bwt_decode::InverseBwt;
use crate::error::{BzError, FormatReason, IntegrityKind, Result};
use crate::huffman_coding::huffman_decode::HuffmanDecoder;
use crate::tools::crc::Crc32;
use crate::tools::rle1::Rle1Decoder;
use crate::tools::rle2_mtf_decode::Rle2MtfDecoder;
use crate::tools::symbol_map::read_sym_map;

/// One decoded block, handed out a byte at a time. The Huffman and MTF/RLE2 stages run when
/// the block is read; the inverse BWT and RLE1 run as bytes are pulled.
#[derive(Debug)]
pub struct BlockDecompressor {
    inverse: InverseBwt,
    rle1: Rle1Decoder,
    crc: Crc32,
    expected_crc: u32,
    index: u32,
}

impl BlockDecompressor {
    /// Read block `index` (one based) from the stream. The 48-bit block marker has already
    /// been consumed. `block_size` is the declared maximum from the stream header.
    pub fn read<R: Read>(br: &mut BitReader<R>, block_size: usize, index: u32) -> Result<Self> {
        Self::read_block(br, block_size, index).map_err(|e| e.in_block(index))
    }

    fn read_block<R: Read>(br: &mut BitReader<R>, block_size: usize, index: u32) -> Result<Self> {
        let expected_crc = br.read_int()?;
        trace!("\r\x1b[43mBlock {} CRC is {:#010x}.    \x1b[0m", index, expected_crc);

        // Randomised blocks are never produced
        if br.read_bool()? {
            return Err(br.error(FormatReason::Randomised));
        }

        let start = br.read_bits(24)? as usize;

        trace!("\r\x1b[43mSymbol map read at {}.    \x1b[0m", br.loc());
        let symbols = read_sym_map(br)?;
        debug!("Found {} symbols for block {}.", symbols.len(), index);

        let mut rle2 = Rle2MtfDecoder::new(symbols, block_size);
        let mut huffman = HuffmanDecoder::read(br, rle2.alpha_size())?;

        // Undo the Huffman and MTF/RLE2 stages, up to and including EOB
        loop {
            let symbol = huffman.next_symbol(br)?;
            match rle2.decode_symbol(symbol) {
                Ok(true) => break,
                Ok(false) => {}
                Err(reason) => return Err(br.error(reason)),
            }
        }
        let (bwt, counts) = rle2.finish();
        trace!("\r\x1b[43mBlock data ends at {}.    \x1b[0m", br.loc());

        if start >= bwt.len() {
            return Err(br.error(FormatReason::BadStartPointer));
        }
        debug!("Block {}: {} BWT bytes, start pointer {}.", index, bwt.len(), start);

        Ok(Self {
            inverse: InverseBwt::new(&bwt, &counts, start),
            rle1: Rle1Decoder::new(),
            crc: Crc32::new(),
            expected_crc,
            index,
        })
    }

    /// Next byte of the block, or None once it is exhausted.
    pub fn next_byte(&mut self) -> Option<u8> {
        let inverse = &mut self.inverse;
        self.rle1.next(&mut self.crc, || inverse.next())
    }

    /// The CRC from the block header.
    pub fn expected_crc(&self) -> u32 {
        self.expected_crc
    }

    /// Check the CRC of the bytes handed out against the header. Returns the verified CRC.
    pub fn check_crc(&self) -> Result<u32> {
        let computed = self.crc.current();
        if computed != self.expected_crc {
            error!(
                "Block {} CRC mismatch: expected {:#010x}, computed {:#010x}.",
                self.index, self.expected_crc, computed
            );
            return Err(BzError::Integrity(IntegrityKind::Block {
                block: self.index,
                expected: self.expected_crc,
                computed,
            }));
        }
        Ok(computed)
    }
}

#[cfg(test)]
mod test {
    use super::BlockDecompressor;
    use crate::bitstream::bitpacker::BitPacker;
    use crate::bitstream::bitreader::BitReader;
    use crate::compression::compress_block::BlockCompressor;
    use crate::error::{BzError, FormatReason};

    /// Encode `data` as one block, returning the packed bytes after the block marker.
    fn packed_block(data: &[u8]) -> Vec<u8> {
        let mut block = BlockCompressor::new(100_000, 4);
        assert_eq!(block.write_slice(data), data.len());
        block.close().bytes
    }

    /// Reader positioned after the block marker.
    fn open(bytes: &[u8]) -> BitReader<&[u8]> {
        let mut br = BitReader::new(bytes);
        br.read_bits(24).unwrap();
        br.read_bits(24).unwrap();
        br
    }

    #[test]
    fn block_round_trip() {
        let data = b"If Peter Piper picked a peck of pickled peppers, where's the peck?";
        let bytes = packed_block(data);
        let mut br = open(&bytes);
        let mut block = BlockDecompressor::read(&mut br, 100_000, 1).unwrap();
        let mut out = Vec::new();
        while let Some(b) = block.next_byte() {
            out.push(b);
        }
        assert_eq!(out, data.to_vec());
        assert_eq!(block.check_crc().unwrap(), block.expected_crc());
    }

    #[test]
    fn runs_round_trip() {
        let mut data = vec![b'x'; 1000];
        data.extend_from_slice(b"yyyyzzzzz");
        data.extend(vec![0_u8; 300]);
        let bytes = packed_block(&data);
        let mut br = open(&bytes);
        let mut block = BlockDecompressor::read(&mut br, 100_000, 1).unwrap();
        let out = std::iter::from_fn(|| block.next_byte()).collect::<Vec<u8>>();
        assert_eq!(out, data);
        assert!(block.check_crc().is_ok());
    }

    #[test]
    fn bad_crc_is_an_integrity_error() {
        let mut bytes = packed_block(b"abcabcabc");
        // CRC starts right after the 6 byte marker
        bytes[6] ^= 0x01;
        let mut br = open(&bytes);
        let mut block = BlockDecompressor::read(&mut br, 100_000, 2).unwrap();
        while block.next_byte().is_some() {}
        let err = block.check_crc().unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn randomised_blocks_are_rejected() {
        let mut bp = BitPacker::new(16);
        bp.write_int(0);
        bp.write_bool(true);
        bp.write_bits(24, 0);
        bp.flush();
        let mut br = BitReader::new(&bp.output[..]);
        let err = BlockDecompressor::read(&mut br, 100_000, 4).unwrap_err();
        assert!(matches!(
            err,
            BzError::Format {
                block: Some(4),
                reason: FormatReason::Randomised,
                ..
            }
        ));
    }

    #[test]
    fn start_pointer_must_index_the_block() {
        let mut bytes = packed_block(b"banana");
        // The start pointer is the 24 bits after marker, CRC and randomised bit: bits 81..105.
        // Setting its top bit makes it far larger than the block.
        bytes[10] |= 0x40;
        let mut br = open(&bytes);
        let err = BlockDecompressor::read(&mut br, 100_000, 1).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::BadStartPointer));
    }
}
