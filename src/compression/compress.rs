use std::io::{self, Write};
use std::mem;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::compress_block::{close_block, BlockCompressor};
use crate::bitstream::bitpacker::PackedBlock;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::{BzError, Result};
use crate::tools::rle1::Rle1Encoder;

/// Block size multiplier, 1 (100k) to 9 (900k).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Any value outside 1..=9 is clamped into range.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 9))
    }

    /// The level digit written in the stream header.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Largest RLE1 block at this level.
    pub fn block_size(&self) -> usize {
        self.0 as usize * 100_000
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(9)
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    pub level: CompressionLevel,
    /// Huffman table optimisation passes; only the last one records the selectors.
    pub huffman_passes: usize,
    /// Close blocks on all cores. The output is the same either way.
    pub parallel: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(),
            huffman_passes: 4,
            parallel: false,
        }
    }
}

impl EncoderOptions {
    /// Options with the pass count clamped to 1..=8.
    pub fn normalized(self) -> Self {
        Self {
            huffman_passes: self.huffman_passes.clamp(1, 8),
            ..self
        }
    }
}

/// Compressing writer. Bytes written are gathered into blocks, and each block is encoded and
/// written to the inner writer as soon as it is full. Call finish() to close the stream.
pub struct Bz2Writer<W: Write> {
    /// None once the stream is finished.
    bw: Option<BitWriter<W>>,
    block: BlockCompressor,
    opts: EncoderOptions,
}

impl<W: Write> Bz2Writer<W> {
    pub fn new(inner: W, opts: EncoderOptions) -> Self {
        let opts = opts.normalized();
        Self {
            bw: Some(BitWriter::new(inner, opts.level)),
            block: BlockCompressor::new(opts.level.block_size(), opts.huffman_passes),
            opts,
        }
    }

    /// Compress all of `data`.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if self.bw.is_none() {
            return Err(BzError::Capacity("write after finish"));
        }
        let mut taken = 0;
        while taken < data.len() {
            taken += self.block.write_slice(&data[taken..]);
            // The block refused a byte, so it is full
            if taken < data.len() {
                self.close_block()?;
            }
        }
        Ok(())
    }

    /// Close the last block, write the end of stream marker and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.close_block()?;
        let bw = self
            .bw
            .take()
            .ok_or(BzError::Capacity("stream already finished"))?;
        let blocks = bw.blocks();
        let crc = bw.stream_crc();
        let inner = bw.finish()?;
        info!("Stream finished: {} blocks, stream CRC {:#010x}.", blocks, crc);
        Ok(inner)
    }

    /// Encode the current block, if it holds anything, and start a new one.
    fn close_block(&mut self) -> Result<()> {
        let bw = self
            .bw
            .as_mut()
            .ok_or(BzError::Capacity("write after finish"))?;
        if self.block.is_empty() {
            return Ok(());
        }
        let full = mem::replace(
            &mut self.block,
            BlockCompressor::new(self.opts.level.block_size(), self.opts.huffman_passes),
        );
        bw.add_block(&full.close())?;
        debug!("Block {} written.", bw.blocks());
        Ok(())
    }
}

impl<W: Write> Write for Bz2Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    /// Flushes the inner writer. The current block stays open.
    fn flush(&mut self) -> io::Result<()> {
        match self.bw.as_mut() {
            Some(bw) => bw.get_mut().flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for Bz2Writer<W> {
    fn drop(&mut self) {
        if self.bw.is_some() {
            let result = self
                .close_block()
                .and_then(|_| self.bw.as_mut().map_or(Ok(()), |bw| bw.close()));
            if let Err(e) = result {
                warn!("Could not finish the stream on drop: {}", e);
            }
            self.bw = None;
        }
    }
}

/// Compress `data` in one go.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_with(
        data,
        &EncoderOptions {
            level,
            ..EncoderOptions::default()
        },
    )
}

/// Compress `data` in one go with the given options.
pub fn compress_with(data: &[u8], opts: &EncoderOptions) -> Result<Vec<u8>> {
    if opts.parallel {
        return compress_parallel(data, opts);
    }
    let mut writer = Bz2Writer::new(Vec::with_capacity(data.len() / 2 + 64), *opts);
    writer.write_bytes(data)?;
    writer.finish()
}

/// Compress `data`, closing the blocks in parallel. Block boundaries are found first, with the
/// same RLE1 rules the sequential writer uses, so the output is byte for byte the same.
pub fn compress_parallel(data: &[u8], opts: &EncoderOptions) -> Result<Vec<u8>> {
    let opts = opts.normalized();
    let block_size = opts.level.block_size();

    let mut blocks = Vec::with_capacity(data.len() / block_size + 1);
    let mut rest = data;
    while !rest.is_empty() {
        let mut rle1 = Rle1Encoder::new(block_size);
        let taken = rle1.write_slice(rest);
        rest = &rest[taken..];
        blocks.push(rle1.finish());
    }
    info!("Closing {} blocks in parallel.", blocks.len());

    let packed = blocks
        .par_iter()
        .map(|block| close_block(block, opts.huffman_passes))
        .collect::<Vec<PackedBlock>>();

    let mut bw = BitWriter::new(Vec::with_capacity(data.len() / 2 + 64), opts.level);
    for block in &packed {
        bw.add_block(block)?;
    }
    bw.finish()
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::{compress, compress_parallel, Bz2Writer, CompressionLevel, EncoderOptions};
    use crate::error::BzError;

    #[test]
    fn level_test() {
        assert_eq!(CompressionLevel::new(0).level(), 1);
        assert_eq!(CompressionLevel::new(12).level(), 9);
        assert_eq!(CompressionLevel::new(3).block_size(), 300_000);
        assert_eq!(CompressionLevel::default().level(), 9);
    }

    #[test]
    fn passes_are_clamped() {
        let opts = EncoderOptions {
            huffman_passes: 0,
            ..EncoderOptions::default()
        };
        assert_eq!(opts.normalized().huffman_passes, 1);
        let opts = EncoderOptions {
            huffman_passes: 99,
            ..EncoderOptions::default()
        };
        assert_eq!(opts.normalized().huffman_passes, 8);
    }

    #[test]
    fn empty_input_test() {
        let out = compress(b"", CompressionLevel::new(9)).unwrap();
        assert_eq!(
            out,
            [b'B', b'Z', b'h', b'9', 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0, 0, 0, 0]
        );
    }

    #[test]
    fn writer_matches_one_shot() {
        let data = "It was the best of times, it was the worst of times. ".repeat(300);
        let expected = compress(data.as_bytes(), CompressionLevel::new(1)).unwrap();
        let opts = EncoderOptions {
            level: CompressionLevel::new(1),
            ..EncoderOptions::default()
        };
        let mut writer = Bz2Writer::new(Vec::new(), opts);
        for chunk in data.as_bytes().chunks(77) {
            writer.write_all(chunk).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), expected);
    }

    #[test]
    fn parallel_matches_sequential() {
        let data = (0..250_000_u32)
            .map(|i| (i.wrapping_mul(i) >> 7) as u8)
            .collect::<Vec<u8>>();
        let opts = EncoderOptions {
            level: CompressionLevel::new(1),
            ..EncoderOptions::default()
        };
        let sequential = compress(&data, opts.level).unwrap();
        let parallel = compress_parallel(&data, &opts).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn write_after_finish_is_refused() {
        let mut writer = Bz2Writer::new(Vec::new(), EncoderOptions::default());
        writer.write_bytes(b"abc").unwrap();
        // finish() consumes the writer, so the finished state is set here directly
        writer.bw = None;
        assert!(matches!(
            writer.write_bytes(b"d"),
            Err(BzError::Capacity(_))
        ));
    }

    #[test]
    fn drop_finishes_the_stream() {
        let mut out = Vec::new();
        {
            let mut writer = Bz2Writer::new(&mut out, EncoderOptions::default());
            writer.write_all(b"hello hello hello").unwrap();
        }
        assert_eq!(&out[..4], b"BZh9");
        assert_eq!(out, compress(b"hello hello hello", CompressionLevel::new(9)).unwrap());
    }
}
