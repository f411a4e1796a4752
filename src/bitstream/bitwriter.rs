use std::io::Write;

use log::trace;

use super::bitpacker::PackedBlock;
use crate::error::{BzError, Result};
use crate::tools::crc::do_stream_crc;
use crate::{CompressionLevel, END_MAGIC, STREAM_MAGIC};

/// Writes a bitstream for output. Takes the blocks packed by BitPacker and assembles them with
/// the stream header and footer, calculating the stream CRC as it processes the blocks.
pub struct BitWriter<W: Write> {
    /// Output buffer used to write the bitstream.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,

    /// Handle to the output stream
    writer: W,
    /// Block size, needed to create the header.
    level: CompressionLevel,
    /// Set once the stream header is queued.
    header_written: bool,
    /// Stream CRC, calculated from each block crc and added to the stream footer.
    stream_crc: u32,
    /// Number of blocks added so far.
    blocks: u32,
}

impl<W: Write> BitWriter<W> {
    /// Create a new Bitwriter around `writer`. We need the block size to create the header.
    /// Use add_block() to add each block to the stream and finish() to close it.
    pub fn new(writer: W, level: CompressionLevel) -> Self {
        Self {
            output: Vec::with_capacity(level.block_size() + 64),
            queue: 0,
            q_bits: 0,
            writer,
            level,
            header_written: false,
            stream_crc: 0,
            blocks: 0,
        }
    }

    /// Push the stream header to output buffer.
    fn push_header(&mut self) {
        STREAM_MAGIC.iter().for_each(|&x| self.out8(x));
        self.out8(b'0' + self.level.level());
        self.header_written = true;
    }

    /// Add a block of data to the output. The block is assumed to be packed by BitPacker;
    /// its padding bits are dropped so the next block continues on the same byte.
    pub fn add_block(&mut self, block: &PackedBlock) -> Result<()> {
        // If this is the first block, write the header
        if !self.header_written {
            self.push_header()
        };

        // Update the stream crc
        self.stream_crc = do_stream_crc(self.stream_crc, block.crc);
        self.blocks += 1;

        // Write all the block data
        block.bytes.iter().for_each(|&x| self.out8(x));

        // Back up the queue to remove any padding on the last byte
        if block.padding > 0 {
            self.queue >>= block.padding as u64;
            self.q_bits -= block.padding
        }
        trace!(
            "Spliced block {} ({} bytes, {} padding bits), {} bits carried over.",
            self.blocks,
            block.bytes.len(),
            block.padding,
            self.q_bits
        );

        // Write out the data in the bitstream buffer. The queue will carry over to the next block.
        self.drain()
    }

    /// Stream CRC folded over all blocks added so far.
    pub fn stream_crc(&self) -> u32 {
        self.stream_crc
    }

    /// Number of blocks added so far.
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    /// Write the footer (end of stream magic and stream CRC), pad to a byte boundary and
    /// return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        Ok(self.writer)
    }

    /// Footer and final flush, shared by finish() and the stream writers that keep the
    /// BitWriter inside themselves.
    pub(crate) fn close(&mut self) -> Result<()> {
        if !self.header_written {
            self.push_header();
        }
        END_MAGIC.iter().for_each(|&x| self.out8(x));
        self.out8((self.stream_crc >> 24) as u8);
        self.out8((self.stream_crc >> 16) as u8);
        self.out8((self.stream_crc >> 8) as u8);
        self.out8(self.stream_crc as u8);

        // Now flush the queue
        self.flush();
        self.drain()?;
        self.writer.flush().map_err(BzError::from)
    }

    /// Mutable access to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Hand the output buffer to the writer.
    fn drain(&mut self) -> Result<()> {
        self.writer.write_all(&self.output)?;
        self.output.clear();
        Ok(())
    }

    /// Internal bitstream write function common to all out.XX functions.
    fn push_queue(&mut self) {
        // If the queue has less than 8 bits left, write all full bytes to the output buffer.
        if self.q_bits > 56 {
            while self.q_bits > 7 {
                let byte = (self.queue >> (self.q_bits - 8)) as u8;
                self.output.push(byte); //push the packed byte out
                self.q_bits -= 8; //adjust the count of bits left in the queue
            }
        }
    }

    /// Put a byte of pre-packed binary encoded data on the stream.
    fn out8(&mut self, data: u8) {
        // Make sure the queue is empty enough to hold the data
        self.push_queue();
        self.queue <<= 8; //shift queue by one byte
        self.queue |= data as u64; //add the byte to queue
        self.q_bits += 8; //update depth of queue bits
    }

    /// Flushes the remaining bits (1-7) from the buffer, padding with 0s in the least
    /// signficant bits. Flush MUST be called before reading the output or data may be
    /// left in the internal queue.
    fn flush(&mut self) {
        // First push out all the full bytes
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
        // Then push out the remaining bits
        if self.q_bits > 0 {
            let mut byte = (self.queue & (0xff >> (8 - self.q_bits)) as u64) as u8;
            byte <<= 8 - self.q_bits;
            self.output.push(byte); //push the packed byte out
            self.q_bits = 0; //adjust the count of bits left in the queue
        }
    }
}
