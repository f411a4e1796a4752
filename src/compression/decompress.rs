use std::io::{self, Read};

use log::{error, info, trace};

use super::compress::CompressionLevel;
use super::decompress_block::BlockDecompressor;
use crate::bitstream::bitreader::BitReader;
use crate::error::{BzError, FormatReason, IntegrityKind, Result};
use crate::tools::crc::do_stream_crc;
use crate::{BLOCK_MAGIC, END_MAGIC, STREAM_MAGIC};

/// What an integrity test found in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub blocks: u32,
    /// Decompressed size.
    pub bytes: u64,
    pub stream_crc: u32,
}

#[derive(Debug)]
enum State {
    /// Nothing read yet.
    Start,
    /// Between blocks; a marker comes next.
    Marker,
    Block(Box<BlockDecompressor>),
    /// End of stream seen and checked, or an error was returned.
    Done,
}

/// Decompressing reader. Blocks are decoded one at a time, when the previous one is used up.
/// Decoding stops at the first end of stream marker.
#[derive(Debug)]
pub struct Bz2Reader<R: Read> {
    br: BitReader<R>,
    state: State,
    block_size: usize,
    blocks: u32,
    bytes: u64,
    stream_crc: u32,
    /// Error held back by read() until the bytes before it are returned.
    pending: Option<BzError>,
}

impl<R: Read> Bz2Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            br: BitReader::new(inner),
            state: State::Start,
            block_size: 0,
            blocks: 0,
            bytes: 0,
            stream_crc: 0,
            pending: None,
        }
    }

    /// Next decompressed byte, or None at the end of the stream.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let result = self.advance();
        if result.is_err() {
            self.state = State::Done;
        }
        result
    }

    /// Blocks started so far.
    pub fn blocks_read(&self) -> u32 {
        self.blocks
    }

    /// Stream CRC folded over the blocks verified so far.
    pub fn stream_crc(&self) -> u32 {
        self.stream_crc
    }

    /// Bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    fn advance(&mut self) -> Result<Option<u8>> {
        loop {
            match &mut self.state {
                State::Start => {
                    self.read_header()?;
                    self.state = State::Marker;
                }
                State::Marker => {
                    self.state = self.read_marker()?;
                }
                State::Block(block) => {
                    if let Some(byte) = block.next_byte() {
                        self.bytes += 1;
                        return Ok(Some(byte));
                    }
                    // The block CRC is checked before anything else is read
                    let crc = block.check_crc()?;
                    self.stream_crc = do_stream_crc(self.stream_crc, crc);
                    self.state = State::Marker;
                }
                State::Done => return Ok(None),
            }
        }
    }

    /// Check the signature and the block size digit.
    fn read_header(&mut self) -> Result<()> {
        for &expected in STREAM_MAGIC.iter() {
            if self.br.read_bits(8)? as u8 != expected {
                error!("Fatal error: not a valid bzip2 stream.");
                return Err(self.br.error(FormatReason::BadStreamMagic));
            }
        }
        let digit = self.br.read_bits(8)? as u8;
        if !(b'1'..=b'9').contains(&digit) {
            error!("Fatal error: found invalid block size.");
            return Err(self.br.error(FormatReason::BadBlockSize));
        }
        self.block_size = CompressionLevel::new(digit - b'0').block_size();
        info!("Found a valid bzip2 signature, block size {}.", self.block_size);
        Ok(())
    }

    /// Read a 48-bit marker and either open the next block or check the stream CRC.
    fn read_marker(&mut self) -> Result<State> {
        let mut marker = [0_u8; 6];
        for byte in marker.iter_mut() {
            *byte = self.br.read_bits(8)? as u8;
        }

        if marker == BLOCK_MAGIC {
            self.blocks += 1;
            trace!(
                "\r\x1b[43mFound a valid header for block {} at {}.    \x1b[0m",
                self.blocks,
                self.br.loc()
            );
            let block = BlockDecompressor::read(&mut self.br, self.block_size, self.blocks)?;
            info!(
                "Block {} decoded, CRC {:#010x}.",
                self.blocks,
                block.expected_crc()
            );
            return Ok(State::Block(Box::new(block)));
        }

        if marker == END_MAGIC {
            let expected = self.br.read_int()?;
            if expected != self.stream_crc {
                error!(
                    "Stream CRC mismatch: expected {:#010x}, computed {:#010x}.",
                    expected, self.stream_crc
                );
                return Err(BzError::Integrity(IntegrityKind::Stream {
                    expected,
                    computed: self.stream_crc,
                }));
            }
            info!(
                "End of stream after {} blocks, stream CRC {:#010x}.",
                self.blocks, self.stream_crc
            );
            return Ok(State::Done);
        }

        Err(self.br.error(FormatReason::BadBlockMarker))
    }
}

impl<R: Read> Read for Bz2Reader<R> {
    /// Bytes decoded before an error are returned first; the error comes with the next call.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(e) = self.pending.take() {
            return Err(e.into());
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.next_byte() {
                Ok(Some(byte)) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                Ok(None) => break,
                Err(e) if filled > 0 => {
                    self.pending = Some(e);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Decompress a whole stream in one go.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Bz2Reader::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    while let Some(byte) = reader.next_byte()? {
        out.push(byte);
    }
    Ok(out)
}

/// Decode a stream without keeping the output, checking every CRC.
pub fn test_integrity<R: Read>(reader: R) -> Result<StreamSummary> {
    let mut reader = Bz2Reader::new(reader);
    while reader.next_byte()?.is_some() {}
    Ok(StreamSummary {
        blocks: reader.blocks_read(),
        bytes: reader.bytes_read(),
        stream_crc: reader.stream_crc(),
    })
}
