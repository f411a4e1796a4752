//! BitReader: reads the packed bitstream of a compressed file, MSB-first.
//!
//! NOTE: This module can read from any I/O source that supports the read() call. Bytes are
//! pulled through an internal buffer one at a time as bits are needed, so the reader never
//! asks the source for more than one buffer ahead of the decoder.
//!
use std::io::{ErrorKind, Read};

use crate::error::{BzError, FormatReason, Result};

const BUFFER_SIZE: usize = 64 * 1024;

/// Reads a binary bzip2 stream.
#[derive(Debug)]
pub struct BitReader<R> {
    buffer: Vec<u8>,
    cursor: usize,
    filled: usize,
    /// Bits waiting to be handed out, right aligned.
    acc: u64,
    acc_bits: u32,
    /// Bytes taken from the source so far.
    position: u64,
    source: R,
}

impl<R: Read> BitReader<R> {
    /// Creates a new BitReader around `source`.
    pub fn new(source: R) -> Self {
        Self {
            buffer: vec![0; BUFFER_SIZE],
            cursor: 0,
            filled: 0,
            acc: 0,
            acc_bits: 0,
            position: 0,
            source,
        }
    }

    /// Next byte from the source. Running dry here is always a truncated stream.
    fn next_byte(&mut self) -> Result<u8> {
        if self.cursor == self.filled {
            loop {
                match self.source.read(&mut self.buffer) {
                    Ok(0) => {
                        return Err(BzError::format(self.position, FormatReason::UnexpectedEof))
                    }
                    Ok(size) => {
                        self.filled = size;
                        self.cursor = 0;
                        break;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        let byte = self.buffer[self.cursor];
        self.cursor += 1;
        self.position += 1;
        Ok(byte)
    }

    /// Return the next `count` bits (0-32) as a u32, first bit most significant.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count == 0 {
            return Ok(0);
        }
        while self.acc_bits < count {
            self.acc = (self.acc << 8) | self.next_byte()? as u64;
            self.acc_bits += 8;
        }
        self.acc_bits -= count;
        let mask = u64::MAX >> (64 - count);
        Ok(((self.acc >> self.acc_bits) & mask) as u32)
    }

    /// Return *true* if the next bit is 1, *false* if 0.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Count 1-bits up to the terminating 0-bit.
    pub fn read_unary(&mut self) -> Result<u32> {
        let mut count = 0;
        while self.read_bool()? {
            count += 1;
        }
        Ok(count)
    }

    /// Read a 32 bit integer written as two 16 bit halves.
    pub fn read_int(&mut self) -> Result<u32> {
        let high = self.read_bits(16)?;
        let low = self.read_bits(16)?;
        Ok(high << 16 | low)
    }

    /// Byte offset of the next unread bit in the compressed stream. Used to locate errors.
    pub fn position(&self) -> u64 {
        self.position - (self.acc_bits / 8) as u64
    }

    /// Debugging function to return the number of bytes.bits read so far
    pub fn loc(&self) -> String {
        let bits = self.position * 8 - self.acc_bits as u64;
        format!("[{}.{}]", bits / 8, bits % 8)
    }

    /// Build a format error pinned to the current position.
    pub fn error(&self, reason: FormatReason) -> BzError {
        BzError::format(self.position(), reason)
    }

    /// Recover the source. Any bytes still buffered are lost.
    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod test {
    use super::BitReader;
    use crate::error::FormatReason;

    #[test]
    fn read_bits_test() {
        let x = "Hello, world!".as_bytes();
        let mut br = BitReader::new(x);
        assert_eq!(br.read_bits(8).unwrap(), b'H' as u32);
        assert_eq!(br.read_bits(4).unwrap(), 0x6);
        assert_eq!(br.read_bits(12).unwrap(), 0x56c);
        assert_eq!(br.loc(), "[3.0]");
    }

    #[test]
    fn bool_test() {
        let x = [0b1010_0000_u8];
        let mut br = BitReader::new(&x[..]);
        assert!(br.read_bool().unwrap());
        assert!(!br.read_bool().unwrap());
        assert!(br.read_bool().unwrap());
        assert_eq!(br.loc(), "[0.3]");
    }

    #[test]
    fn unary_and_int_test() {
        let x = [0b1110_0000_u8, 0, 0, 0, 0];
        let mut br = BitReader::new(&x[..]);
        assert_eq!(br.read_unary().unwrap(), 3);
        assert_eq!(br.read_int().unwrap(), 0);
    }

    #[test]
    fn int_across_bytes_test() {
        let x = [0x12, 0x34, 0x56, 0x78];
        let mut br = BitReader::new(&x[..]);
        assert_eq!(br.read_int().unwrap(), 0x1234_5678);
        assert_eq!(br.position(), 4);
    }

    #[test]
    fn eof_is_a_format_error() {
        let x = [0xffu8];
        let mut br = BitReader::new(&x[..]);
        assert_eq!(br.read_bits(6).unwrap(), 0x3f);
        let err = br.read_bits(6).unwrap_err();
        assert_eq!(err.format_reason(), Some(FormatReason::UnexpectedEof));
    }
}
