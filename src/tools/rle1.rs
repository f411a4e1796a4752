//! Run-Length-Encoding phase 1, the first and last stage of the pipeline.
//!
//! Runs of 1-3 identical bytes are stored as they are. Runs of 4 to 255 bytes are stored as 4
//! literal bytes followed by a count byte holding the number of extra repeats (0-251). Longer
//! runs are split at 255.
//!
//! The encoder also keeps the block CRC (over the logical bytes, before RLE1) and the set of
//! byte values present in the RLE1 output, both of which are needed when the block is closed.
//!
use super::crc::Crc32;

/// The longest run encoded as one 4+count group.
const MAX_RUN: u32 = 255;

/// Head room kept at the end of a block for the final flush of a pending run.
pub const BLOCK_RESERVE: usize = 6;

/// A finished RLE1 block, ready for the BWT stage.
#[derive(Debug, Clone)]
pub struct Rle1Block {
    /// The RLE1 encoded bytes.
    pub data: Vec<u8>,
    /// Which byte values occur in `data`.
    pub in_use: [bool; 256],
    /// CRC of the logical bytes that went into the block.
    pub crc: u32,
}

/// Accumulates RLE1 output for a single block.
#[derive(Debug)]
pub struct Rle1Encoder {
    block: Vec<u8>,
    limit: usize,
    in_use: [bool; 256],
    crc: Crc32,
    run_value: u8,
    run_length: u32,
}

impl Rle1Encoder {
    /// New encoder for a block of at most `block_size` RLE1 bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            block: Vec::with_capacity(block_size + 1),
            limit: block_size.saturating_sub(BLOCK_RESERVE),
            in_use: [false; 256],
            crc: Crc32::new(),
            run_value: 0,
            run_length: 0,
        }
    }

    /// Add one byte. Returns false, without taking the byte, once the block is full.
    pub fn write(&mut self, value: u8) -> bool {
        if self.block.len() > self.limit {
            return false;
        }
        if self.run_length == 0 {
            self.run_value = value;
            self.run_length = 1;
        } else if self.run_value != value {
            self.write_run();
            self.run_value = value;
            self.run_length = 1;
        } else if self.run_length == MAX_RUN - 1 {
            self.run_length = MAX_RUN;
            self.write_run();
            self.run_length = 0;
        } else {
            self.run_length += 1;
        }
        true
    }

    /// Add as many bytes from `data` as fit. Returns how many were taken.
    pub fn write_slice(&mut self, data: &[u8]) -> usize {
        let mut taken = 0;
        for &byte in data {
            if !self.write(byte) {
                break;
            }
            taken += 1;
        }
        taken
    }

    /// True if nothing has been written to this block.
    pub fn is_empty(&self) -> bool {
        self.block.is_empty() && self.run_length == 0
    }

    /// Length of the RLE1 output so far, not counting a pending run.
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Flush the pending run and hand over the block.
    pub fn finish(mut self) -> Rle1Block {
        if self.run_length > 0 {
            self.write_run();
            self.run_length = 0;
        }
        Rle1Block {
            data: self.block,
            in_use: self.in_use,
            crc: self.crc.current(),
        }
    }

    /// Write the pending run to the block.
    fn write_run(&mut self) {
        let value = self.run_value;
        let length = self.run_length;
        self.in_use[value as usize] = true;
        self.crc.update_run(value, length as usize);
        match length {
            1..=3 => (0..length).for_each(|_| self.block.push(value)),
            _ => {
                let count = (length - 4) as u8;
                self.in_use[count as usize] = true;
                self.block.extend_from_slice(&[value; 4]);
                self.block.push(count);
            }
        }
    }
}

/// Reverses RLE1 one byte at a time while keeping the block CRC.
#[derive(Debug, Default)]
pub struct Rle1Decoder {
    last: Option<u8>,
    accumulator: u32,
    repeat: u32,
}

impl Rle1Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next logical byte, pulling RLE1 bytes from `source` as needed, or None
    /// when `source` is exhausted.
    pub fn next<F>(&mut self, crc: &mut Crc32, mut source: F) -> Option<u8>
    where
        F: FnMut() -> Option<u8>,
    {
        while self.repeat < 1 {
            let byte = source()?;
            if Some(byte) != self.last {
                self.last = Some(byte);
                self.repeat = 1;
                self.accumulator = 1;
                crc.update(byte);
            } else {
                self.accumulator += 1;
                if self.accumulator == 4 {
                    // The fourth equal byte is followed by the count of extra repeats.
                    self.repeat = source().map_or(1, |count| count as u32 + 1);
                    self.accumulator = 0;
                    crc.update_run(byte, self.repeat as usize);
                } else {
                    self.repeat = 1;
                    crc.update(byte);
                }
            }
        }
        self.repeat -= 1;
        self.last
    }
}

/// Reverse RLE1 over a whole buffer.
pub fn rle1_decode(data: &[u8]) -> Vec<u8> {
    let mut decoder = Rle1Decoder::new();
    let mut crc = Crc32::new();
    let mut input = data.iter().copied();
    let mut out = Vec::with_capacity(data.len());
    while let Some(byte) = decoder.next(&mut crc, || input.next()) {
        out.push(byte);
    }
    out
}
