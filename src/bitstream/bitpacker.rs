use log::error;

/// A block packed into whole bytes, ready to be spliced into the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBlock {
    /// Packed bits, MSB-first, zero padded in the last byte.
    pub bytes: Vec<u8>,
    /// How many zero bits were added to the last byte (0-7).
    pub padding: u8,
    /// CRC of the block's logical bytes.
    pub crc: u32,
}

/// Creates a bitstream for one block in memory.
pub struct BitPacker {
    pub output: Vec<u8>,
    queue: u64,
    q_bits: u8,
}

impl BitPacker {
    /// Create a new BitPacker with an output buffer of size specified. Suggest the
    /// size be set to the block size. Call flush() to flush the bit queue to the buffer
    /// before using the output.
    pub fn new(size: usize) -> Self {
        Self {
            output: Vec::with_capacity(size),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Internal bitstream write function common to all write functions.
    fn write_stream(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
    }

    /// Writes the low `count` bits of `value`, most significant first. `count` may be 0-32.
    pub fn write_bits(&mut self, count: u32, value: u32) {
        if count == 0 {
            return;
        }
        let mask = u64::MAX >> (64 - count);
        self.queue <<= count;
        self.queue |= value as u64 & mask;
        self.q_bits += count as u8;
        self.write_stream();
    }

    /*
    NOTE: out24 takes a u32.  The 8 most significant bits of the word indicate how
    many of the least significant bits will be written. Those bits must be aligned to
    the least signficant bit. (The middle bits are masked out.)

    It is used to write the merged length/code words of the Huffman tables.
    Eg 0000100_00000000_00000000_00000010 writes out 0010.
    */
    /// Writes 0-24 bits encoded with the number of bits to write in the most
    /// significant byte of a 32 bit word.
    pub fn out24(&mut self, data: u32) {
        let depth = data >> 24;
        self.write_bits(depth, data & 0x00ff_ffff);
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, bit: bool) {
        self.write_bits(1, bit as u32);
    }

    /// Writes `value` 1-bits followed by a terminating 0-bit.
    pub fn write_unary(&mut self, mut value: u32) {
        while value >= 24 {
            self.write_bits(24, 0x00ff_ffff);
            value -= 24;
        }
        // value ones followed by a zero, as one (value + 1)-bit word
        self.write_bits(value + 1, ((1_u32 << value) - 1) << 1);
    }

    /// Writes a 32 bit integer as two 16 bit halves.
    pub fn write_int(&mut self, value: u32) {
        self.write_bits(16, value >> 16);
        self.write_bits(16, value & 0xffff);
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.output.len() * 8 + self.q_bits as usize
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// signficant bits. Returns the number of padding bits added.
    pub fn flush(&mut self) -> u8 {
        let mut padding = 0;
        if self.q_bits > 0 {
            padding = 8 - self.q_bits;
            self.queue <<= padding; //pad the queue with zeros
            self.q_bits += padding;
            self.write_stream(); // write out all that is left
            if self.q_bits > 0 {
                error!("Stuff left in the BitPacker queue.");
            }
        }
        padding
    }

    /// Flush and hand over the packed block.
    pub fn into_block(mut self, crc: u32) -> PackedBlock {
        let padding = self.flush();
        PackedBlock {
            bytes: self.output,
            padding,
            crc,
        }
    }

    /// Debugging function to return the number of bytes.bits output so far
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.bit_len() / 8, self.bit_len() % 8)
    }
}
