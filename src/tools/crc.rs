//! CRC-32 as used by bzip2: polynomial 0x04c11db7, processed MSB-first, initial value and final
//! xor 0xffffffff. Blocks carry the CRC of their logical (pre-RLE1) bytes; the stream trailer
//! carries a rotate-and-xor fold of the block CRCs.

const POLY: u32 = 0x04c1_1db7;

/// Lookup table, built at compile time.
static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 0x8000_0000 != 0 {
                (c << 1) ^ POLY
            } else {
                c << 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Running block CRC.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    crc: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self { crc: 0xffff_ffff }
    }

    /// Start over for a new block.
    pub fn reset(&mut self) {
        self.crc = 0xffff_ffff;
    }

    /// Add one byte.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.crc = (self.crc << 8) ^ CRC_TABLE[((self.crc >> 24) as u8 ^ byte) as usize];
    }

    /// Add `count` copies of `byte`.
    pub fn update_run(&mut self, byte: u8, count: usize) {
        for _ in 0..count {
            self.update(byte);
        }
    }

    /// Add a slice of bytes.
    pub fn update_slice(&mut self, data: &[u8]) {
        data.iter().for_each(|&b| self.update(b));
    }

    /// The finished CRC of everything added since the last reset.
    pub fn current(&self) -> u32 {
        !self.crc
    }
}

/// Compute a one-shot CRC of `data`.
pub fn do_crc(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update_slice(data);
    crc.current()
}

/// Fold a block CRC into the stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}

#[cfg(test)]
mod test {
    use super::{do_crc, do_stream_crc, Crc32};

    #[test]
    fn check_value_test() {
        // Standard check value for CRC-32/BZIP2
        assert_eq!(do_crc(b"123456789"), 0xfc89_1918);
    }

    #[test]
    fn empty_crc_test() {
        assert_eq!(do_crc(&[]), 0);
    }

    #[test]
    fn run_matches_bytes_test() {
        let mut a = Crc32::new();
        a.update_run(b'a', 20);
        assert_eq!(a.current(), do_crc(&[b'a'; 20]));
        a.reset();
        assert_eq!(a.current(), 0);
    }

    #[test]
    fn stream_fold_test() {
        assert_eq!(do_stream_crc(0, 0x1234_5678), 0x1234_5678);
        assert_eq!(do_stream_crc(0x8000_0000, 0), 1);
        assert_eq!(do_stream_crc(0x1234_5678, 0x1234_5678), 0x1234_5678 ^ 0x2468_acf0);
    }
}
