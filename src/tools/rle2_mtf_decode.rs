//! Reverses MTF/RLE2, one symbol at a time as the Huffman decoder produces them.
//!
//! RUNA and RUNB accumulate the length of a run of MTF rank zero: each one adds the current
//! increment (RUNA) or twice the increment (RUNB), and the increment doubles. Any other symbol
//! first flushes the pending run, then resolves symbol - 1 as an MTF rank. EOB ends the block.
//!
use log::error;

use super::freq_count::freqs;
use super::mtf::MoveToFront;
use super::rle2_mtf::{RUNA, RUNB};
use crate::error::FormatReason;

/// Materializes one BWT block from its MTF/RLE2 symbols.
#[derive(Debug)]
pub struct Rle2MtfDecoder {
    /// Dense index to byte value.
    symbols: Vec<u8>,
    mtf: MoveToFront,
    out: Vec<u8>,
    limit: usize,
    run: usize,
    inc: usize,
    eob: u16,
}

impl Rle2MtfDecoder {
    /// `symbols` are the used byte values in ascending order, as read from the symbol map.
    /// The block may hold at most `limit` bytes.
    pub fn new(symbols: Vec<u8>, limit: usize) -> Self {
        let eob = symbols.len() as u16 + 1;
        Self {
            symbols,
            mtf: MoveToFront::new(),
            out: Vec::with_capacity(limit),
            limit,
            run: 0,
            inc: 1,
            eob,
        }
    }

    /// The end-of-block symbol for this block.
    pub fn eob(&self) -> u16 {
        self.eob
    }

    /// Number of symbols in the alphabet.
    pub fn alpha_size(&self) -> usize {
        self.eob as usize + 1
    }

    /// Feed one symbol. Returns true once EOB has been seen.
    pub fn decode_symbol(&mut self, symbol: u16) -> Result<bool, FormatReason> {
        match symbol {
            RUNA => {
                self.run += self.inc;
                self.inc <<= 1;
                self.check_run()?;
            }
            RUNB => {
                self.run += self.inc << 1;
                self.inc <<= 1;
                self.check_run()?;
            }
            n if n == self.eob => {
                self.flush_run();
                return Ok(true);
            }
            n => {
                self.flush_run();
                if self.out.len() >= self.limit {
                    return Err(FormatReason::BlockOverflow);
                }
                let dense = self.mtf.index_to_front(n as usize - 1);
                self.out.push(self.symbols[dense as usize]);
            }
        }
        Ok(false)
    }

    /// Hand over the BWT block and its byte counts.
    pub fn finish(self) -> (Vec<u8>, [u32; 256]) {
        let counts = freqs(&self.out);
        (self.out, counts)
    }

    /// Watch for runs that would overflow the block (and for malicious input).
    fn check_run(&self) -> Result<(), FormatReason> {
        if self.out.len() + self.run > self.limit {
            error!(
                "Run of {} zeros overflows the block at {} bytes.",
                self.run,
                self.out.len()
            );
            return Err(FormatReason::BlockOverflow);
        }
        Ok(())
    }

    /// Output zeros from RUNA/RUNB sequences, if any.
    fn flush_run(&mut self) {
        if self.run > 0 {
            let byte = self.symbols[self.mtf.peek(0) as usize];
            self.out.resize(self.out.len() + self.run, byte);
            self.run = 0;
            self.inc = 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::Rle2MtfDecoder;
    use crate::error::FormatReason;
    use crate::tools::rle2_mtf::rle2_mtf_encode;

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let mut in_use = [false; 256];
        data.iter().for_each(|&b| in_use[b as usize] = true);
        let encoded = rle2_mtf_encode(data, &in_use);
        let symbols = (0..=255_u8).filter(|&b| in_use[b as usize]).collect();
        let mut dec = Rle2MtfDecoder::new(symbols, data.len());
        assert_eq!(dec.eob(), encoded.eob);
        let mut done = false;
        for &s in &encoded.symbols {
            assert!(!done);
            done = dec.decode_symbol(s).unwrap();
        }
        assert!(done);
        let (out, counts) = dec.finish();
        assert_eq!(counts.iter().sum::<u32>() as usize, out.len());
        out
    }

    #[test]
    fn decode_test() {
        let data = b"aabbbbca";
        assert_eq!(round_trip(data), data);
    }

    #[test]
    fn long_runs_test() {
        let mut data = vec![b'q'; 1000];
        data.extend_from_slice(b"rrrrrrrrrrrrrrrrrrrrrrqqqq");
        data.extend(vec![0_u8; 777]);
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn every_byte_value_test() {
        let data = (0..=255_u8).rev().chain(0..=255).collect::<Vec<u8>>();
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut dec = Rle2MtfDecoder::new(vec![b'a'], 3);
        // RUNB, RUNB = 2 + 4 = 6 zeros
        assert_eq!(dec.decode_symbol(1), Ok(false));
        assert_eq!(dec.decode_symbol(1), Err(FormatReason::BlockOverflow));
    }
}
