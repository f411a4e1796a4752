//! Perform the move-to-front transform and run-length-encoding phase 2 prior to the Huffman stage.
//!
//! The move-to-front transform will increase the frequency of lower byte values. The result of
//! this is that the huffman codes can more efficiently compress those high frequency bytes.
//!
//! The run-length-encoding compresses runs of MTF rank zero regardless of their length. The
//! length of each run is written in bijective base 2 using the two symbols RUNA and RUNB, least
//! significant digit first. Every other rank r is written as the symbol r + 1, and the block
//! ends with the EOB symbol, one past the largest possible rank.
//!
//! Encoding also returns the symbol frequencies used during the huffman stage.
//!
use super::mtf::MoveToFront;

pub const RUNA: u16 = 0;
pub const RUNB: u16 = 1;

/// MTF/RLE2 output for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle2Block {
    /// The symbol stream, ending with EOB.
    pub symbols: Vec<u16>,
    /// Frequency of every symbol of the alphabet.
    pub freqs: Vec<u32>,
    /// Number of symbols in the alphabet: used byte values + 2.
    pub alpha_size: usize,
    /// The end-of-block symbol.
    pub eob: u16,
}

/// Does the Move-To-Front transform and Run-Length-Encoding 2 of a BWT block. `in_use` marks
/// the byte values present in the block.
pub fn rle2_mtf_encode(block: &[u8], in_use: &[bool; 256]) -> Rle2Block {
    // Renumber the used bytes densely, in byte order.
    let mut dense = [0_u8; 256];
    let mut used = 0_usize;
    for (byte, _) in in_use.iter().enumerate().filter(|(_, &b)| b) {
        dense[byte] = used as u8;
        used += 1;
    }
    let eob = used as u16 + 1;
    let alpha_size = used + 2;

    let mut mtf = MoveToFront::new();
    let mut rle2 = Vec::with_capacity(block.len() + 1);
    let mut freqs = vec![0_u32; alpha_size];
    let mut zeros = 0_usize;

    for &byte in block {
        let rank = mtf.value_to_front(dense[byte as usize]);
        if rank == 0 {
            zeros += 1;
            continue;
        }
        // Not a zero, so output any pending zeros first
        if zeros > 0 {
            write_run(zeros, &mut rle2, &mut freqs);
            zeros = 0;
        }
        let symbol = rank as u16 + 1;
        freqs[symbol as usize] += 1;
        rle2.push(symbol);
    }

    // Write any trailing zeros, then the EOB symbol
    if zeros > 0 {
        write_run(zeros, &mut rle2, &mut freqs);
    }
    freqs[eob as usize] += 1;
    rle2.push(eob);

    Rle2Block {
        symbols: rle2,
        freqs,
        alpha_size,
        eob,
    }
}

/// Encodes a run of zeros as RUNA/RUNB, recording how many RUNA and RUNB were used.
fn write_run(run: usize, out: &mut Vec<u16>, freqs: &mut [u32]) {
    let mut n = run - 1;
    loop {
        let bit = (n & 1) as u16;
        out.push(bit);
        freqs[bit as usize] += 1;
        if n < 2 {
            break;
        }
        n = (n - 2) >> 1;
    }
}
