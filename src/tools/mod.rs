//! The tools module provides the helper stages of the compression pipeline.
//!
//! bzip2 is a block-oriented approach to compress data. The stages around the BWT live here:
//!
//! The tools are:
//! - cli: Command line interface for the binary.
//! - crc: CRC32 checksum, both block and stream versions.
//! - freq_count: Byte frequency counts.
//! - mtf: The Move-To-Front table.
//! - rle1: Run-Length-Encoding phase 1, and its inverse.
//! - rle2_mtf: Move-To-Front transform and Run-Length-Encoding phase 2 (integrated for speed).
//! - rle2_mtf_decode: The inverse of rle2_mtf, fed one symbol at a time.
//! - symbol_map: Encode and decode the symbol map.
//!
pub mod cli;
pub mod crc;
pub mod freq_count;
pub mod mtf;
pub mod rle1;
pub mod rle2_mtf;
pub mod rle2_mtf_decode;
pub mod symbol_map;
