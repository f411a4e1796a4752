//! Rust version of the bzip2 block-sorting compressor.
//!
//! Provides fast, safe compression and decompression of data using the bzip2 format. Streams
//! written here are readable by bzip2, and bzip2 streams (without randomised blocks) are
//! readable here.
//!
//! Blocks can be closed on all cores with `compress_parallel` (or `EncoderOptions::parallel`).
//! The output is byte for byte the same as the single threaded encoder.
//!
//! ```no_run
//! use rbzip2::{compress, decompress, CompressionLevel};
//!
//! let packed = compress(b"hello hello hello", CompressionLevel::new(9)).unwrap();
//! assert_eq!(decompress(&packed).unwrap(), b"hello hello hello");
//! ```
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{
    compress, compress_parallel, compress_with, Bz2Writer, CompressionLevel, EncoderOptions,
};
pub use compression::decompress::{decompress, test_integrity, Bz2Reader, StreamSummary};
pub use error::{BzError, FormatReason, IntegrityKind, Result};

/// Stream signature, followed by the block size digit.
pub const STREAM_MAGIC: [u8; 3] = *b"BZh";
/// Starts every block (BCD of pi).
pub const BLOCK_MAGIC: [u8; 6] = [0x31, 0x41, 0x59, 0x26, 0x53, 0x59];
/// Ends the stream (BCD of sqrt(pi)), followed by the stream CRC.
pub const END_MAGIC: [u8; 6] = [0x17, 0x72, 0x45, 0x38, 0x50, 0x90];
