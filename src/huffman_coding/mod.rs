//! The huffman module writes and reads the entropy coded part of each block.
//!
//! Huffman encoding is used in lieu of arithmetic encoding because of an historical problem with
//! licensing restrictions. While that has been resolved in more recent years, the bzip2 standard
//! was set based on the huffman standard.
//!
//! The huffman coding algorithm as used by bzip2 is both block and chunk oriented. Within each
//! block, groups of 50 MTF/RLE2 symbols are encoded separately using one of two to six huffman
//! tables. A selector per group names the table. This allows for higher compression ratios
//! compared to using one huffman table per block.
//!
//! Only code lengths are transmitted; both sides derive the canonical codes from them.
//!
pub mod huffman;
pub mod huffman_code_from_weights;
pub mod huffman_decode;

/// Symbols coded with one table before the next selector applies.
pub const GROUP_SIZE: usize = 50;
/// Longest code the encoder will produce.
pub const MAX_ENCODE_CODE_LEN: u32 = 20;
/// Longest code the decoder will accept.
pub const MAX_DECODE_CODE_LEN: u32 = 23;
/// Cost given to symbols outside a seed table's range.
pub const HIGH_SYMBOL_COST: u8 = 15;
pub const MIN_TABLES: usize = 2;
pub const MAX_TABLES: usize = 6;
/// Enough selectors for a 900k block that gains nothing from RLE1.
pub const MAX_SELECTORS: usize = 18_001;
