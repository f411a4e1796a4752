//! The compression module manages both directions of the stream: Bz2Writer and the one-shot
//! compress functions on one side, Bz2Reader, decompress and test_integrity on the other.
//!
//! BZIP2 compression happens in the following steps:
//! - Run Length Encoding 1: Compress all runs of 4-255 identical bytes.
//! - Burrow Wheeler Transform: Sort the data to increase the probability of runs of identical bytes.
//! - Move To Front transform: Increase the frequency of lower byte values, and thereby decrease the frequency of other byte values.
//! - Run Length Encoding 2: Compress all runs of the zero byte.
//! - Huffman coding: Encode frequent byte values using smaller bit codes and less frequent byte values with longer bit codes.
//!
//! While the initial RLE1 compression is probably not necessary, it is a legacy of the original bzip2 and must be preserved.
//!
//! The huffman stage makes several passes over the data to improve the compression ratio. Up to six different
//! huffman tables are generated for each block of data, and every chunk of 50 symbols within that block uses
//! whichever table results in the best compression ratio for that chunk.
//!
//! Blocks are independent once their RLE1 data is gathered, so they can be closed in parallel. The packed
//! blocks are then spliced into the stream in order.
//!
//! Decompression is single threaded and lazy: a block is decoded when the previous one is used up. It
//! follows the inverse of the compression process.
//! - Huffman decoding.
//! - RLE 2: Expand all runs of the zero byte.
//! - MTF transform: Convert from the Move-To-Front indecies to the symbols represented by the indecies.
//! - BWT reversal: Restore the original data from the BWT transform.
//! - RLE 1: Expand all runs of 4+ identical bytes.
//!

pub mod compress;
pub mod compress_block;
pub mod decompress;
pub mod decompress_block;
