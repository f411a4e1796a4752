//! The bitstream module forms the I/O subsystem for the compressor and decompressor.
//!
//! Every higher-level structure in the format (markers, CRCs, symbol maps, Huffman tables,
//! selectors and coded symbols) is expressed in the MSB-first bit grammar provided here.
//!
//! Each block is packed into its own [`bitpacker::BitPacker`] so that blocks can be closed
//! independently (and in parallel). The [`bitwriter::BitWriter`] then assembles the packed
//! blocks with the stream header and footer, carrying the unaligned tail of one block into
//! the next, and folds the block CRCs into the stream CRC as it goes.
//!
//! The [`bitreader::BitReader`] mirrors this on the decode side, pulling one byte at a time
//! from any `std::io::Read` source.
//!
pub mod bitpacker;
pub mod bitreader;
pub mod bitwriter;
