//! The bwt_algorithms module forms the critical sorting subsystem of the compressor.
//!
//! bzip2 uses the Burrows-Wheeler Transform (BWT) to prepare data for compression. This transform
//! alters the data in such a way that runs of similar bytes are more likely to occur. This allows
//! for more effective compression.
//!
//! The BWT requires "computationally expensive" sorting of every rotation of a block. The sort
//! is split up as follows:
//! - bwt_sort: entry point. Blocks that repeat a shorter string are reduced to that string.
//! - induced_sort: cyclic SA-IS. Types every position and induces the full order from the B*
//!   positions.
//! - substring_sort: orders the B* substrings (multi-key introsort on 256 x 256 buckets).
//! - rank_doubling: settles B* substrings that compare equal.
//! - bwt_decode: the inverse transform.
//!
pub mod bwt_decode;
pub mod bwt_sort;
pub mod induced_sort;
pub mod rank_doubling;
pub mod substring_sort;
