//! Error types for the compressor and decompressor.
//!
//! Every failure inside the pipeline propagates to the caller. Nothing is
//! silently recovered: a format error aborts the stream, an integrity error
//! reports corruption, and a capacity error flags misuse of the encoder.

use std::fmt::{self, Display, Formatter};
use std::io;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BzError>;

/// Why a compressed stream was rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatReason {
    /// The stream did not start with `BZh`.
    BadStreamMagic,
    /// The block size digit was not '1'..='9'.
    BadBlockSize,
    /// A 48-bit marker was neither a block header nor the end-of-stream marker.
    BadBlockMarker,
    /// The randomised flag was set. Such blocks are never produced and not supported.
    Randomised,
    /// The table count was outside 2..=6.
    BadTableCount,
    /// The selector count was zero or larger than a 900k block can need.
    BadSelectorCount,
    /// An MTF-coded selector named a table that does not exist.
    BadSelector,
    /// A transmitted code length was outside 1..=20.
    BadCodeLength,
    /// No code of up to 23 bits matched the input.
    CodeTooLong,
    /// More symbols were coded than the selectors cover.
    SelectorOverrun,
    /// The block decoded to more bytes than the declared block size.
    BlockOverflow,
    /// The BWT start pointer does not index into the decoded block.
    BadStartPointer,
    /// The symbol map declares no byte values at all.
    EmptySymbolMap,
    /// The byte source ran dry in the middle of a bit read.
    UnexpectedEof,
}

impl Display for FormatReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            FormatReason::BadStreamMagic => "invalid stream signature",
            FormatReason::BadBlockSize => "invalid block size digit",
            FormatReason::BadBlockMarker => "invalid block marker",
            FormatReason::Randomised => "randomised blocks are not supported",
            FormatReason::BadTableCount => "invalid Huffman table count",
            FormatReason::BadSelectorCount => "invalid selector count",
            FormatReason::BadSelector => "selector names a missing table",
            FormatReason::BadCodeLength => "invalid Huffman code length",
            FormatReason::CodeTooLong => "Huffman code exceeds maximum length",
            FormatReason::SelectorOverrun => "symbols run past the last selector",
            FormatReason::BlockOverflow => "block exceeds declared block size",
            FormatReason::BadStartPointer => "BWT start pointer out of range",
            FormatReason::EmptySymbolMap => "symbol map is empty",
            FormatReason::UnexpectedEof => "unexpected end of data",
        };
        f.write_str(text)
    }
}

/// Which checksum failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    /// The CRC of one block's decoded bytes did not match its header.
    Block {
        block: u32,
        expected: u32,
        computed: u32,
    },
    /// The folded stream CRC did not match the trailer.
    Stream { expected: u32, computed: u32 },
}

impl Display for IntegrityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityKind::Block {
                block,
                expected,
                computed,
            } => write!(
                f,
                "block {} CRC mismatch: expected {:#010x}, computed {:#010x}",
                block, expected, computed
            ),
            IntegrityKind::Stream { expected, computed } => write!(
                f,
                "stream CRC mismatch: expected {:#010x}, computed {:#010x}",
                expected, computed
            ),
        }
    }
}

/// The crate error type.
#[derive(Debug, Error)]
pub enum BzError {
    /// The compressed stream is malformed.
    #[error("format error{}: {} (at byte {})", block_label(.block), .reason, .offset)]
    Format {
        /// One-based index of the block being decoded, if any.
        block: Option<u32>,
        /// Byte offset in the compressed stream where the problem was detected.
        offset: u64,
        reason: FormatReason,
    },

    /// A checksum failed; the data is corrupt.
    #[error("integrity error: {0}")]
    Integrity(IntegrityKind),

    /// The encoder was used past its capacity or after it was finished.
    #[error("capacity error: {0}")]
    Capacity(&'static str),

    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn block_label(block: &Option<u32>) -> String {
    match block {
        Some(b) => format!(" in block {}", b),
        None => String::new(),
    }
}

impl BzError {
    /// Build a format error with no block context yet.
    pub fn format(offset: u64, reason: FormatReason) -> Self {
        BzError::Format {
            block: None,
            offset,
            reason,
        }
    }

    /// Attach a block index to a format error that does not have one.
    pub fn in_block(self, index: u32) -> Self {
        match self {
            BzError::Format {
                block: None,
                offset,
                reason,
            } => BzError::Format {
                block: Some(index),
                offset,
                reason,
            },
            other => other,
        }
    }

    /// True for both block and stream checksum failures.
    pub fn is_integrity(&self) -> bool {
        matches!(self, BzError::Integrity(_))
    }

    /// The format reason, if this is a format error.
    pub fn format_reason(&self) -> Option<FormatReason> {
        match self {
            BzError::Format { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl From<BzError> for io::Error {
    fn from(err: BzError) -> Self {
        match err {
            BzError::Io(e) => e,
            BzError::Capacity(_) => io::Error::new(io::ErrorKind::Other, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn in_block_only_fills_missing_context() {
        let err = BzError::format(12, FormatReason::BadTableCount).in_block(3);
        assert!(matches!(
            err,
            BzError::Format {
                block: Some(3),
                offset: 12,
                ..
            }
        ));
        let err = err.in_block(7);
        assert!(matches!(err, BzError::Format { block: Some(3), .. }));
    }

    #[test]
    fn display_names_the_block() {
        let err = BzError::format(5, FormatReason::CodeTooLong).in_block(2);
        let text = err.to_string();
        assert!(text.contains("block 2"));
        assert!(text.contains("maximum length"));
    }

    #[test]
    fn io_conversion_keeps_the_source() {
        let err = BzError::Integrity(IntegrityKind::Stream {
            expected: 1,
            computed: 2,
        });
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        let inner = io_err.into_inner().unwrap();
        let bz = inner.downcast::<BzError>().unwrap();
        assert!(bz.is_integrity());
    }
}
