use enough::StopReason;

use crate::btga::Segment;

/// Errors from BTGA decoding and TGA encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BtgaError {
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated input: range ends at byte {end}, file is {file_len} bytes")]
    TruncatedInput { end: u64, file_len: u64 },

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("invalid header: {0}")]
    Header(#[from] HeaderError),

    #[error("{kind} index {index} out of range (limit {limit})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: u32,
        limit: u32,
    },

    #[cfg(feature = "std")]
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(alloc::string::String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("unsupported pixel layout: {0:?}")]
    UnsupportedLayout(crate::PixelLayout),

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: crate::PixelLayout,
        actual: crate::PixelLayout,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for BtgaError {
    fn from(r: StopReason) -> Self {
        BtgaError::Cancelled(r)
    }
}

/// Inconsistencies in the on-disk block framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FramingError {
    #[error("segment descriptor declares zero blocks")]
    ZeroBlockCount,

    #[error("segment descriptor declares zero length")]
    ZeroSegmentLength,

    #[error("block sizes sum to {actual} bytes, segment declares {declared}")]
    SizeSumMismatch { declared: u32, actual: u64 },

    #[error("too many descriptor redirections")]
    RedirectionLimit,

    #[error("size table of {entries} entries does not match its length field {length}")]
    TableLengthMismatch { entries: u32, length: u32 },

    #[error("expected block tag, found size entry {0}")]
    BadMarker(i32),

    #[error("negative chunk size {0}")]
    NegativeChunk(i32),

    #[error("size table exhausted")]
    TableExhausted,
}

/// Header block contents that fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("header block is {0} bytes, expected 28")]
    WrongSize(usize),

    #[error("paletted texture has no palette")]
    MissingPalette,

    #[error("compressed texture has no palette index table")]
    MissingPaletteIndex,

    #[error("header declares no texture")]
    NoTexture,

    #[error("unknown texture format {0}")]
    UnknownFormat(u8),

    #[error("palette index table is {actual} bytes, expected {expected}")]
    PaletteIndexLength { expected: u32, actual: u32 },

    #[error("resolution needs {expected_bits} body bits, header declares {actual_bits}")]
    BodyLength { expected_bits: u64, actual_bits: u64 },

    #[error("{segment} block is {actual} bytes, header declares {expected}")]
    SegmentLength {
        segment: Segment,
        expected: u32,
        actual: usize,
    },
}

/// A format version argument that is not 1 through 4.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format version {0:?}, expected 1 to 4")]
pub struct ParseVersionError(pub alloc::string::String);

/// Which lookup an out-of-range index belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// A color index in the body of a paletted texture.
    Color,
    /// A palette offset in the palette-index table of a compressed texture.
    PaletteOffset,
    /// A block's entry in the palette-index table itself.
    IndexTable,
}

impl core::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            IndexKind::Color => "color",
            IndexKind::PaletteOffset => "palette offset",
            IndexKind::IndexTable => "palette index table",
        })
    }
}
