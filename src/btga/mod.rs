//! BTGA texture container decoding.
//!
//! Use top-level [`crate::decode_btga`] or [`crate::DecodeRequest`] unless
//! you need one of the stages on its own.

pub mod decode;
pub mod header;
pub mod palette;
pub mod segment;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use enough::Stop;

use crate::error::{BtgaError, HeaderError, ParseVersionError};
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::source::BlockSource;
use self::header::{BtgaHeader, TextureFormat};
use self::palette::{Color, build_base, expand_a3i5, expand_a5i3};
use self::segment::{SegmentReader, segment_reader};

/// Files shorter than this are rejected before any parsing.
pub const MIN_FILE_LEN: u64 = 0x28;

/// Historical revision of the container framing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    V1,
    V2,
    V3,
    V4,
}

impl FormatVersion {
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            _ => None,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }

    /// Byte offset at which block framing starts.
    pub fn start_offset(self) -> u64 {
        match self {
            Self::V1 => 0x0C,
            Self::V2 | Self::V3 | Self::V4 => 0,
        }
    }

    pub fn framing(self) -> Framing {
        match self {
            Self::V1 | Self::V2 => Framing::V1V2,
            Self::V3 => Framing::V3,
            Self::V4 => Framing::V4,
        }
    }
}

impl FromStr for FormatVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| ParseVersionError(s.into()))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Block framing strategy; V1 and V2 share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Framing {
    V1V2,
    V3,
    V4,
}

/// Logical segments of a texture file, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Header,
    Body,
    Palette,
    PaletteIndex,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Segment::Header => "header",
            Segment::Body => "body",
            Segment::Palette => "palette",
            Segment::PaletteIndex => "palette index",
        })
    }
}

/// One file's decode: a source, its framing state, and the blocks read so far.
///
/// Every buffer a session acquires is owned by it or by its return values,
/// so an error at any stage releases everything.
pub struct DecodeSession<'s> {
    source: &'s mut dyn BlockSource,
    reader: Box<dyn SegmentReader>,
    file_len: u64,
}

impl<'s> DecodeSession<'s> {
    /// Check the minimum length and position `source` at `start_offset`.
    pub fn open(
        source: &'s mut dyn BlockSource,
        version: FormatVersion,
        start_offset: u64,
    ) -> Result<Self, BtgaError> {
        let file_len = source.total_len();
        if file_len < MIN_FILE_LEN {
            return Err(BtgaError::TruncatedInput {
                end: MIN_FILE_LEN,
                file_len,
            });
        }
        source.seek_to(start_offset)?;
        tracing::trace!(%version, start_offset, file_len, "opened texture");
        Ok(Self {
            source,
            reader: segment_reader(version.framing()),
            file_len,
        })
    }

    fn next_block(&mut self) -> Result<Vec<u8>, BtgaError> {
        Ok(self.reader.next_block(&mut *self.source, self.file_len)?.data)
    }

    /// Read the next block and check it against the length the header declares.
    fn read_segment(&mut self, segment: Segment, expected: u32) -> Result<Vec<u8>, BtgaError> {
        let data = self.next_block()?;
        if data.len() as u64 != u64::from(expected) {
            return Err(HeaderError::SegmentLength {
                segment,
                expected,
                actual: data.len(),
            }
            .into());
        }
        tracing::trace!(%segment, len = data.len(), "read segment");
        Ok(data)
    }

    /// Read and validate the header block. Must be the first read.
    pub fn read_header(&mut self) -> Result<BtgaHeader, BtgaError> {
        let block = self.next_block()?;
        Ok(BtgaHeader::parse(&block)?)
    }

    /// Read the remaining segments and decode them into pixels.
    pub fn decode_body(
        &mut self,
        header: &BtgaHeader,
        stop: &dyn Stop,
    ) -> Result<Vec<Color>, BtgaError> {
        let body = self.read_segment(Segment::Body, header.body_length)?;
        stop.check()?;

        let pixels = match header.format {
            TextureFormat::DirectColor => decode::decode_direct(&body, stop)?,
            TextureFormat::Compressed => {
                let palette = self.read_segment(Segment::Palette, header.palette_length)?;
                let index = self.read_segment(Segment::PaletteIndex, header.palette_index_length)?;
                let index = decode::read_u16_words(&index);
                decode::verify_palette_offsets(&index, header.palette_length)?;

                let base = build_base(&decode::read_u16_words(&palette), false);
                tracing::trace!(blocks = index.len(), "decoding compressed blocks");
                decode::decode_compressed(
                    &body,
                    &base,
                    &index,
                    header.width(),
                    header.height(),
                    stop,
                )?
            }
            TextureFormat::None => return Err(HeaderError::NoTexture.into()),
            format => {
                decode::verify_indices(&body, header)?;
                let palette = self.read_segment(Segment::Palette, header.palette_length)?;
                let base = build_base(&decode::read_u16_words(&palette), header.color0_transparent);
                let colors = header.palette_colors();

                let table = match format {
                    TextureFormat::A3I5 => expand_a3i5(&base, colors),
                    TextureFormat::A5I3 => expand_a5i3(&base, colors),
                    _ => base,
                };
                tracing::trace!(?format, entries = table.len(), "decoding indexed body");
                decode::decode_indexed(&body, &table, header.bits_per_pixel(), stop)?
            }
        };

        debug_assert_eq!(pixels.len(), header.pixel_count());
        Ok(pixels)
    }
}

/// Decode one texture into colors.
pub(crate) fn decode_texture(
    source: &mut dyn BlockSource,
    version: FormatVersion,
    start_offset: u64,
    limits: Option<&Limits>,
    layout: PixelLayout,
    stop: &dyn Stop,
) -> Result<(BtgaHeader, Vec<Color>), BtgaError> {
    if let Some(limits) = limits {
        limits.check_input(source.total_len())?;
    }
    let mut session = DecodeSession::open(source, version, start_offset)?;
    let header = session.read_header()?;
    if let Some(limits) = limits {
        limits.check_header(&header, layout)?;
    }
    stop.check()?;
    let pixels = session.decode_body(&header, stop)?;
    Ok((header, pixels))
}

/// Read only as far as the header.
pub(crate) fn probe_header(
    source: &mut dyn BlockSource,
    version: FormatVersion,
    start_offset: u64,
) -> Result<BtgaHeader, BtgaError> {
    DecodeSession::open(source, version, start_offset)?.read_header()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_numbers() {
        for n in 1..=4 {
            let v = FormatVersion::from_number(n).unwrap();
            assert_eq!(v.number(), n);
            assert_eq!(alloc::format!("{v}").parse::<FormatVersion>().unwrap(), v);
        }
        assert_eq!(FormatVersion::from_number(0), None);
        assert_eq!("2".parse::<FormatVersion>().unwrap(), FormatVersion::V2);
        assert!("5".parse::<FormatVersion>().is_err());
        assert!("three".parse::<FormatVersion>().is_err());
    }

    #[test]
    fn only_v1_has_leading_offset() {
        assert_eq!(FormatVersion::V1.start_offset(), 0x0C);
        assert_eq!(FormatVersion::V2.start_offset(), 0);
        assert_eq!(FormatVersion::V1.framing(), FormatVersion::V2.framing());
        assert_eq!(FormatVersion::V4.framing(), Framing::V4);
    }

    #[test]
    fn short_files_rejected_before_parsing() {
        let data = [0u8; 0x27];
        let mut src = crate::source::SliceSource::new(&data);
        assert!(matches!(
            DecodeSession::open(&mut src, FormatVersion::V2, 0),
            Err(BtgaError::TruncatedInput {
                end: 0x28,
                file_len: 0x27
            })
        ));
    }
}
