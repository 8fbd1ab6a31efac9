//! The fixed 28-byte texture header block.

use crate::error::HeaderError;

use super::palette::{COLOR3, COLOR5};

/// Size of the header block payload.
pub const HEADER_LEN: usize = 0x1C;

/// Texture encodings a header can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextureFormat {
    None = 0,
    /// 3-bit alpha, 5-bit palette index.
    A3I5 = 1,
    Palette2 = 2,
    Palette4 = 3,
    Palette8 = 4,
    /// 4x4 block compression with a palette-index table.
    Compressed = 5,
    /// 5-bit alpha, 3-bit palette index.
    A5I3 = 6,
    /// 16-bit BGRA5551 texels, no palette.
    DirectColor = 7,
}

impl TextureFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::A3I5,
            2 => Self::Palette2,
            3 => Self::Palette4,
            4 => Self::Palette8,
            5 => Self::Compressed,
            6 => Self::A5I3,
            7 => Self::DirectColor,
            _ => return None,
        })
    }

    /// Bits of body data per pixel.
    pub fn bits_per_pixel(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Palette2 | Self::Compressed => 2,
            Self::Palette4 => 4,
            Self::A3I5 | Self::Palette8 | Self::A5I3 => 8,
            Self::DirectColor => 16,
        }
    }

    /// Bits of each body byte that select a palette color.
    pub fn index_bits(self) -> Option<u8> {
        match self {
            Self::A3I5 => Some(5),
            Self::A5I3 => Some(3),
            Self::Palette2 => Some(2),
            Self::Palette4 => Some(4),
            Self::Palette8 => Some(8),
            Self::None | Self::Compressed | Self::DirectColor => None,
        }
    }

    /// Channel table for the alpha bits of index+alpha formats.
    pub fn alpha_table(self) -> Option<&'static [u8]> {
        match self {
            Self::A3I5 => Some(&COLOR3),
            Self::A5I3 => Some(&COLOR5),
            _ => None,
        }
    }
}

/// A validated texture header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BtgaHeader {
    /// Fields the format overwrites at load time; carried but never used.
    pub reserved: [u32; 3],
    pub body_length: u32,
    pub palette_length: u32,
    pub palette_index_length: u32,
    pub format: TextureFormat,
    pub color0_transparent: bool,
    /// Width exponent; only the low 3 bits are meaningful.
    pub h_log: u8,
    /// Height exponent; only the low 3 bits are meaningful.
    pub v_log: u8,
}

fn u32_at(block: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        block[offset],
        block[offset + 1],
        block[offset + 2],
        block[offset + 3],
    ])
}

impl BtgaHeader {
    /// Parse and validate a header block.
    pub fn parse(block: &[u8]) -> Result<Self, HeaderError> {
        if block.len() != HEADER_LEN {
            return Err(HeaderError::WrongSize(block.len()));
        }

        let body_length = u32_at(block, 0x04);
        let palette_length = u32_at(block, 0x0C);
        let palette_index_length = u32_at(block, 0x14);
        let format_byte = block[0x18];

        if palette_length == 0 && format_byte != TextureFormat::DirectColor as u8 {
            return Err(HeaderError::MissingPalette);
        }
        if palette_index_length == 0 && format_byte == TextureFormat::Compressed as u8 {
            return Err(HeaderError::MissingPaletteIndex);
        }

        let format = match TextureFormat::from_u8(format_byte) {
            Some(TextureFormat::None) => return Err(HeaderError::NoTexture),
            Some(format) => format,
            None => return Err(HeaderError::UnknownFormat(format_byte)),
        };

        if format == TextureFormat::Compressed && palette_index_length != body_length / 2 {
            return Err(HeaderError::PaletteIndexLength {
                expected: body_length / 2,
                actual: palette_index_length,
            });
        }

        let header = Self {
            reserved: [u32_at(block, 0x00), u32_at(block, 0x08), u32_at(block, 0x10)],
            body_length,
            palette_length,
            palette_index_length,
            format,
            color0_transparent: block[0x19] != 0,
            h_log: block[0x1A],
            v_log: block[0x1B],
        };

        let expected_bits = header.pixel_count() as u64 * u64::from(format.bits_per_pixel());
        let actual_bits = u64::from(body_length) * 8;
        if expected_bits != actual_bits {
            return Err(HeaderError::BodyLength {
                expected_bits,
                actual_bits,
            });
        }

        tracing::debug!(
            format = ?header.format,
            width = header.width(),
            height = header.height(),
            body_length,
            palette_length,
            palette_index_length,
            "validated texture header"
        );
        Ok(header)
    }

    pub fn width(&self) -> u32 {
        8 << (self.h_log & 7)
    }

    pub fn height(&self) -> u32 {
        8 << (self.v_log & 7)
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.format.bits_per_pixel()
    }

    pub fn index_bits(&self) -> Option<u8> {
        self.format.index_bits()
    }

    pub fn alpha_table(&self) -> Option<&'static [u8]> {
        self.format.alpha_table()
    }

    /// Number of 16-bit entries in the palette segment.
    pub fn palette_colors(&self) -> usize {
        self.palette_length as usize / 2
    }

    /// Serialize back to the 28-byte block layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let fields = [
            self.reserved[0],
            self.body_length,
            self.reserved[1],
            self.palette_length,
            self.reserved[2],
            self.palette_index_length,
        ];
        for (chunk, value) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out[0x18] = self.format as u8;
        out[0x19] = u8::from(self.color0_transparent);
        out[0x1A] = self.h_log;
        out[0x1B] = self.v_log;
        out
    }
}
