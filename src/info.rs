use crate::btga::header::{BtgaHeader, TextureFormat};
use crate::tga::TGA_HEADER_LEN;

/// Header-level facts about a texture, available without decoding the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub color0_transparent: bool,
    pub body_length: u32,
    pub palette_length: u32,
    pub palette_index_length: u32,
}

impl ImageInfo {
    /// Size in bytes of the TGA file this texture converts to.
    pub fn tga_len(&self) -> usize {
        TGA_HEADER_LEN + self.width as usize * self.height as usize * 4
    }
}

impl From<&BtgaHeader> for ImageInfo {
    fn from(header: &BtgaHeader) -> Self {
        Self {
            width: header.width(),
            height: header.height(),
            format: header.format,
            color0_transparent: header.color0_transparent,
            body_length: header.body_length,
            palette_length: header.palette_length,
            palette_index_length: header.palette_index_length,
        }
    }
}
