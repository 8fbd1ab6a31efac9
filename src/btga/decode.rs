//! Body decoding for each texture format.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use super::header::BtgaHeader;
use super::palette::{Color, blend};
use crate::error::{BtgaError, IndexKind};

/// Low bits of a palette-index entry: offset into the palette in pairs.
const OFFSET_MASK: u16 = 0x3FFF;

/// Pixels packed into each body byte at `bpp` bits per pixel.
fn pixels_per_byte(bpp: u8) -> usize {
    4 >> (bpp >> 2)
}

/// Decode little-endian 16-bit words.
pub fn read_u16_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Decode BGRA5551 texels.
pub fn decode_direct(body: &[u8], stop: &dyn Stop) -> Result<Vec<Color>, BtgaError> {
    let mut out = Vec::with_capacity(body.len() / 2);
    for (i, texel) in body.chunks_exact(2).enumerate() {
        if i % 4096 == 0 {
            stop.check()?;
        }
        let value = u16::from_le_bytes([texel[0], texel[1]]);
        out.push(Color::from_bgra5551(value));
    }
    Ok(out)
}

/// Check every color index in a paletted body against the palette size.
///
/// For A3I5 and A5I3 only the index bits are checked; the alpha bits
/// select a level in the expanded table and are always valid.
pub fn verify_indices(body: &[u8], header: &BtgaHeader) -> Result<(), BtgaError> {
    let Some(index_bits) = header.index_bits() else {
        return Ok(());
    };
    let bpp = header.bits_per_pixel();
    let mask = ((1u16 << index_bits) - 1) as u8;
    let colors = header.palette_colors();

    for &byte in body {
        for j in 0..pixels_per_byte(bpp) {
            let index = (byte >> (j as u8 * bpp)) & mask;
            if usize::from(index) >= colors {
                return Err(BtgaError::IndexOutOfRange {
                    kind: IndexKind::Color,
                    index: u32::from(index),
                    limit: colors as u32,
                });
            }
        }
    }
    Ok(())
}

/// Look up packed indices in `palette`, low bits first.
///
/// At 8 bits per pixel the whole byte is the index, which is how the
/// 256-entry A3I5 and A5I3 tables are addressed.
pub fn decode_indexed(
    body: &[u8],
    palette: &[Color],
    bpp: u8,
    stop: &dyn Stop,
) -> Result<Vec<Color>, BtgaError> {
    let per_byte = pixels_per_byte(bpp);
    let mask = ((1u16 << bpp) - 1) as u8;
    let mut out = Vec::with_capacity(body.len() * per_byte);

    for (i, &byte) in body.iter().enumerate() {
        if i % 4096 == 0 {
            stop.check()?;
        }
        for j in 0..per_byte {
            let index = (byte >> (j as u8 * bpp)) & mask;
            let color = palette
                .get(usize::from(index))
                .ok_or(BtgaError::IndexOutOfRange {
                    kind: IndexKind::Color,
                    index: u32::from(index),
                    limit: palette.len() as u32,
                })?;
            out.push(*color);
        }
    }
    Ok(out)
}

/// Check every palette-index entry of a compressed texture.
pub fn verify_palette_offsets(index_table: &[u16], palette_length: u32) -> Result<(), BtgaError> {
    for &entry in index_table {
        let offset = entry & OFFSET_MASK;
        if u32::from(offset) * 4 > palette_length {
            return Err(BtgaError::IndexOutOfRange {
                kind: IndexKind::PaletteOffset,
                index: u32::from(offset),
                limit: palette_length / 4,
            });
        }
    }
    Ok(())
}

/// The four colors a compressed block's 2-bit codes select from.
fn block_colors(palette: &[Color], entry: u16) -> Result<[Color; 4], BtgaError> {
    let base = usize::from(entry & OFFSET_MASK) * 2;
    let color = |k: usize| {
        palette
            .get(base + k)
            .copied()
            .ok_or(BtgaError::IndexOutOfRange {
                kind: IndexKind::PaletteOffset,
                index: u32::from(entry & OFFSET_MASK),
                limit: (palette.len() / 2) as u32,
            })
    };
    let c0 = color(0)?;
    let c1 = color(1)?;

    Ok(match entry >> 14 {
        0 => [c0, c1, color(2)?, Color::TRANSPARENT],
        1 => [c0, c1, blend(c0, c1, 1, 1), Color::TRANSPARENT],
        2 => [c0, c1, color(2)?, color(3)?],
        _ => [c0, c1, blend(c0, c1, 5, 3), blend(c0, c1, 3, 5)],
    })
}

/// Decode 4x4 compressed blocks.
///
/// `body` holds one 32-bit word per block in row-major block order;
/// `index_table` holds the matching palette-index entry for each block.
pub fn decode_compressed(
    body: &[u8],
    palette: &[Color],
    index_table: &[u16],
    width: u32,
    height: u32,
    stop: &dyn Stop,
) -> Result<Vec<Color>, BtgaError> {
    let width = width as usize;
    let height = height as usize;
    let block_cols = width / 4;
    let mut out = vec![Color::TRANSPARENT; width * height];

    for (i, word) in body.chunks_exact(4).enumerate() {
        if i % block_cols.max(1) == 0 {
            stop.check()?;
        }
        let entry = *index_table.get(i).ok_or(BtgaError::IndexOutOfRange {
            kind: IndexKind::IndexTable,
            index: i as u32,
            limit: index_table.len() as u32,
        })?;
        let colors = block_colors(palette, entry)?;

        let mut codes = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        let block_row = i / block_cols;
        let block_col = i % block_cols;
        for j in 0..4 {
            let row = block_row * 4 + j;
            for k in 0..4 {
                let col = block_col * 4 + k;
                if let Some(px) = out.get_mut(row * width + col) {
                    *px = colors[(codes & 0x03) as usize];
                }
                codes >>= 2;
            }
        }
    }
    Ok(out)
}
