//! TGA encoder: uncompressed 32-bit BGRA.

use crate::error::BtgaError;
use crate::pixel::PixelLayout;
use alloc::vec::Vec;
use enough::Stop;

/// Size of the fixed TGA file header.
pub const TGA_HEADER_LEN: usize = 18;

/// Image descriptor: 8 alpha bits, top-left origin.
const DESCRIPTOR: u8 = 0b0011_1000;

/// Build the 18-byte header for a `width` x `height` 32-bit image.
pub fn tga_header(width: u16, height: u16) -> [u8; TGA_HEADER_LEN] {
    let mut out = [0u8; TGA_HEADER_LEN];
    out[2] = 2; // uncompressed true-color
    out[12..14].copy_from_slice(&width.to_le_bytes());
    out[14..16].copy_from_slice(&height.to_le_bytes());
    out[16] = 32;
    out[17] = DESCRIPTOR;
    out
}

/// Encode pixels to a complete TGA file in memory.
///
/// Three-channel layouts are written opaque.
pub fn encode_tga(
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BtgaError> {
    let (tga_w, tga_h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(BtgaError::DimensionsTooLarge { width, height }),
    };
    let w = width as usize;
    let h = height as usize;
    let expected = w
        .checked_mul(h)
        .and_then(|wh| wh.checked_mul(layout.bytes_per_pixel()))
        .ok_or(BtgaError::DimensionsTooLarge { width, height })?;
    if pixels.len() < expected {
        return Err(BtgaError::BufferTooSmall {
            needed: expected,
            actual: pixels.len(),
        });
    }

    stop.check()?;

    let mut out = Vec::with_capacity(TGA_HEADER_LEN + w * h * 4);
    out.extend_from_slice(&tga_header(tga_w, tga_h));

    let src_bpp = layout.bytes_per_pixel();
    let row_bytes = w * src_bpp;
    for (row, src) in pixels[..expected].chunks_exact(row_bytes.max(1)).enumerate() {
        if row % 16 == 0 {
            stop.check()?;
        }
        if layout == PixelLayout::Bgra8 {
            out.extend_from_slice(src);
            continue;
        }
        for px in src.chunks_exact(src_bpp) {
            let bgra = match layout {
                PixelLayout::Rgba8 => [px[2], px[1], px[0], px[3]],
                PixelLayout::Rgb8 => [px[2], px[1], px[0], 0xFF],
                PixelLayout::Bgr8 => [px[0], px[1], px[2], 0xFF],
                other => return Err(BtgaError::UnsupportedLayout(other)),
            };
            out.extend_from_slice(&bgra);
        }
    }

    Ok(out)
}

/// Encode and write a TGA file to `writer`.
///
/// Write failures are reported as [`BtgaError::Output`].
#[cfg(feature = "std")]
pub fn write_tga<W: std::io::Write>(
    writer: &mut W,
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
    stop: &dyn Stop,
) -> Result<(), BtgaError> {
    let encoded = encode_tga(pixels, width, height, layout, stop)?;
    writer.write_all(&encoded).map_err(BtgaError::Output)?;
    writer.flush().map_err(BtgaError::Output)
}
