//! # zenbtga
//!
//! Decoder for BTGA texture containers, with an uncompressed TGA writer for
//! the decoded pixels.
//!
//! A BTGA file holds up to four logical segments (header, pixel body,
//! palette, palette-index table), each split across blocks whose framing
//! changed over four format revisions. The revision is not recorded in the
//! file, so callers choose it.
//!
//! ## Supported Formats
//!
//! - **Palette2/4/8**: bit-packed indices into a BGR555 palette
//! - **A3I5 / A5I3**: 8-bit index+alpha texels
//! - **Compressed**: 4x4 blocks of 2-bit codes with per-block palette modes
//! - **DirectColor**: BGRA5551 texels
//!
//! ## Non-Goals
//!
//! - Writing BTGA files
//! - Streaming or partial decode
//!
//! ## Usage
//!
//! ```no_run
//! use zenbtga::{DecodeRequest, FormatVersion, Unstoppable};
//!
//! let data: &[u8] = &[]; // your BTGA bytes
//!
//! // Probe without decoding
//! let info = zenbtga::probe_btga(data, FormatVersion::V2)?;
//! println!("{}x{} {:?}", info.width, info.height, info.format);
//!
//! // Decode to BGRA and re-encode as TGA
//! let decoded = DecodeRequest::new(FormatVersion::V2).decode(data, Unstoppable)?;
//! let tga = decoded.to_tga(Unstoppable)?;
//! assert_eq!(tga.len(), info.tga_len());
//! # Ok::<(), zenbtga::BtgaError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod error;
mod info;
mod limits;
mod pixel;

pub mod btga;
pub mod source;
pub mod tga;

mod decode;

use alloc::vec::Vec;

// Re-exports
pub use btga::header::{BtgaHeader, TextureFormat};
pub use btga::{FormatVersion, Segment};
pub use decode::{DecodeOutput, DecodeRequest};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{BtgaError, FramingError, HeaderError, IndexKind, ParseVersionError};
pub use info::ImageInfo;
pub use limits::Limits;
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::PixelLayout;
pub use source::{BlockSource, SliceSource};
#[cfg(feature = "std")]
pub use source::IoSource;

/// Decode a texture to BGRA pixels.
pub fn decode_btga(
    data: &[u8],
    version: FormatVersion,
    stop: impl Stop,
) -> Result<DecodeOutput, BtgaError> {
    DecodeRequest::new(version).decode(data, stop)
}

/// Read only the header of a texture.
pub fn probe_btga(data: &[u8], version: FormatVersion) -> Result<ImageInfo, BtgaError> {
    DecodeRequest::new(version).probe(data)
}

/// Encode pixels as an uncompressed 32-bit TGA file.
pub fn encode_tga(
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
    stop: impl Stop,
) -> Result<Vec<u8>, BtgaError> {
    tga::encode_tga(pixels, width, height, layout, &stop)
}

/// Decode a texture and encode it as a complete TGA file.
pub fn convert_btga_to_tga(
    data: &[u8],
    version: FormatVersion,
    stop: impl Stop,
) -> Result<Vec<u8>, BtgaError> {
    let decoded = DecodeRequest::new(version).decode_with_stop(&mut SliceSource::new(data), &stop)?;
    tga::encode_tga(
        decoded.pixels(),
        decoded.width,
        decoded.height,
        decoded.layout,
        &stop,
    )
}
