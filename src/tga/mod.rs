//! Uncompressed 32-bit true-color TGA output.
//!
//! Decoded textures are written as TGA image type 2 with a top-left origin
//! and 8 bits of alpha, pixels in B, G, R, A order.

mod encode;

pub use encode::{TGA_HEADER_LEN, encode_tga, tga_header};

#[cfg(feature = "std")]
pub use encode::write_tga;
