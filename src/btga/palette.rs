//! 16-bit color conversion and palette expansion.

use alloc::vec;
use alloc::vec::Vec;

/// 5-bit channel to 8-bit, matching the hardware's bit replication.
pub const COLOR5: [u8; 32] = [
    0x00, 0x08, 0x10, 0x19, 0x21, 0x29, 0x31, 0x3A,
    0x42, 0x4A, 0x52, 0x5A, 0x63, 0x6B, 0x73, 0x7B,
    0x84, 0x8C, 0x94, 0x9C, 0xA5, 0xAD, 0xB5, 0xBD,
    0xC5, 0xCE, 0xD6, 0xDE, 0xE6, 0xEF, 0xF7, 0xFF,
];

/// 3-bit channel to 8-bit.
pub const COLOR3: [u8; 8] = [0x00, 0x24, 0x49, 0x6D, 0x92, 0xB6, 0xDB, 0xFF];

/// Alpha bit of direct-color texels. Both states decode opaque.
pub const ALPHA1: [u8; 2] = [0xFF, 0xFF];

/// Number of entries in an expanded index+alpha lookup table.
pub const EXPANDED_LEN: usize = 256;

/// A true-color pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color {
        b: 0,
        g: 0,
        r: 0,
        a: 0,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Opaque color from a BGR555 word (red in the low bits).
    pub fn from_bgr555(word: u16) -> Self {
        Self {
            r: COLOR5[usize::from(word & 0x1F)],
            g: COLOR5[usize::from((word >> 5) & 0x1F)],
            b: COLOR5[usize::from((word >> 10) & 0x1F)],
            a: 0xFF,
        }
    }

    /// Color from a BGRA5551 word, alpha in bit 15.
    pub fn from_bgra5551(word: u16) -> Self {
        Self {
            a: ALPHA1[usize::from(word >> 15)],
            ..Self::from_bgr555(word)
        }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Memory order for output: B, G, R, A.
    pub const fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Weighted average of two colors, channel by channel, truncating.
///
/// The result is always opaque.
pub fn blend(c0: Color, c1: Color, w0: u32, w1: u32) -> Color {
    let total = w0 + w1;
    let mix = |x: u8, y: u8| ((u32::from(x) * w0 + u32::from(y) * w1) / total) as u8;
    Color {
        b: mix(c0.b, c1.b),
        g: mix(c0.g, c1.g),
        r: mix(c0.r, c1.r),
        a: 0xFF,
    }
}

/// Convert raw palette words into colors.
///
/// Entry 0 becomes transparent when `color0_transparent` is set; every
/// other entry is opaque.
pub fn build_base(words: &[u16], color0_transparent: bool) -> Vec<Color> {
    let mut palette: Vec<Color> = words.iter().map(|&w| Color::from_bgr555(w)).collect();
    if color0_transparent {
        if let Some(first) = palette.first_mut() {
            first.a = 0;
        }
    }
    palette
}

/// Expand up to 8 colors into the A5I3 table: index in the low 3 bits,
/// 32 alpha levels in the high 5.
///
/// Each level's alpha is masked with the base color's own alpha; base
/// entry 0 counts as opaque.
pub fn expand_a5i3(base: &[Color], num_colors: usize) -> Vec<Color> {
    expand(base, num_colors, 3, |level| COLOR5[level])
}

/// Expand up to 32 colors into the A3I5 table: index in the low 5 bits,
/// 8 alpha levels in the high 3.
///
/// Alpha levels sample the 5-bit ramp at `j*4 + j/2`, which is not the
/// same as [`COLOR3`].
pub fn expand_a3i5(base: &[Color], num_colors: usize) -> Vec<Color> {
    expand(base, num_colors, 5, |level| COLOR5[level * 4 + level / 2])
}

fn expand(
    base: &[Color],
    num_colors: usize,
    index_bits: u32,
    alpha: impl Fn(usize) -> u8,
) -> Vec<Color> {
    let stride = 1usize << index_bits;
    let levels = EXPANDED_LEN / stride;
    let colors = num_colors.min(stride).min(base.len());

    let mut table = vec![Color::TRANSPARENT; EXPANDED_LEN];
    for (i, &color) in base[..colors].iter().enumerate() {
        // color 0 is never transparent in these formats
        let color = if i == 0 { color.with_alpha(0xFF) } else { color };
        for level in 0..levels {
            table[i + level * stride] = color.with_alpha(color.a & alpha(level));
        }
    }
    table
}
