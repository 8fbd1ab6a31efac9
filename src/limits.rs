use alloc::format;

use crate::btga::header::BtgaHeader;
use crate::error::BtgaError;
use crate::pixel::PixelLayout;

/// Resource caps for decoding untrusted textures.
///
/// Every field defaults to `None` (no cap). Texture resolution tops out at
/// 1024x1024, so the caps that matter most in batch use are
/// `max_input_bytes` and `max_memory_bytes`.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum width * height.
    pub max_pixels: Option<u64>,
    /// Maximum size of the decoded pixel buffer in the requested layout.
    pub max_memory_bytes: Option<u64>,
    /// Maximum total input length. Bounds every size table and segment the
    /// framing readers allocate, since each is range-checked against it.
    pub max_input_bytes: Option<u64>,
}

fn cap(what: &str, value: u64, limit: Option<u64>) -> Result<(), BtgaError> {
    match limit {
        Some(max) if value > max => {
            let msg = format!("{what} {value} exceeds limit {max}");
            Err(BtgaError::LimitExceeded(msg))
        }
        _ => Ok(()),
    }
}

impl Limits {
    /// Checked before any framing is parsed.
    pub(crate) fn check_input(&self, file_len: u64) -> Result<(), BtgaError> {
        cap("input length", file_len, self.max_input_bytes)
    }

    /// Checked once the header is validated, before the body is read.
    pub(crate) fn check_header(
        &self,
        header: &BtgaHeader,
        layout: PixelLayout,
    ) -> Result<(), BtgaError> {
        let (width, height) = (header.width(), header.height());
        cap("width", u64::from(width), self.max_width.map(u64::from))?;
        cap("height", u64::from(height), self.max_height.map(u64::from))?;
        let pixels = header.pixel_count() as u64;
        cap("pixel count", pixels, self.max_pixels)?;
        cap(
            "output buffer bytes",
            pixels * layout.bytes_per_pixel() as u64,
            self.max_memory_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btga::header::TextureFormat;

    fn header(h_log: u8, v_log: u8) -> BtgaHeader {
        BtgaHeader {
            reserved: [0; 3],
            body_length: 0,
            palette_length: 0,
            palette_index_length: 0,
            format: TextureFormat::DirectColor,
            color0_transparent: false,
            h_log,
            v_log,
        }
    }

    #[test]
    fn unset_limits_accept_everything() {
        let limits = Limits::default();
        let largest = header(7, 7);
        assert!(limits.check_input(u64::MAX).is_ok());
        assert!(limits.check_header(&largest, PixelLayout::Bgra8).is_ok());
    }

    #[test]
    fn header_caps_use_derived_resolution() {
        // 64x16
        let h = header(3, 1);
        let limits = Limits {
            max_width: Some(64),
            max_height: Some(16),
            max_pixels: Some(1024),
            ..Default::default()
        };
        let (wide, tall) = (header(4, 1), header(3, 2));
        assert!(limits.check_header(&h, PixelLayout::Rgba8).is_ok());
        assert!(limits.check_header(&wide, PixelLayout::Rgba8).is_err());
        assert!(limits.check_header(&tall, PixelLayout::Rgba8).is_err());

        let pixels = Limits {
            max_pixels: Some(1023),
            ..Default::default()
        };
        assert!(matches!(
            pixels.check_header(&h, PixelLayout::Rgba8),
            Err(BtgaError::LimitExceeded(_))
        ));
    }

    #[test]
    fn memory_cap_depends_on_layout() {
        let limits = Limits {
            max_memory_bytes: Some(8 * 8 * 3),
            ..Default::default()
        };
        let h = header(0, 0);
        assert!(limits.check_header(&h, PixelLayout::Bgr8).is_ok());
        assert!(limits.check_header(&h, PixelLayout::Bgra8).is_err());
    }

    #[test]
    fn input_cap() {
        let limits = Limits {
            max_input_bytes: Some(0x100),
            ..Default::default()
        };
        assert!(limits.check_input(0x100).is_ok());
        assert!(limits.check_input(0x101).is_err());
    }
}
