use alloc::vec::Vec;

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use enough::Stop;

use crate::btga::header::BtgaHeader;
use crate::btga::palette::Color;
use crate::btga::{self, FormatVersion};
use crate::error::BtgaError;
use crate::info::ImageInfo;
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::source::{BlockSource, SliceSource};

/// Decode configuration for one texture file.
///
/// ```no_run
/// use zenbtga::{DecodeRequest, FormatVersion, Limits, Unstoppable};
///
/// let data: &[u8] = &[]; // your BTGA bytes
/// let limits = Limits {
///     max_pixels: Some(512 * 512),
///     ..Default::default()
/// };
/// let decoded = DecodeRequest::new(FormatVersion::V3)
///     .with_limits(&limits)
///     .decode(data, Unstoppable)?;
/// println!("{}x{}", decoded.width, decoded.height);
/// # Ok::<(), zenbtga::BtgaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    version: FormatVersion,
    start_offset: Option<u64>,
    limits: Option<&'a Limits>,
    layout: PixelLayout,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            start_offset: None,
            limits: None,
            layout: PixelLayout::Bgra8,
        }
    }

    /// Start framing at `offset` instead of the version's default.
    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.start_offset = Some(offset);
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Output pixel layout. Defaults to [`PixelLayout::Bgra8`].
    pub fn with_layout(mut self, layout: PixelLayout) -> Self {
        self.layout = layout;
        self
    }

    fn start_offset(&self) -> u64 {
        self.start_offset.unwrap_or(self.version.start_offset())
    }

    /// Decode a texture held in memory.
    pub fn decode(&self, data: &[u8], stop: impl Stop) -> Result<DecodeOutput, BtgaError> {
        self.decode_source(&mut SliceSource::new(data), stop)
    }

    /// Decode a texture from any [`BlockSource`].
    pub fn decode_source(
        &self,
        source: &mut dyn BlockSource,
        stop: impl Stop,
    ) -> Result<DecodeOutput, BtgaError> {
        self.decode_with_stop(source, &stop)
    }

    pub(crate) fn decode_with_stop(
        &self,
        source: &mut dyn BlockSource,
        stop: &dyn Stop,
    ) -> Result<DecodeOutput, BtgaError> {
        let (header, colors) = btga::decode_texture(
            source,
            self.version,
            self.start_offset(),
            self.limits,
            self.layout,
            stop,
        )?;
        Ok(DecodeOutput::from_colors(&colors, header, self.layout))
    }

    /// Read and validate only the header.
    pub fn probe(&self, data: &[u8]) -> Result<ImageInfo, BtgaError> {
        self.probe_source(&mut SliceSource::new(data))
    }

    pub fn probe_source(&self, source: &mut dyn BlockSource) -> Result<ImageInfo, BtgaError> {
        let header = btga::probe_header(source, self.version, self.start_offset())?;
        Ok(ImageInfo::from(&header))
    }
}

/// Decoded texture pixels.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    /// The validated header the pixels were decoded from.
    pub header: BtgaHeader,
}

impl DecodeOutput {
    pub(crate) fn from_colors(colors: &[Color], header: BtgaHeader, layout: PixelLayout) -> Self {
        let mut pixels = Vec::with_capacity(colors.len() * layout.bytes_per_pixel());
        for c in colors {
            match layout {
                PixelLayout::Bgra8 => pixels.extend_from_slice(&c.to_bgra()),
                PixelLayout::Rgba8 => pixels.extend_from_slice(&c.to_rgba()),
                PixelLayout::Rgb8 => pixels.extend_from_slice(&[c.r, c.g, c.b]),
                PixelLayout::Bgr8 => pixels.extend_from_slice(&[c.b, c.g, c.r]),
            }
        }
        Self {
            pixels,
            width: header.width(),
            height: header.height(),
            layout,
            header,
        }
    }

    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Encode as an uncompressed 32-bit TGA file.
    pub fn to_tga(&self, stop: impl Stop) -> Result<Vec<u8>, BtgaError> {
        crate::tga::encode_tga(&self.pixels, self.width, self.height, self.layout, &stop)
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`BtgaError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], BtgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.layout != P::layout() {
            return Err(BtgaError::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, BtgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, BtgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}
