//! Raster encoding and decoding.
//!
//! The service only talks to [`RasterCodec`]; [`BmpCodec`] is the adapter
//! backing the on-disk format.

use image::{imageops, ImageFormat, ImageReader, Limits, Rgb, RgbImage};
use std::io::Cursor;

use crate::boundary::Rect;
use crate::error::{Error, Result};

/// In-memory pixel buffer
pub type Raster = RgbImage;

/// Colour of a freshly created canvas
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Largest side length the BMP decoder accepts
pub const BMP_MAX_SIDE: u32 = 0xFFFF;

/// Default cap on canvas area, in pixels (16384 x 16384)
pub const DEFAULT_MAX_PIXELS: u64 = 16_384 * 16_384;

// Decoded payloads may carry an alpha channel before conversion.
const MAX_BYTES_PER_PIXEL: u64 = 4;
const DECODE_HEADROOM_BYTES: u64 = 1 << 20;

/// Largest raster a codec can encode and later decode again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLimits {
    /// Longest allowed width or height
    pub max_side: u32,
    /// Largest allowed `width * height`
    pub max_pixels: u64,
}

impl RasterLimits {
    /// Fail with a validation error if `width` x `height` is out of range
    pub fn check(&self, width: u32, height: u32) -> Result<()> {
        if width > self.max_side || height > self.max_side {
            return Err(Error::validation(format!(
                "{}x{} exceeds the maximum side of {}",
                width, height, self.max_side
            )));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(Error::validation(format!(
                "{}x{} exceeds the maximum of {} pixels",
                width, height, self.max_pixels
            )));
        }
        Ok(())
    }

    /// Decoder limits that admit every raster allowed by `self`
    fn decoder_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_side);
        limits.max_image_height = Some(self.max_side);
        limits.max_alloc = Some(
            self.max_pixels
                .saturating_mul(MAX_BYTES_PER_PIXEL)
                .saturating_add(DECODE_HEADROOM_BYTES),
        );
        limits
    }
}

/// Encode/decode contract for a raster file format
pub trait RasterCodec: Send + Sync {
    /// File extension used for stored canvases, without the dot
    fn extension(&self) -> &'static str;

    /// MIME type of encoded output
    fn content_type(&self) -> &'static str;

    /// Size range this codec round-trips
    fn limits(&self) -> RasterLimits;

    /// Width and height read from the header, without decoding pixels
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)>;

    /// Encode a raster
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>>;

    /// Decode a whole raster. Anything larger than [`RasterCodec::limits`]
    /// is rejected.
    fn decode(&self, bytes: &[u8]) -> Result<Raster>;

    /// Decode only the pixels inside `rect`. `rect` must lie within the
    /// encoded image.
    fn decode_region(&self, bytes: &[u8], rect: Rect) -> Result<Raster> {
        let full = self.decode(bytes)?;
        crop(&full, rect)
    }
}

/// Copy `rect` out of `raster`
pub fn crop(raster: &Raster, rect: Rect) -> Result<Raster> {
    let fits_x = rect.x.checked_add(rect.width).is_some_and(|r| r <= raster.width());
    let fits_y = rect.y.checked_add(rect.height).is_some_and(|b| b <= raster.height());
    if !fits_x || !fits_y {
        return Err(Error::codec(format!(
            "region {}x{} at ({}, {}) exceeds raster {}x{}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            raster.width(),
            raster.height()
        )));
    }
    Ok(imageops::crop_imm(raster, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Build a raster filled with `color`
#[must_use]
pub fn filled(width: u32, height: u32, color: Rgb<u8>) -> Raster {
    RgbImage::from_pixel(width, height, color)
}

/// 24-bit BMP codec
#[derive(Debug, Clone, Copy)]
pub struct BmpCodec {
    limits: RasterLimits,
}

impl BmpCodec {
    /// Create the codec with [`DEFAULT_MAX_PIXELS`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_pixels(DEFAULT_MAX_PIXELS)
    }

    /// Create the codec accepting canvases of up to `max_pixels`
    #[must_use]
    pub fn with_max_pixels(max_pixels: u64) -> Self {
        Self {
            limits: RasterLimits {
                max_side: BMP_MAX_SIDE,
                max_pixels,
            },
        }
    }
}

impl Default for BmpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCodec for BmpCodec {
    fn extension(&self) -> &'static str {
        "bmp"
    }

    fn content_type(&self) -> &'static str {
        "image/bmp"
    }

    fn limits(&self) -> RasterLimits {
        self.limits
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)> {
        let reader = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Bmp);
        reader.into_dimensions().map_err(codec_error)
    }

    fn encode(&self, raster: &Raster) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .map_err(codec_error)?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Raster> {
        let mut reader = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Bmp);
        reader.limits(self.limits.decoder_limits());
        let image = reader.decode().map_err(codec_error)?;
        Ok(image.into_rgb8())
    }
}

// Input is always in memory, so even reader errors mean malformed data.
fn codec_error(err: image::ImageError) -> Error {
    Error::codec(err.to_string())
}
