//! In-memory RGBA raster exchanged with the host decoder and encoder.

use crate::types::{Result, SvdImageError};

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// An 8-bit RGBA raster stored row-major with interleaved channels.
///
/// The pixel buffer always holds exactly `width * height` pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an interleaved RGBA buffer.
    ///
    /// Fails with `InvalidDimensions` if the buffer length does not match
    /// `width * height * 4`. Zero-sized rasters are accepted here and rejected
    /// by the luminance projection.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)
            .ok_or_else(|| SvdImageError::dimensions(height, width, "raster is too large"))?;
        if data.len() != expected {
            return Err(SvdImageError::InvalidDimensions(format!(
                "{}x{} raster needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster from a sequence of RGBA pixels in row-major order.
    pub fn from_pixels(width: usize, height: usize, pixels: &[[u8; CHANNELS]]) -> Result<Self> {
        let data = pixels.iter().flat_map(|px| px.iter().copied()).collect();
        Self::new(width, height, data)
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    ///
    /// # Panics
    ///
    /// Panics if `width * height * 4` overflows `usize`.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> [u8; CHANNELS],
    {
        let len = match byte_len(width, height) {
            Some(len) => len,
            None => panic!("{}x{} raster is too large", width, height),
        };
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// A raster where every pixel carries the same RGBA value.
    pub fn filled(width: usize, height: usize, pixel: [u8; CHANNELS]) -> Self {
        Self::from_fn(width, height, |_, _| pixel)
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RGBA value of the pixel at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; CHANNELS] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let start = (y * self.width + x) * CHANNELS;
        let mut px = [0u8; CHANNELS];
        px.copy_from_slice(&self.data[start..start + CHANNELS]);
        px
    }

    /// Iterate over pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(CHANNELS)
    }

    /// Borrow the interleaved RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the raster and return its interleaved RGBA bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Buffer length of a `width x height` raster, `None` on overflow.
fn byte_len(width: usize, height: usize) -> Option<usize> {
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
}
