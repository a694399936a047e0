//! Conversion of reconstructed luminance back into displayable pixels.

use crate::raster::{Raster, CHANNELS};
use crate::types::{Matrix, Result, SvdImageError};
use num::ToPrimitive;

/// Round a reconstructed value to a gray level, clipping to `[0, 255]`.
///
/// Clipping is a hard floor and ceiling; overshoot is never rescaled.
pub fn gray_level(value: f64) -> Result<u8> {
    if value.is_nan() {
        return Err(SvdImageError::NumericalFailure(
            "reconstruction produced NaN".to_string(),
        ));
    }
    value
        .clamp(0.0, 255.0)
        .round()
        .to_u8()
        .ok_or_else(|| SvdImageError::NumericalFailure(format!("{} is not a gray level", value)))
}

/// Single-channel gray levels of a reconstructed matrix in row-major order.
pub fn write_gray(mat: &Matrix) -> Result<Vec<u8>> {
    mat.iter().map(|&value| gray_level(value)).collect()
}

/// Write a `height x width` matrix into an opaque RGBA raster.
///
/// R, G and B all carry the clipped gray level; alpha is 255.
pub fn write_raster(mat: &Matrix) -> Result<Raster> {
    let (height, width) = mat.dim();
    let mut data = Vec::with_capacity(height * width * CHANNELS);
    for &value in mat.iter() {
        let level = gray_level(value)?;
        data.extend_from_slice(&[level, level, level, u8::MAX]);
    }
    Raster::new(width, height, data)
}
