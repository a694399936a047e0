//! Projection of an RGBA raster onto its luminance matrix.

use crate::raster::Raster;
use crate::types::{Matrix, Result, SvdImageError};

/// ITU-R BT.601 luma weights for R, G and B.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Weighted luminance of one RGBA pixel. Alpha is ignored.
#[inline]
pub fn luma(px: &[u8]) -> f64 {
    LUMA_WEIGHTS[0] * f64::from(px[0])
        + LUMA_WEIGHTS[1] * f64::from(px[1])
        + LUMA_WEIGHTS[2] * f64::from(px[2])
}

/// Convert a raster into a `height x width` matrix of luminance values.
///
/// Entry `(y, x)` holds `0.299 R + 0.587 G + 0.114 B` of pixel `(x, y)`.
pub fn project_luminance(raster: &Raster) -> Result<Matrix> {
    let (rows, cols) = (raster.height(), raster.width());
    if rows == 0 || cols == 0 {
        return Err(SvdImageError::dimensions(rows, cols, "raster has no pixels"));
    }

    let values: Vec<f64> = raster.pixels().map(luma).collect();
    Matrix::from_shape_vec((rows, cols), values)
        .map_err(|e| SvdImageError::InvalidDimensions(e.to_string()))
}
