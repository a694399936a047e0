//! Error taxonomy and common type aliases.

use ndarray::Array2;
use thiserror::Error;

/// Dense real matrix used for luminance values and all SVD intermediates.
pub type Matrix = Array2<f64>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SvdImageError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Invalid rank {0}: the rank must be at least 1")]
    InvalidRank(i64),
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
}

pub type Result<T> = std::result::Result<T, SvdImageError>;

impl SvdImageError {
    pub(crate) fn dimensions(rows: usize, cols: usize, reason: &str) -> Self {
        SvdImageError::InvalidDimensions(format!("{}x{} {}", rows, cols, reason))
    }
}
