//! Collect all traits and other exports here.

pub use crate::compute_svd::SvdEngine;
#[cfg(feature = "lapack")]
pub use crate::compute_svd::LapackSvd;
pub use crate::helpers::*;
pub use crate::jacobi::{JacobiOptions, JacobiSvd};
pub use crate::luminance::project_luminance;
pub use crate::orientation::Orientation;
pub use crate::pipeline::{CompressedImage, CompressionPipeline, Prepared, Stage};
pub use crate::random_matrix::RandomMatrix;
pub use crate::raster::Raster;
pub use crate::raster_writer::write_raster;
pub use crate::session::{
    CompressionSession, Generation, GenerationGate, Outcome, SessionOptions, Submission,
};
pub use crate::svd::{CompressionStats, Decomposition};
pub use crate::svd_compression::{effective_rank, low_rank_factors, reconstruct, CompressSvd};
pub use crate::types::{Matrix, Result, SvdImageError};
