//! Rank-k SVD compression of images.
//!
//! An RGBA raster is projected onto its luminance matrix, the matrix is
//! decomposed with a singular value decomposition, truncated to its `k`
//! largest singular components and written back as an opaque gray raster.
//!
//! ```
//! use svd_image::prelude::*;
//!
//! let source = Raster::from_fn(32, 24, |x, y| {
//!     let v = ((x * y) % 256) as u8;
//!     [v, v / 2, 255 - v, 255]
//! });
//!
//! let mut pipeline = CompressionPipeline::default();
//! let output = pipeline.run(&source, 4).unwrap();
//!
//! assert_eq!(output.raster.width(), 32);
//! assert_eq!(output.effective_rank, 4);
//! ```

pub mod compute_svd;
pub mod helpers;
pub mod jacobi;
pub mod luminance;
pub mod orientation;
pub mod pipeline;
pub mod prelude;
pub mod random_matrix;
pub mod raster;
pub mod raster_writer;
pub mod session;
pub mod svd;
pub mod svd_compression;
pub mod types;

pub use compute_svd::SvdEngine;
pub use jacobi::{JacobiOptions, JacobiSvd};
pub use pipeline::{CompressedImage, CompressionPipeline, Prepared, Stage};
pub use raster::Raster;
pub use session::{CompressionSession, GenerationGate, Outcome, SessionOptions};
pub use svd::{CompressionStats, Decomposition};
pub use types::{Matrix, Result, SvdImageError};
