//! The rank-k compression pipeline.
//!
//! A run walks through the stages
//!
//! ```text
//! Idle -> Projecting -> Decomposing -> Reconstructing -> Writing -> Done
//! ```
//!
//! and ends in `Failed` as soon as any stage returns an error. The first error
//! is handed back to the caller unchanged.

use crate::compute_svd::SvdEngine;
use crate::jacobi::JacobiSvd;
use crate::luminance::project_luminance;
use crate::orientation::{self, Orientation};
use crate::raster::Raster;
use crate::raster_writer::write_raster;
use crate::svd::{CompressionStats, Decomposition};
use crate::svd_compression::{effective_rank, reconstruct, requested_rank};
use crate::types::{Matrix, Result};
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Projecting,
    Decomposing,
    Reconstructing,
    Writing,
    Done,
    Failed,
}

/// Output of the projection and decomposition stages for one source image.
///
/// Holding on to it lets a caller render several ranks without decomposing
/// the same image again.
#[derive(Clone, Debug)]
pub struct Prepared {
    /// SVD of the (possibly transposed) luminance matrix
    pub decomposition: Decomposition,
    /// Whether the luminance matrix was transposed before decomposition
    pub orientation: Orientation,
    /// Width of the source raster
    pub width: usize,
    /// Height of the source raster
    pub height: usize,
}

impl Prepared {
    /// Largest meaningful rank, `min(width, height)`.
    pub fn max_rank(&self) -> usize {
        self.decomposition.max_rank()
    }
}

/// A reconstructed image together with the rank it was built from.
#[derive(Clone, Debug)]
pub struct CompressedImage {
    pub raster: Raster,
    pub effective_rank: usize,
    pub stats: CompressionStats,
}

/// Orchestrates projection, decomposition, truncation and writing.
#[derive(Debug)]
pub struct CompressionPipeline<E = JacobiSvd> {
    engine: E,
    stage: Stage,
}

impl Default for CompressionPipeline<JacobiSvd> {
    fn default() -> Self {
        Self::new(JacobiSvd::default())
    }
}

impl<E: SvdEngine> CompressionPipeline<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            stage: Stage::Idle,
        }
    }

    /// Stage reached by the most recent run.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compress `source` keeping `rank` singular components.
    ///
    /// `rank` may be any integer: values above `min(width, height)` select the
    /// full rank, values below 1 fail with `InvalidRank` before the image is
    /// decomposed.
    pub fn run(&mut self, source: &Raster, rank: i64) -> Result<CompressedImage> {
        let (tall, orientation) = self.project(source)?;
        self.guard(requested_rank(rank))?;
        let prepared = self.decompose(source, tall, orientation)?;
        self.render(&prepared, rank)
    }

    /// Project the luminance of `source`, normalize its orientation and decompose it.
    pub fn prepare(&mut self, source: &Raster) -> Result<Prepared> {
        let (tall, orientation) = self.project(source)?;
        self.decompose(source, tall, orientation)
    }

    fn project(&mut self, source: &Raster) -> Result<(Matrix, Orientation)> {
        self.enter(Stage::Projecting);
        let luminance = self.guard(project_luminance(source))?;
        Ok(orientation::normalize(luminance))
    }

    fn decompose(
        &mut self,
        source: &Raster,
        tall: Matrix,
        orientation: Orientation,
    ) -> Result<Prepared> {
        self.enter(Stage::Decomposing);
        let decomposition = self.guard(self.engine.compute_svd(tall.view()))?;
        debug!(
            "Decomposed {}x{} luminance matrix ({:?}), numerical rank {}",
            tall.nrows(),
            tall.ncols(),
            orientation,
            decomposition.rank
        );

        Ok(Prepared {
            decomposition,
            orientation,
            width: source.width(),
            height: source.height(),
        })
    }

    /// Truncate a prepared decomposition to `rank` components and write the result.
    pub fn render(&mut self, prepared: &Prepared, rank: i64) -> Result<CompressedImage> {
        self.enter(Stage::Reconstructing);
        let rank = self.guard(effective_rank(rank, prepared.max_rank()))?;
        let approximation = self.guard(reconstruct(&prepared.decomposition, rank))?;
        let approximation = orientation::restore(approximation, prepared.orientation);

        self.enter(Stage::Writing);
        let raster = self.guard(write_raster(&approximation))?;

        self.enter(Stage::Done);
        Ok(CompressedImage {
            raster,
            effective_rank: rank,
            stats: prepared.decomposition.stats(rank),
        })
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Pipeline stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            debug!("Pipeline failed in stage {:?}: {}", self.stage, err);
            self.stage = Stage::Failed;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::RelDiff;
    use crate::luminance::project_luminance;
    use crate::random_matrix::{random_raster, random_smooth_raster};
    use crate::types::SvdImageError;
    use ndarray::ArrayView2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Jacobi engine that counts how often it is asked to decompose.
    #[derive(Default)]
    struct CountingSvd {
        calls: AtomicUsize,
    }

    impl SvdEngine for CountingSvd {
        fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            JacobiSvd::default().compute_svd(mat)
        }
    }

    fn gray(value: u8) -> [u8; 4] {
        [value, value, value, 255]
    }

    /// Horizontal stripes of alternating dark and light rows.
    fn striped(width: usize, height: usize) -> Raster {
        Raster::from_fn(width, height, |_, y| gray(if y % 2 == 0 { 30 } else { 220 }))
    }

    /// Checkerboard with square cells of `cell` pixels.
    fn checkerboard(width: usize, height: usize, cell: usize) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            gray(if (x / cell + y / cell) % 2 == 0 { 30 } else { 220 })
        })
    }

    /// A light rectangle on a dark background.
    fn block(width: usize, height: usize) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            let inside = (width / 4..3 * width / 4).contains(&x) && (height / 3..height / 2).contains(&y);
            gray(if inside { 200 } else { 15 })
        })
    }

    fn gray_levels(raster: &Raster) -> Matrix {
        Matrix::from_shape_vec(
            (raster.height(), raster.width()),
            raster.pixels().map(|px| f64::from(px[0])).collect(),
        )
        .unwrap()
    }

    macro_rules! full_rank_tests {
        ($($name:ident: $width:expr, $height:expr,)*) => {
            $(
        #[test]
        fn $name() {
            init();
            let mut rng = rand::thread_rng();
            let source = random_raster($width, $height, &mut rng);
            let luminance = project_luminance(&source).unwrap();

            let mut pipeline = CompressionPipeline::default();
            let output = pipeline.run(&source, i64::MAX).unwrap();

            assert_eq!(pipeline.stage(), Stage::Done);
            assert_eq!(output.raster.width(), $width);
            assert_eq!(output.raster.height(), $height);
            assert_eq!(output.effective_rank, std::cmp::min($width, $height));

            let max_error = (&gray_levels(&output.raster) - &luminance)
                .fold(0.0_f64, |acc, item| acc.max(item.abs()));
            assert!(max_error < 1.0);
        }
            )*
        };
    }

    full_rank_tests! {
        test_full_rank_square: 12, 12,
        test_full_rank_wide: 20, 7,
        test_full_rank_tall: 7, 20,
        test_full_rank_single_row: 9, 1,
        test_full_rank_single_column: 1, 9,
        test_full_rank_single_pixel: 1, 1,
    }

    macro_rules! structured_image_tests {
        ($($name:ident: $source:expr, $rank:expr,)*) => {
            $(
        #[test]
        fn $name() {
            init();
            let source = $source;
            let luminance = project_luminance(&source).unwrap();
            let mut pipeline = CompressionPipeline::default();

            let prepared = pipeline.prepare(&source).unwrap();
            assert_eq!(prepared.decomposition.rank, $rank);

            let full = pipeline.render(&prepared, i64::MAX).unwrap();
            let max_error = (&gray_levels(&full.raster) - &luminance)
                .fold(0.0_f64, |acc, item| acc.max(item.abs()));
            assert!(max_error < 1.0);

            let truncated = pipeline.render(&prepared, $rank).unwrap();
            assert_eq!(truncated.raster, source);
            assert!(CompressionPipeline::default().run(&source, 1).is_ok());
        }
            )*
        };
    }

    structured_image_tests! {
        test_stripes_small: striped(8, 8), 1,
        test_stripes_square: striped(32, 32), 1,
        test_stripes_wide: striped(160, 120), 1,
        test_checkerboard_square: checkerboard(16, 16, 4), 2,
        test_checkerboard_wide: checkerboard(160, 120, 8), 2,
        test_block_square: block(150, 150), 2,
        test_block_tall: block(24, 64), 2,
    }

    #[test]
    fn test_non_positive_rank_skips_decomposition() {
        let mut rng = rand::thread_rng();
        let source = random_raster(12, 9, &mut rng);
        let mut pipeline = CompressionPipeline::new(CountingSvd::default());

        assert_eq!(
            pipeline.run(&source, 0).unwrap_err(),
            SvdImageError::InvalidRank(0)
        );
        assert_eq!(pipeline.stage(), Stage::Failed);
        assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 0);

        pipeline.run(&source, 2).unwrap();
        assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_raster_error_wins_over_rank() {
        let source = Raster::new(3, 0, Vec::new()).unwrap();
        assert!(matches!(
            CompressionPipeline::default().run(&source, 0),
            Err(SvdImageError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_constant_image_rank_one() {
        init();
        let source = Raster::filled(2, 2, [100, 100, 100, 255]);

        let mut pipeline = CompressionPipeline::default();
        let prepared = pipeline.prepare(&source).unwrap();
        let output = pipeline.render(&prepared, 1).unwrap();

        assert_eq!(prepared.decomposition.rank, 1);
        assert_eq!(output.effective_rank, 1);
        assert!(output.raster.pixels().all(|px| px == [100, 100, 100, 255]));
    }

    #[test]
    fn test_solid_color_image_has_no_invalid_output() {
        let source = Raster::filled(5, 3, [255, 255, 255, 255]);
        let output = CompressionPipeline::default().run(&source, 2).unwrap();
        assert!(output.raster.pixels().all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_oversized_rank_matches_full_rank() {
        let mut rng = rand::thread_rng();
        let source = random_raster(10, 10, &mut rng);
        let mut pipeline = CompressionPipeline::default();

        let prepared = pipeline.prepare(&source).unwrap();
        let clamped = pipeline.render(&prepared, 9999).unwrap();
        let full = pipeline.render(&prepared, 10).unwrap();

        assert_eq!(clamped.effective_rank, 10);
        assert_eq!(clamped.raster, full.raster);
    }

    #[test]
    fn test_non_positive_rank_fails() {
        let mut rng = rand::thread_rng();
        let source = random_raster(4, 6, &mut rng);

        for &rank in &[0, -1, i64::MIN] {
            let mut pipeline = CompressionPipeline::default();
            let result = pipeline.run(&source, rank);
            assert_eq!(result.unwrap_err(), SvdImageError::InvalidRank(rank));
            assert_eq!(pipeline.stage(), Stage::Failed);
        }
    }

    #[test]
    fn test_empty_raster_fails_in_projection() {
        let source = Raster::new(0, 3, Vec::new()).unwrap();
        let mut pipeline = CompressionPipeline::default();

        assert!(matches!(
            pipeline.run(&source, 1),
            Err(SvdImageError::InvalidDimensions(_))
        ));
        assert_eq!(pipeline.stage(), Stage::Failed);
    }

    #[test]
    fn test_transposed_and_square_reconstructions_agree() {
        let mut rng = rand::thread_rng();
        let wide = random_raster(9, 4, &mut rng);
        let tall = Raster::from_fn(4, 9, |x, y| wide.pixel(y, x));
        let mut pipeline = CompressionPipeline::default();

        let wide_prepared = pipeline.prepare(&wide).unwrap();
        let tall_prepared = pipeline.prepare(&tall).unwrap();
        assert!(wide_prepared.orientation.is_transposed());
        assert!(!tall_prepared.orientation.is_transposed());

        for rank in 1..=4 {
            let from_wide = pipeline.render(&wide_prepared, rank).unwrap().raster;
            let from_tall = pipeline.render(&tall_prepared, rank).unwrap().raster;
            let transposed_back = Raster::from_fn(9, 4, |x, y| from_tall.pixel(y, x));
            assert_eq!(from_wide, transposed_back);
        }
    }

    #[test]
    fn test_error_decreases_with_rank() {
        let mut rng = rand::thread_rng();
        let source = random_smooth_raster(30, 20, 6.0, &mut rng);
        let luminance = project_luminance(&source).unwrap();
        let mut pipeline = CompressionPipeline::default();
        let prepared = pipeline.prepare(&source).unwrap();

        let errors: Vec<f64> = (1..=20)
            .map(|rank| pipeline.render(&prepared, rank).unwrap().stats.relative_error)
            .collect();
        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0]);
        }

        let output = pipeline.render(&prepared, 3).unwrap();
        assert!(gray_levels(&output.raster).rel_diff(&luminance) < 0.2);
    }
}
