//! Generation of random matrices and rasters for tests and benchmarks.

use crate::compute_svd::SvdEngine;
use crate::jacobi::JacobiSvd;
use crate::raster::Raster;
use crate::types::Matrix;
use ndarray::Array;
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

pub trait RandomMatrix {
    /// Generate a random Gaussian matrix.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Matrix;

    /// Generate a random matrix with orthonormal rows or columns.
    ///
    /// This function creates a normally distributed (m, n) random matrix,
    /// orthogonalizes it with the Jacobi SVD and returns the left singular
    /// vectors. If n > m the result is transposed so that its rows are
    /// orthonormal.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_orthogonal_matrix<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Matrix {
        let (m, n) = if dimension.1 > dimension.0 {
            (dimension.1, dimension.0)
        } else {
            dimension
        };

        let mat = Self::random_gaussian((m, n), rng);
        let svd = JacobiSvd::default()
            .compute_svd(mat.view())
            .expect("Jacobi SVD of a Gaussian matrix failed.");

        if dimension.1 > dimension.0 {
            svd.u.reversed_axes()
        } else {
            svd.u
        }
    }

    /// Generate a random approximate low-rank matrix.
    ///
    /// This function generates a random approximate low-rank matrix
    /// with singular values logarithmically distributed between
    /// `sigma_max` and `sigma_min`.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `sigma_max`: Maximum singular value.
    /// * `sigma_min`: Minimum singular value.
    /// * `rng`: The random number generator to use.
    fn random_approximate_low_rank_matrix<R: Rng>(
        dimension: (usize, usize),
        sigma_max: f64,
        sigma_min: f64,
        rng: &mut R,
    ) -> Matrix {
        assert!(
            sigma_min < sigma_max,
            "`sigma_min` must be smaller than `sigma_max`"
        );
        assert!(sigma_min > 0.0, "`sigma_min` must be positive.");

        let min_dim = std::cmp::min(dimension.0, dimension.1);

        let u = Self::random_orthogonal_matrix((dimension.0, min_dim), rng);
        let vt = Self::random_orthogonal_matrix((min_dim, dimension.1), rng);
        let singvals = Array::geomspace(sigma_min, sigma_max, min_dim).unwrap();
        let sigma = Matrix::from_diag(&singvals);
        u.dot(&sigma.dot(&vt))
    }
}

impl RandomMatrix for f64 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Matrix {
        let mut mat = Matrix::zeros(dimension);
        mat.map_inplace(|item| *item = StandardNormal.sample(rng));
        mat
    }
}

/// Generate an opaque RGBA raster with uniformly distributed color channels.
pub fn random_raster<R: Rng>(width: usize, height: usize, rng: &mut R) -> Raster {
    Raster::from_fn(width, height, |_, _| [rng.gen(), rng.gen(), rng.gen(), 255])
}

/// Generate an opaque gray raster whose luminance is a smooth gradient plus Gaussian noise.
///
/// Such images have a quickly decaying singular spectrum, like photographs.
pub fn random_smooth_raster<R: Rng>(width: usize, height: usize, noise: f64, rng: &mut R) -> Raster {
    let normal = Normal::new(0.0, noise.max(f64::MIN_POSITIVE)).unwrap();
    Raster::from_fn(width, height, |x, y| {
        let base = 255.0 * (x + y) as f64 / (width + height).max(1) as f64;
        let value = (base + normal.sample(rng)).round().clamp(0.0, 255.0) as u8;
        [value, value, value, 255]
    })
}
