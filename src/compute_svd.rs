//! A simple trait to wrap SVD Computation.

use crate::svd::Decomposition;
use crate::types::{Result, SvdImageError};
use ndarray::ArrayView2;
use std::sync::Arc;

/// Computes the singular value decomposition of a tall real matrix.
///
/// Implementations receive matrices with at least as many rows as columns
/// and return `U` (m x n), descending non-negative singular values (n) and
/// `V` (n x n) with the sign convention of [`Decomposition::fix_signs`].
pub trait SvdEngine: Send + Sync {
    fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition>;
}

impl<E: SvdEngine + ?Sized> SvdEngine for Arc<E> {
    fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition> {
        (**self).compute_svd(mat)
    }
}

impl<E: SvdEngine + ?Sized> SvdEngine for &E {
    fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition> {
        (**self).compute_svd(mat)
    }
}

/// Reject inputs that no engine can decompose.
pub(crate) fn check_input(mat: &ArrayView2<f64>) -> Result<()> {
    let (m, n) = mat.dim();
    if m == 0 || n == 0 {
        return Err(SvdImageError::dimensions(m, n, "matrix is empty"));
    }
    if m < n {
        return Err(SvdImageError::dimensions(
            m,
            n,
            "matrix must have at least as many rows as columns",
        ));
    }
    if mat.iter().any(|item| !item.is_finite()) {
        return Err(SvdImageError::NumericalFailure(
            "matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(feature = "lapack")]
pub use self::lapack_engine::LapackSvd;

#[cfg(feature = "lapack")]
mod lapack_engine {
    use super::{check_input, SvdEngine};
    use crate::svd::Decomposition;
    use crate::types::{Result, SvdImageError};
    use ndarray::ArrayView2;
    use ndarray_linalg::{JobSvd, SVDDCInto};

    /// SVD engine backed by LAPACK's divide-and-conquer driver (`gesdd`).
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LapackSvd;

    impl SvdEngine for LapackSvd {
        fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition> {
            check_input(&mat)?;

            let (u, s, vt) = mat
                .to_owned()
                .svddc_into(JobSvd::Some)
                .map_err(|e| SvdImageError::NumericalFailure(e.to_string()))?;

            match (u, vt) {
                (Some(u), Some(vt)) => Ok(Decomposition::from_unsorted(
                    u,
                    s,
                    vt.reversed_axes().as_standard_layout().into_owned(),
                )),
                _ => Err(SvdImageError::NumericalFailure(
                    "LAPACK did not return singular vectors".to_string(),
                )),
            }
        }
    }

}
