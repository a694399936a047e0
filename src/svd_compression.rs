//! Definition of SVD based compression routines

use crate::svd::Decomposition;
use crate::types::{Matrix, Result, SvdImageError};
use ndarray::{s, Axis, Zip};
use std::convert::TryFrom;

/// Clamp a caller supplied rank to `[1, max_rank]`.
///
/// Non-positive requests are rejected with `InvalidRank`; requests above the
/// maximal rank of the matrix silently select the full rank.
pub fn effective_rank(requested: i64, max_rank: usize) -> Result<usize> {
    Ok(requested_rank(requested)?.min(max_rank))
}

/// Reject non-positive rank requests before any matrix is known.
pub fn requested_rank(requested: i64) -> Result<usize> {
    if requested <= 0 {
        return Err(SvdImageError::InvalidRank(requested));
    }
    Ok(usize::try_from(requested).unwrap_or(usize::MAX))
}

pub trait CompressSvd {
    /// Truncate to the first `rank` components, clamping to the available rank.
    fn compress(self, rank: usize) -> Result<Decomposition>;
}

impl CompressSvd for Decomposition {
    fn compress(self, rank: usize) -> Result<Decomposition> {
        let max_rank = checked_rank(&self, rank)?;
        let rank = self.rank.min(max_rank);
        let (u, s, v) = (self.u, self.s, self.v);

        let u = u.slice_move(s![.., 0..max_rank]);
        let s = s.slice_move(s![0..max_rank]);
        let v = v.slice_move(s![.., 0..max_rank]);

        Ok(Decomposition { u, s, v, rank })
    }
}

/// Split a rank-k truncation into factors `(U_k, S_k V_k^T)`.
///
/// The product of the two factors is the rank-k approximation; together they
/// store `k (m + n)` values instead of `m n`.
pub fn low_rank_factors(svd: &Decomposition, rank: usize) -> Result<(Matrix, Matrix)> {
    let max_rank = checked_rank(svd, rank)?;

    let u = svd.u.slice(s![.., 0..max_rank]).to_owned();
    let mut vt = svd.v.slice(s![.., 0..max_rank]).t().to_owned();
    Zip::from(vt.axis_iter_mut(Axis(0)))
        .and(svd.s.slice(s![0..max_rank]))
        .for_each(|mut row, &sigma| row.map_inplace(|item| *item *= sigma));

    Ok((u, vt))
}

/// Rank-k approximation `U_k diag(s_k) V_k^T` of the decomposed matrix.
///
/// `rank` must be at least 1 and is clamped to `min(m, n)`.
pub fn reconstruct(svd: &Decomposition, rank: usize) -> Result<Matrix> {
    let (u, vt) = low_rank_factors(svd, rank)?;
    Ok(u.dot(&vt))
}

fn checked_rank(svd: &Decomposition, rank: usize) -> Result<usize> {
    if rank == 0 {
        return Err(SvdImageError::InvalidRank(0));
    }
    Ok(rank.min(svd.max_rank()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_svd::SvdEngine;
    use crate::helpers::{frobenius_norm, RelDiff};
    use crate::jacobi::JacobiSvd;
    use crate::random_matrix::RandomMatrix;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_effective_rank_policy() {
        assert_eq!(effective_rank(1, 10), Ok(1));
        assert_eq!(effective_rank(7, 10), Ok(7));
        assert_eq!(effective_rank(9999, 10), Ok(10));
        assert_eq!(effective_rank(i64::MAX, 3), Ok(3));
        assert_eq!(effective_rank(0, 10), Err(SvdImageError::InvalidRank(0)));
        assert_eq!(effective_rank(-4, 10), Err(SvdImageError::InvalidRank(-4)));
        assert_eq!(requested_rank(9999), Ok(9999));
        assert_eq!(requested_rank(i64::MIN), Err(SvdImageError::InvalidRank(i64::MIN)));
    }

    #[test]
    fn test_svd_compression_by_rank() {
        let m = 50;
        let n = 30;
        let rank: usize = 10;

        let sigma_max = 1.0;
        let sigma_min = 1E-10;
        let mut rng = rand::thread_rng();
        let mat = f64::random_approximate_low_rank_matrix((m, n), sigma_max, sigma_min, &mut rng);

        let svd = JacobiSvd::default().compute_svd(mat.view()).unwrap();
        let (a, bt) = low_rank_factors(&svd, rank).unwrap();

        assert!(a.len_of(Axis(0)) == m);
        assert!(a.len_of(Axis(1)) == rank);
        assert!(bt.len_of(Axis(0)) == rank);
        assert!(bt.len_of(Axis(1)) == n);
        assert!(a.dot(&bt).rel_diff(&mat) < 1E-3);
    }

    #[test]
    fn test_full_rank_reconstruction_is_exact() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((20, 15), &mut rng) * 255.0;

        let svd = JacobiSvd::default().compute_svd(mat.view()).unwrap();
        let approximation = reconstruct(&svd, 15).unwrap();

        assert_eq!(approximation.dim(), (20, 15));
        let max_error = (&approximation - &mat).fold(0.0_f64, |acc, item| acc.max(item.abs()));
        assert!(max_error < 1E-9);
    }

    #[test]
    fn test_error_is_monotone_in_rank() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((24, 16), &mut rng);
        let svd = JacobiSvd::default().compute_svd(mat.view()).unwrap();

        let errors: Vec<f64> = (1..=16)
            .map(|k| frobenius_norm(&(&mat - &reconstruct(&svd, k).unwrap())))
            .collect();

        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0] + 1E-10);
        }
        // Eckart-Young: the error of a rank-k truncation is the norm of the dropped tail.
        let tail: f64 = svd.s.iter().skip(4).map(|sigma| sigma * sigma).sum::<f64>().sqrt();
        assert_abs_diff_eq!(errors[3], tail, epsilon = 1E-10);
    }

    #[test]
    fn test_rank_above_maximum_is_clamped() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 10), &mut rng);
        let svd = JacobiSvd::default().compute_svd(mat.view()).unwrap();

        assert_eq!(reconstruct(&svd, 9999).unwrap(), reconstruct(&svd, 10).unwrap());

        let truncated = svd.clone().compress(9999).unwrap();
        assert_eq!(truncated.s.len(), 10);
        let truncated = svd.compress(3).unwrap();
        assert_eq!(truncated.u.dim(), (10, 3));
        assert_eq!(truncated.v.dim(), (10, 3));
        assert_eq!(truncated.rank, 3);
    }

    #[test]
    fn test_zero_rank_is_rejected() {
        let svd = JacobiSvd::default()
            .compute_svd(Matrix::eye(3).view())
            .unwrap();

        assert_eq!(reconstruct(&svd, 0), Err(SvdImageError::InvalidRank(0)));
        assert!(matches!(
            svd.compress(0),
            Err(SvdImageError::InvalidRank(0))
        ));
    }
}
