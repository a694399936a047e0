//! One-sided (Hestenes) Jacobi SVD.
//!
//! The engine orthogonalises the columns of `A` by plane rotations applied
//! from the right, `A V = U Σ`, accumulating the rotations in `V`. Once every
//! pair of columns is orthogonal to working precision the column norms are the
//! singular values and the normalised columns form `U`.
//!
//! Columns whose norm drops below `tolerance * ||A||_F` are treated as zero:
//! they take part in no further rotations and yield zero singular values.
//!
//! References
//! * J. Demmel and K. Veselic, "Jacobi's Method is More Accurate than QR",
//!   SIAM J. Matrix Anal. Appl. 13(4), 1992.

use crate::compute_svd::{check_input, SvdEngine};
use crate::helpers::frobenius_norm;
use crate::svd::Decomposition;
use crate::types::{Matrix, Result, SvdImageError};
use log::{debug, trace};
use ndarray::{s, Array1, ArrayView2, Zip};

/// Tuning knobs of the Jacobi iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JacobiOptions {
    /// Maximum number of cyclic sweeps over all column pairs.
    pub max_sweeps: usize,
    /// Relative orthogonality threshold. Zero selects `rows * eps`.
    ///
    /// Columns shorter than `tolerance * ||A||_F` are treated as zero.
    pub tolerance: f64,
}

impl Default for JacobiOptions {
    fn default() -> Self {
        Self {
            max_sweeps: 60,
            tolerance: 0.0,
        }
    }
}

impl JacobiOptions {
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Default [`SvdEngine`] of the crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct JacobiSvd {
    options: JacobiOptions,
}

impl JacobiSvd {
    pub fn new(options: JacobiOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JacobiOptions {
        &self.options
    }
}

impl SvdEngine for JacobiSvd {
    fn compute_svd(&self, mat: ArrayView2<f64>) -> Result<Decomposition> {
        check_input(&mat)?;

        let (m, n) = mat.dim();
        let tol = if self.options.tolerance > 0.0 {
            self.options.tolerance
        } else {
            m as f64 * f64::EPSILON
        };

        // Squared norm below which a column counts as zero.
        let floor = (tol * frobenius_norm(&mat)).powi(2);

        // Row i of `work` is column i of A, row i of `vt` is column i of V.
        let mut work = mat.t().as_standard_layout().into_owned();
        let mut vt = Matrix::eye(n);

        let mut converged = false;
        for sweep in 1..=self.options.max_sweeps {
            let rotations = jacobi_sweep(&mut work, &mut vt, tol, floor);
            trace!("Jacobi sweep {}: {} rotations", sweep, rotations);
            if rotations == 0 {
                debug!(
                    "Jacobi SVD of {}x{} matrix converged after {} sweeps",
                    m, n, sweep
                );
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(SvdImageError::NumericalFailure(format!(
                "Jacobi SVD of {}x{} matrix did not converge within {} sweeps",
                m, n, self.options.max_sweeps
            )));
        }

        let mut u = Matrix::zeros((m, n));
        let mut sigma = Array1::zeros(n);
        for (index, row) in work.outer_iter().enumerate() {
            let norm_sq = row.dot(&row);
            if norm_sq <= floor {
                continue;
            }
            let norm = norm_sq.sqrt();
            sigma[index] = norm;
            u.column_mut(index).assign(&row.mapv(|item| item / norm));
        }

        let v = vt.reversed_axes().as_standard_layout().into_owned();
        Ok(Decomposition::from_unsorted(u, sigma, v))
    }
}

/// One cyclic sweep over all column pairs. Returns the number of rotations applied.
///
/// Pairs involving a column with squared norm at or below `floor` are skipped.
fn jacobi_sweep(work: &mut Matrix, vt: &mut Matrix, tol: f64, floor: f64) -> usize {
    let n = work.nrows();
    let mut rotations = 0;

    for p in 0..n.saturating_sub(1) {
        for q in p + 1..n {
            let (alpha, beta, gamma) = {
                let col_p = work.row(p);
                let col_q = work.row(q);
                (col_p.dot(&col_p), col_q.dot(&col_q), col_p.dot(&col_q))
            };

            if alpha <= floor || beta <= floor {
                continue;
            }
            if gamma == 0.0 || gamma.abs() <= tol * (alpha * beta).sqrt() {
                continue;
            }

            let zeta = (beta - alpha) / (2.0 * gamma);
            let t = zeta.signum() / (zeta.abs() + 1.0_f64.hypot(zeta));
            let cs = 1.0 / 1.0_f64.hypot(t);
            let sn = cs * t;

            rotate_rows(work, p, q, cs, sn);
            rotate_rows(vt, p, q, cs, sn);
            rotations += 1;
        }
    }

    rotations
}

/// Replace rows `p` and `q` by `cs * p - sn * q` and `sn * p + cs * q`.
fn rotate_rows(mat: &mut Matrix, p: usize, q: usize, cs: f64, sn: f64) {
    let (row_p, row_q) = mat.multi_slice_mut((s![p, ..], s![q, ..]));
    Zip::from(row_p).and(row_q).for_each(|x, y| {
        let (xp, yq) = (*x, *y);
        *x = cs * xp - sn * yq;
        *y = sn * xp + cs * yq;
    });
}
