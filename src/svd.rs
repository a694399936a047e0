//! Define an SVD container, its sign convention and compression statistics.

use crate::types::Matrix;
use itertools::Itertools;
use ndarray::{Array1, Axis, Zip};

/// Singular value decomposition `A = U diag(s) V^T` of an `m x n` matrix with `m >= n`.
#[derive(Clone, Debug)]
pub struct Decomposition {
    /// The U matrix (m x n)
    pub u: Matrix,
    /// The singular values in descending order (n)
    pub s: Array1<f64>,
    /// The V matrix (n x n)
    pub v: Matrix,
    /// Number of singular values above the numerical zero threshold
    pub rank: usize,
}

/// Storage and error figures for a rank-k truncation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionStats {
    /// Number of components kept.
    pub rank: usize,
    /// Floats stored by the factors relative to the dense matrix: `k (m + n + 1) / (m n)`.
    pub storage_ratio: f64,
    /// Fraction of the squared Frobenius norm carried by the kept components.
    pub energy_retained: f64,
    /// Relative Frobenius error of the truncation, `sqrt(1 - energy_retained)`.
    pub relative_error: f64,
}

impl Decomposition {
    /// Assemble a decomposition from factors whose singular values may be unsorted.
    ///
    /// Sorts components by descending singular value (stable on ties), zeroes
    /// singular values below `s_max * max(m, n) * eps`, and applies the sign
    /// convention of [`Decomposition::fix_signs`].
    pub(crate) fn from_unsorted(u: Matrix, s: Array1<f64>, v: Matrix) -> Self {
        let (m, n) = (u.nrows(), v.nrows());
        let order = (0..s.len())
            .sorted_by(|&a, &b| s[b].partial_cmp(&s[a]).unwrap_or(std::cmp::Ordering::Equal))
            .collect_vec();

        let mut u_sorted = Matrix::zeros((m, s.len()));
        let mut s_sorted = Array1::zeros(s.len());
        let mut v_sorted = Matrix::zeros((n, s.len()));
        for (new_index, &old_index) in order.iter().enumerate() {
            s_sorted[new_index] = s[old_index];
            u_sorted.column_mut(new_index).assign(&u.column(old_index));
            v_sorted.column_mut(new_index).assign(&v.column(old_index));
        }

        let threshold = s_sorted.get(0).copied().unwrap_or(0.0) * (m.max(n) as f64) * f64::EPSILON;
        let mut rank = 0;
        for (index, sigma) in s_sorted.iter_mut().enumerate() {
            if *sigma > threshold {
                rank += 1;
            } else {
                *sigma = 0.0;
                u_sorted.column_mut(index).fill(0.0);
            }
        }

        let mut decomposition = Decomposition {
            u: u_sorted,
            s: s_sorted,
            v: v_sorted,
            rank,
        };
        decomposition.fix_signs();
        decomposition
    }

    /// Number of rows of the decomposed matrix.
    pub fn nrows(&self) -> usize {
        self.u.nrows()
    }

    /// Number of columns of the decomposed matrix.
    pub fn ncols(&self) -> usize {
        self.v.nrows()
    }

    /// Largest rank a truncation can have, `min(m, n)`.
    pub fn max_rank(&self) -> usize {
        self.s.len()
    }

    /// Make the largest-magnitude entry of every U column non-negative.
    ///
    /// The first entry wins on ties. The matching V column is flipped along
    /// with its U column so the product is unchanged.
    pub fn fix_signs(&mut self) {
        let u = &mut self.u;
        let v = &mut self.v;
        Zip::from(u.axis_iter_mut(Axis(1)))
            .and(v.axis_iter_mut(Axis(1)))
            .for_each(|mut u_col, mut v_col| {
                let pivot = u_col
                    .iter()
                    .fold(0.0_f64, |best, &item| if item.abs() > best.abs() { item } else { best });
                if pivot < 0.0 {
                    u_col.map_inplace(|item| *item = -*item);
                    v_col.map_inplace(|item| *item = -*item);
                }
            });
    }

    /// Multiply the factors back together.
    pub fn to_mat(&self) -> Matrix {
        let mut scaled_u = self.u.clone();
        Zip::from(scaled_u.axis_iter_mut(Axis(1)))
            .and(self.s.view())
            .for_each(|mut col, &sigma| col.map_inplace(|item| *item *= sigma));
        scaled_u.dot(&self.v.t())
    }

    /// Statistics of a truncation to `rank` components (clamped to `max_rank`).
    pub fn stats(&self, rank: usize) -> CompressionStats {
        let rank = rank.min(self.max_rank());
        let (m, n) = (self.nrows() as f64, self.ncols() as f64);

        let total: f64 = self.s.iter().map(|sigma| sigma * sigma).sum();
        let kept: f64 = self.s.iter().take(rank).map(|sigma| sigma * sigma).sum();
        let energy_retained = if total > 0.0 {
            (kept / total).min(1.0)
        } else {
            1.0
        };

        CompressionStats {
            rank,
            storage_ratio: rank as f64 * (m + n + 1.0) / (m * n),
            energy_retained,
            relative_error: (1.0 - energy_retained).max(0.0).sqrt(),
        }
    }
}
