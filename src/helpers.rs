//! Matrix comparison helpers.

use ndarray::{ArrayBase, Data, Ix2};

/// Frobenius norm of a real matrix.
pub fn frobenius_norm<S: Data<Elem = f64>>(mat: &ArrayBase<S, Ix2>) -> f64 {
    mat.iter().map(|item| item * item).sum::<f64>().sqrt()
}

pub trait RelDiff {
    /// Return the relative Frobenius norm difference of `self` and `other`.
    ///
    /// Falls back to the absolute difference if `other` is the zero matrix.
    fn rel_diff<S: Data<Elem = f64>>(&self, other: &ArrayBase<S, Ix2>) -> f64;
}

impl<S> RelDiff for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn rel_diff<T: Data<Elem = f64>>(&self, other: &ArrayBase<T, Ix2>) -> f64 {
        let diff = self - other;
        let reference = frobenius_norm(other);

        if reference > 0.0 {
            frobenius_norm(&diff) / reference
        } else {
            frobenius_norm(&diff)
        }
    }
}
