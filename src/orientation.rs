//! Orientation handling so that the SVD engine only ever sees tall matrices.

use crate::types::Matrix;

/// Records whether a matrix was transposed before decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// The matrix already had at least as many rows as columns.
    Original,
    /// The matrix was wide and has been transposed.
    Transposed,
}

impl Orientation {
    pub fn is_transposed(self) -> bool {
        self == Orientation::Transposed
    }
}

/// Return a matrix with `rows >= cols`, transposing wide inputs.
pub fn normalize(mat: Matrix) -> (Matrix, Orientation) {
    if mat.nrows() < mat.ncols() {
        (mat.reversed_axes().as_standard_layout().into_owned(), Orientation::Transposed)
    } else {
        (mat, Orientation::Original)
    }
}

/// Undo [`normalize`] on a matrix derived from the normalized one.
pub fn restore(mat: Matrix, orientation: Orientation) -> Matrix {
    match orientation {
        Orientation::Original => mat,
        Orientation::Transposed => mat.reversed_axes().as_standard_layout().into_owned(),
    }
}
