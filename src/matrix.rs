//! Dense matrix primitives for the Levenberg-Marquardt engine.
//!
//! This module provides the small set of linear-algebra operations the
//! optimizer needs: multiplication into a preallocated target, transpose
//! copies, diagonal extraction, in-place scaling and addition, Gauss-Jordan
//! inversion, and a sum-of-squares reduction. All matrices are rectangular
//! `f64` arrays backed by `ndarray`.

use ndarray::linalg::general_mat_mul;
use ndarray::Array2;

use crate::error::{LevMarError, Result};

/// A pivot whose magnitude falls below this threshold is treated as zero
/// during inversion.
const SINGULARITY_EPS: f64 = 1e-12;

/// A dense, heap-allocated matrix of `f64` values.
///
/// The optimizer allocates these once per problem size and reuses them
/// across iterations, so every operation that produces a matrix writes
/// into an existing target instead of allocating a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Array2<f64>,
}

impl DenseMatrix {
    /// Create a `rows x cols` matrix with all entries set to zero.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// Create a matrix from a rectangular row-major source.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the rows do not all have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Array2::zeros((height, width));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevMarError::DimensionMismatch(format!(
                    "row {} has length {}, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                data[[i, j]] = value;
            }
        }
        Ok(Self { data })
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    /// Read the entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Write the entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[[row, col]] = value;
    }

    /// A read-only view of the backing array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Copy all entries from another matrix of the same shape.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the shapes disagree.
    pub fn copy_from(&mut self, other: &DenseMatrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(LevMarError::DimensionMismatch(format!(
                "cannot copy {:?} into {:?}",
                other.shape(),
                self.shape()
            )));
        }
        self.data.assign(&other.data);
        Ok(())
    }

    /// Copy the transpose of another matrix into this one.
    ///
    /// The target shape must be the transpose of the source shape.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the shapes disagree.
    pub fn copy_transposed_from(&mut self, other: &DenseMatrix) -> Result<()> {
        if self.nrows() != other.ncols() || self.ncols() != other.nrows() {
            return Err(LevMarError::DimensionMismatch(format!(
                "cannot copy the transpose of {:?} into {:?}",
                other.shape(),
                self.shape()
            )));
        }
        self.data.assign(&other.data.t());
        Ok(())
    }

    /// Compute `self * rhs` into `out` without allocating.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the inner dimensions differ or `out` does
    ///   not have shape `(self.nrows(), rhs.ncols())`.
    pub fn mul_into(&self, rhs: &DenseMatrix, out: &mut DenseMatrix) -> Result<()> {
        if self.ncols() != rhs.nrows() {
            return Err(LevMarError::DimensionMismatch(format!(
                "cannot multiply {:?} by {:?}",
                self.shape(),
                rhs.shape()
            )));
        }
        if out.shape() != (self.nrows(), rhs.ncols()) {
            return Err(LevMarError::DimensionMismatch(format!(
                "product of {:?} and {:?} does not fit in {:?}",
                self.shape(),
                rhs.shape(),
                out.shape()
            )));
        }
        general_mat_mul(1.0, &self.data, &rhs.data, 0.0, &mut out.data);
        Ok(())
    }

    /// Zero every off-diagonal entry in place, keeping the diagonal.
    pub fn diagonalise(&mut self) {
        for ((row, col), value) in self.data.indexed_iter_mut() {
            if row != col {
                *value = 0.0;
            }
        }
    }

    /// Multiply every entry by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        self.data *= factor;
    }

    /// Add another matrix of the same shape elementwise in place.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the shapes disagree.
    pub fn add_assign(&mut self, other: &DenseMatrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(LevMarError::DimensionMismatch(format!(
                "cannot add {:?} to {:?}",
                other.shape(),
                self.shape()
            )));
        }
        self.data += &other.data;
        Ok(())
    }

    /// Invert a square matrix in place by Gauss-Jordan elimination with
    /// partial pivoting.
    ///
    /// # Returns
    ///
    /// * `DimensionMismatch` if the matrix is not square.
    /// * `SingularMatrix` if any pivot magnitude falls below the
    ///   singularity threshold. The comparison is written so that a NaN
    ///   pivot is also rejected rather than propagated.
    pub fn invert(&mut self) -> Result<()> {
        let (rows, cols) = self.shape();
        if rows != cols {
            return Err(LevMarError::DimensionMismatch(format!(
                "cannot invert a non-square {:?} matrix",
                self.shape()
            )));
        }
        let n = rows;
        let mut inverse = Array2::<f64>::eye(n);

        for col in 0..n {
            // Pick the largest remaining magnitude in this column as pivot.
            let mut pivot_row = col;
            let mut pivot_mag = self.data[[col, col]].abs();
            for row in col + 1..n {
                let mag = self.data[[row, col]].abs();
                if mag > pivot_mag {
                    pivot_row = row;
                    pivot_mag = mag;
                }
            }
            if !(pivot_mag > SINGULARITY_EPS) {
                return Err(LevMarError::SingularMatrix);
            }
            if pivot_row != col {
                for j in 0..n {
                    self.data.swap([col, j], [pivot_row, j]);
                    inverse.swap([col, j], [pivot_row, j]);
                }
            }

            let pivot = self.data[[col, col]];
            for j in 0..n {
                self.data[[col, j]] /= pivot;
                inverse[[col, j]] /= pivot;
            }

            // Eliminate the pivot column from every other row.
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = self.data[[row, col]];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    let elimination = factor * self.data[[col, j]];
                    self.data[[row, j]] -= elimination;
                    let elimination = factor * inverse[[col, j]];
                    inverse[[row, j]] -= elimination;
                }
            }
        }

        self.data.assign(&inverse);
        Ok(())
    }

    /// Sum of the squares of all entries.
    pub fn sum_of_squares(&self) -> f64 {
        self.data.iter().map(|value| value * value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zeros_shape() {
        let m = DenseMatrix::zeros(3, 2);
        assert_eq!(m.shape(), (3, 2));
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(m.get(i, j), 0.0);
            }
        }
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let result = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(LevMarError::DimensionMismatch(_))));
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut m = DenseMatrix::zeros(2, 2);
        m.set(1, 0, 4.5);
        assert_eq!(m.get(1, 0), 4.5);
    }

    #[test]
    fn test_copy_transposed_from() {
        let source = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let mut target = DenseMatrix::zeros(3, 2);
        target.copy_transposed_from(&source).unwrap();
        assert_eq!(target.get(0, 0), 1.0);
        assert_eq!(target.get(0, 1), 4.0);
        assert_eq!(target.get(2, 1), 6.0);

        let mut wrong = DenseMatrix::zeros(2, 2);
        assert!(matches!(
            wrong.copy_transposed_from(&source),
            Err(LevMarError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_invert_known_2x2() {
        // [[4, 7], [2, 6]] has inverse [[0.6, -0.7], [-0.2, 0.4]].
        let mut m = DenseMatrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
        m.invert().unwrap();
        assert_relative_eq!(m.get(0, 0), 0.6, epsilon = 1e-12);
        assert_relative_eq!(m.get(0, 1), -0.7, epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 0), -0.2, epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 1), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_needs_pivoting() {
        // Zero in the leading position forces a row swap.
        let mut m = DenseMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        m.invert().unwrap();
        assert_relative_eq!(m.get(0, 1), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.get(0, 0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_singular() {
        let mut m = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(m.invert(), Err(LevMarError::SingularMatrix)));
    }

    #[test]
    fn test_invert_non_square() {
        let mut m = DenseMatrix::zeros(2, 3);
        assert!(matches!(
            m.invert(),
            Err(LevMarError::DimensionMismatch(_))
        ));
    }
}
