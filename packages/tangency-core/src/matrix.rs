//! Small dense matrix operations.
//!
//! Row-major storage sized for a handful of assets or a low-degree polynomial
//! fit. Everything goes through [`Matrix`] so a move to a vectorized linear
//! algebra crate only touches this module.

use crate::{Error, Result};
use serde::Serialize;

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::DimensionMismatch {
                left: (rows.len(), cols),
                right: (1, bad.len()),
            });
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// A `1 x n` matrix holding `values`.
    pub fn row_vector(values: &[f64]) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values.to_vec(),
        }
    }

    /// An `n x 1` matrix holding `values`.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Entry at `(row, col)`. Panics when out of bounds, like slice indexing.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "matrix index out of bounds");
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "matrix index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy the matrix out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }

    /// Flatten into the underlying row-major values.
    pub fn into_values(self) -> Vec<f64> {
        self.data
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    /// Matrix product `self · other`.
    ///
    /// Fails with `DimensionMismatch` unless `self.cols == other.rows`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product `self · v`.
    pub fn mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        Ok(self.multiply(&Self::column_vector(v))?.into_values())
    }

    /// Quadratic form `vᵀ · self · v` for a square matrix.
    pub fn quadratic_form(&self, v: &[f64]) -> Result<f64> {
        let mv = self.mul_vec(v)?;
        if mv.len() != v.len() {
            return Err(Error::DimensionMismatch {
                left: (1, v.len()),
                right: (mv.len(), 1),
            });
        }
        Ok(v.iter().zip(&mv).map(|(a, b)| a * b).sum())
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: (1, a.len()),
            right: (b.len(), 1),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Solve `a · x = b` by Gauss-Jordan elimination with partial pivoting.
///
/// The system is consumed and reduced in place. Row swaps move the matching
/// right-hand-side entry too. A pivot that vanishes relative to the largest
/// coefficient of `a` means the system is singular.
pub fn solve(mut a: Matrix, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = a.rows;
    if a.cols != n || b.len() != n {
        return Err(Error::DimensionMismatch {
            left: a.shape(),
            right: (b.len(), 1),
        });
    }

    let scale = a.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = f64::EPSILON * scale * n as f64;

    for col in 0..n {
        // Row with the largest magnitude in this column
        let mut pivot_row = col;
        for r in col + 1..n {
            if a.get(r, col).abs() > a.get(pivot_row, col).abs() {
                pivot_row = r;
            }
        }

        if pivot_row != col {
            for c in 0..n {
                a.data.swap(col * n + c, pivot_row * n + c);
            }
            b.swap(col, pivot_row);
        }

        let pivot = a.get(col, col);
        if !pivot.is_finite() || pivot.abs() <= tolerance {
            return Err(Error::SingularMatrix(col));
        }

        for c in col..n {
            a.data[col * n + c] /= pivot;
        }
        b[col] /= pivot;

        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = a.get(r, col);
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a.data[r * n + c] -= factor * a.data[col * n + c];
            }
            b[r] -= factor * b[col];
        }
    }

    Ok(b)
}
