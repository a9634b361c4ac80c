//! Dense row-major matrix of `f64` values.
//!
//! [`Matrix`] is a value type: cloning copies every element, and no operation
//! hands out storage shared with another matrix. Shape is fixed at
//! construction; operations that produce a different shape return a new
//! matrix.
//!
//! All binary operations validate shapes up front and return
//! [`MlError::DimensionMismatch`] naming both operands, so a failed call never
//! leaves a half-computed result behind.
//!
//! ```rust
//! use matlearn::Matrix;
//!
//! let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
//! let i = Matrix::identity(2);
//! assert_eq!(a.multiply(&i).unwrap(), a);
//! ```

use crate::error::{MlError, Result};
use std::fmt;
use std::ops::{Index, IndexMut, Range};

/// Pivots with magnitude below this value are treated as exactly zero during
/// row reduction.
pub const PIVOT_TOLERANCE: f64 = 1e-9;

/// Dense 2D matrix with row-major storage.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawMatrix"))]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Creates a `rows x cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Creates a `rows x cols` matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Creates an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Builds a matrix from row-major data and an explicit shape.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if `data.len() != rows * cols`. The
    /// error reports the requested shape against `data` as a `1 x len` row.
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(MlError::mismatch("from_vec", (rows, cols), (1, data.len())));
        }
        Ok(Self { data, rows, cols })
    }

    /// Builds a matrix from nested rows, e.g. `vec![vec![1.0, 2.0], vec![2.0, 3.0]]`.
    ///
    /// An empty outer vector gives a `0 x 0` matrix.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if the rows are ragged, reporting the
    /// offending row against the first one, both as `1 x len`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                log::debug!("from_rows: row {} has {} columns, expected {}", i, row.len(), n_cols);
                return Err(MlError::mismatch("from_rows", (1, row.len()), (1, n_cols)));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n_rows,
            cols: n_cols,
        })
    }

    /// Builds an `n x 1` column vector.
    pub fn column_vector(values: Vec<f64>) -> Self {
        let rows = values.len();
        Self {
            data: values,
            rows,
            cols: 1,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns `true` when the matrix holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consumes the matrix and returns its row-major elements.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(MlError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    /// Reads element `(row, col)`.
    ///
    /// # Errors
    /// [`MlError::IndexOutOfRange`] outside `[0, rows) x [0, cols)`.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.offset(row, col)?;
        Ok(self.data[idx])
    }

    /// Mutable reference to element `(row, col)`.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut f64> {
        let idx = self.offset(row, col)?;
        Ok(&mut self.data[idx])
    }

    /// Writes element `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        *self.get_mut(row, col)? = value;
        Ok(())
    }

    /// Copies row `i` out as a vector.
    pub fn row(&self, i: usize) -> Result<Vec<f64>> {
        if i >= self.rows {
            return Err(MlError::IndexOutOfRange {
                row: i,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.data[i * self.cols..(i + 1) * self.cols].to_vec())
    }

    /// Copies the rows in `range` into a new matrix with the same column count.
    pub fn select_rows(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.rows {
            return Err(MlError::IndexOutOfRange {
                row: range.end,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let data = self.data[range.start * self.cols..range.end * self.cols].to_vec();
        Ok(Self {
            data,
            rows: range.end - range.start,
            cols: self.cols,
        })
    }

    fn ensure_same_shape(&self, other: &Self, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MlError::mismatch(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    fn zip_with(&self, other: &Self, op: &'static str, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        self.ensure_same_shape(other, op)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| f(*a, *b))
            .collect();
        Ok(Self {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// Standard matrix product.
    ///
    /// Accumulates `self[i][h] * other[h][j]` for `h` ascending, starting from
    /// `0.0`, so results are reproducible bit for bit.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] unless `self.cols() == other.rows()`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(MlError::mismatch("multiply", self.shape(), other.shape()));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = 0.0;
                for h in 0..self.cols {
                    acc += self.data[i * self.cols + h] * other.data[h * other.cols + j];
                }
                out.data[i * other.cols + j] = acc;
            }
        }
        Ok(out)
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|x| f(*x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Multiplies every element by `k`.
    pub fn scale(&self, k: f64) -> Self {
        self.map(|x| x * k)
    }

    /// Elementwise sign: `-1.0`, `0.0` or `1.0`. Zero and NaN map to `0.0`.
    pub fn sign(&self) -> Self {
        self.map(|x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
    }

    /// Elementwise absolute value.
    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Mean of all elements, `0.0` for an empty matrix.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }

    /// Column sums as a `1 x cols` row.
    pub fn column_sums(&self) -> Self {
        let mut out = Self::zeros(1, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j] += self.data[i * self.cols + j];
            }
        }
        out
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for k in 0..self.cols {
            self.data.swap(a * self.cols + k, b * self.cols + k);
        }
    }

    /// Reduces a copy of the matrix to row-echelon form with partial pivoting.
    ///
    /// Columns are processed left to right while pivot rows remain. For each
    /// column the row with the largest magnitude at or below the current pivot
    /// row is swapped into place. A pivot smaller than [`PIVOT_TOLERANCE`] is
    /// written as `0.0` and the column is skipped without consuming the pivot
    /// row. Eliminated cells are set to exactly `0.0`.
    ///
    /// Empty matrices are returned unchanged.
    pub fn gaussian_elimination(&self) -> Self {
        let mut u = self.clone();
        if u.rows == 0 || u.cols == 0 {
            return u;
        }
        let (rows, cols) = u.shape();
        let mut pivot_row = 0;

        for j in 0..cols {
            if pivot_row >= rows {
                break;
            }

            let mut max_row = pivot_row;
            let mut max_val = u.data[pivot_row * cols + j].abs();
            for i in pivot_row + 1..rows {
                let v = u.data[i * cols + j].abs();
                if v > max_val {
                    max_val = v;
                    max_row = i;
                }
            }
            if max_row != pivot_row {
                u.swap_rows(pivot_row, max_row);
            }

            let pivot = u.data[pivot_row * cols + j];
            if pivot.abs() < PIVOT_TOLERANCE {
                log::trace!("skipping near-zero pivot in column {} (row {})", j, pivot_row);
                u.data[pivot_row * cols + j] = 0.0;
                continue;
            }

            for i in pivot_row + 1..rows {
                let c = u.data[i * cols + j] / pivot;
                for z in j..cols {
                    u.data[i * cols + z] -= u.data[pivot_row * cols + z] * c;
                }
                u.data[i * cols + j] = 0.0;
            }

            pivot_row += 1;
        }

        u
    }

    /// Number of non-zero rows after row reduction.
    pub fn rank(&self) -> usize {
        let u = self.gaussian_elimination();
        (0..u.rows)
            .filter(|&i| {
                u.data[i * u.cols..(i + 1) * u.cols]
                    .iter()
                    .any(|x| x.abs() >= PIVOT_TOLERANCE)
            })
            .count()
    }

    /// Shapes match and every pair of elements differs by at most `tol`.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        match self.offset(row, col) {
            Ok(idx) => &self.data[idx],
            Err(e) => panic!("{}", e),
        }
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        match self.offset(row, col) {
            Ok(idx) => &mut self.data[idx],
            Err(e) => panic!("{}", e),
        }
    }
}

/// Wire form of [`Matrix`]; checked against its shape before use.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMatrix> for Matrix {
    type Error = MlError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Self::from_vec(raw.data, raw.rows, raw.cols)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = MlError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(feature = "ndarray")]
impl From<&ndarray::Array2<f64>> for Matrix {
    fn from(a: &ndarray::Array2<f64>) -> Self {
        Self {
            data: a.iter().copied().collect(),
            rows: a.nrows(),
            cols: a.ncols(),
        }
    }
}

#[cfg(feature = "ndarray")]
impl From<&Matrix> for ndarray::Array2<f64> {
    fn from(m: &Matrix) -> Self {
        ndarray::Array2::from_shape_fn((m.rows, m.cols), |(i, j)| m.data[i * m.cols + j])
    }
}
