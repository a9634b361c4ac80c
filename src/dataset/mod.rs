//! In-memory training data.
//!
//! A [`Dataset`] is a validated `(X, y)` pair where:
//! - `X` is a feature matrix of shape `(n_samples, n_features)`
//! - `y` is a target matrix of shape `(n_samples, n_targets)`
//!
//! # Example
//!
//! ```rust
//! use matlearn::dataset::Dataset;
//!
//! let x = vec![vec![1.0], vec![2.0], vec![3.0]];
//! let y = vec![0.0, 1.0, 2.0];
//! let dataset = Dataset::from_rows(x, y).unwrap();
//!
//! for batch in dataset.batches(2) {
//!     let (x_batch, y_batch) = batch.unwrap();
//!     assert_eq!(x_batch.rows(), y_batch.rows());
//! }
//! ```

use crate::error::{MlError, Result};
use crate::matrix::Matrix;

/// Feature and target matrices with matching row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    targets: Matrix,
}

impl Dataset {
    /// # Errors
    /// - [`MlError::DimensionMismatch`] if the row counts differ.
    /// - [`MlError::EmptyData`] if there are no samples.
    pub fn new(features: Matrix, targets: Matrix) -> Result<Self> {
        if features.rows() != targets.rows() {
            return Err(MlError::mismatch("dataset", features.shape(), targets.shape()));
        }
        if features.rows() == 0 {
            return Err(MlError::EmptyData("dataset has no samples".into()));
        }
        Ok(Self { features, targets })
    }

    /// Builds a single-target dataset from feature rows and one target per row.
    pub fn from_rows(features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        Self::new(Matrix::from_rows(features)?, Matrix::column_vector(targets))
    }

    pub fn len(&self) -> usize {
        self.features.rows()
    }

    /// Always `false` for a constructed dataset; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.features.rows() == 0
    }

    pub fn n_features(&self) -> usize {
        self.features.cols()
    }

    pub fn features(&self) -> &Matrix {
        &self.features
    }

    pub fn targets(&self) -> &Matrix {
        &self.targets
    }

    /// Iterates over consecutive row batches of `batch_size` samples.
    ///
    /// The last batch may be smaller. A `batch_size` of 0 is treated as 1.
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        Batches {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }
}

/// Iterator over dataset batches, created by [`Dataset::batches`].
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    current: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<(Matrix, Matrix)>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len();
        if self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        let batch = self
            .dataset
            .features
            .select_rows(range.clone())
            .and_then(|x| Ok((x, self.dataset.targets.select_rows(range)?)));
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.current);
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}
