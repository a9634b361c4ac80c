//! Error types shared by every module of the crate.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MlError>;

/// Error type for matrix kernels, strategies and the training cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum MlError {
    /// Operand shapes are incompatible for the named operation.
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Element access outside `[0, rows) x [0, cols)`.
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// A model method was called out of training-cycle order.
    InvalidState { op: &'static str, state: String },
    /// Invalid hyperparameter value.
    InvalidParameter(String),
    /// Empty data provided where non-empty was required.
    EmptyData(String),
}

impl MlError {
    pub(crate) fn mismatch(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        MlError::DimensionMismatch { op, left, right }
    }
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::DimensionMismatch { op, left, right } => write!(
                f,
                "dimension mismatch in {}: {}x{} vs {}x{}",
                op, left.0, left.1, right.0, right.1
            ),
            MlError::IndexOutOfRange {
                row,
                col,
                rows,
                cols,
            } => write!(
                f,
                "index ({}, {}) out of range for {}x{} matrix",
                row, col, rows, cols
            ),
            MlError::InvalidState { op, state } => {
                write!(f, "invalid state: cannot call {} while {}", op, state)
            }
            MlError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            MlError::EmptyData(msg) => write!(f, "empty data: {}", msg),
        }
    }
}

impl std::error::Error for MlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_dimension_mismatch_reports_both_shapes() {
        let err = MlError::mismatch("multiply", (2, 3), (2, 2));
        assert_eq!(err.to_string(), "dimension mismatch in multiply: 2x3 vs 2x2");
    }

    #[test]
    fn test_error_display_index_out_of_range() {
        let err = MlError::IndexOutOfRange {
            row: 4,
            col: 0,
            rows: 2,
            cols: 2,
        };
        assert!(err.to_string().contains("(4, 0)"));
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_error_display_invalid_state() {
        let err = MlError::InvalidState {
            op: "backward",
            state: "constructed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid state: cannot call backward while constructed"
        );
    }

    #[test]
    fn test_error_display_invalid_parameter() {
        let err = MlError::InvalidParameter("lambda must be non-negative".to_string());
        assert!(err.to_string().contains("invalid parameter"));
    }

    #[test]
    fn test_error_is_std_error() {
        let err = MlError::EmptyData("no rows".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
