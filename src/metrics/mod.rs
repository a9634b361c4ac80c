//! Evaluation metrics for finished predictions.
//!
//! Regression metrics (R², adjusted R², MSE, RMSE, MAE) live here;
//! classification metrics (confusion matrix, accuracy, precision, recall,
//! false positive rate, F1, ROC curve) live in [`classification`].
//!
//! Metrics only read matrices; they never touch a model.

pub mod classification;

pub use classification::{
    Accuracy, ClassificationMetric, ConfusionMatrix, F1Score, FalsePositiveRate, Precision,
    Recall, RocCurve, RocResult,
};

use crate::error::{MlError, Result};
use crate::matrix::Matrix;

/// Total variance below which R² is reported as 0.
pub const R2_VARIANCE_TOLERANCE: f64 = 1e-9;

/// A scalar score computed from true and predicted values of the same shape.
pub trait Metric {
    /// # Errors
    /// [`MlError::DimensionMismatch`] if the shapes differ.
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64>;

    fn name(&self) -> &'static str;
}

impl<M: Metric + ?Sized> Metric for Box<M> {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        (**self).compute(y_true, y_pred)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

pub(crate) fn check_shapes(op: &'static str, y_true: &Matrix, y_pred: &Matrix) -> Result<()> {
    if y_true.shape() != y_pred.shape() {
        return Err(MlError::mismatch(op, y_true.shape(), y_pred.shape()));
    }
    Ok(())
}

fn residuals(op: &'static str, y_true: &Matrix, y_pred: &Matrix) -> Result<Matrix> {
    check_shapes(op, y_true, y_pred)?;
    y_pred.sub(y_true)
}

/// Coefficient of determination.
///
/// R² = 1 - `SS_res` / `SS_tot`, taken over every element. Returns 0 when the
/// targets have (almost) no variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2Metric;

impl Metric for R2Metric {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        let ss_res = residuals("r2", y_true, y_pred)?.map(|d| d * d).sum();
        let mean = y_true.mean();
        let ss_tot = y_true.map(|t| (t - mean) * (t - mean)).sum();

        if ss_tot < R2_VARIANCE_TOLERANCE {
            return Ok(0.0);
        }
        Ok(1.0 - ss_res / ss_tot)
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

/// R² corrected for the number of predictors `p`:
///
/// ```text
/// 1 - (1 - R²) · (n - 1) / (n - p - 1)
/// ```
///
/// `n` is the number of samples (rows). Undefined, and reported as `NaN`,
/// when `n - p - 1 <= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustedR2Metric {
    predictors: usize,
}

impl AdjustedR2Metric {
    pub fn new(predictors: usize) -> Self {
        Self { predictors }
    }

    pub fn predictors(&self) -> usize {
        self.predictors
    }
}

impl Metric for AdjustedR2Metric {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        let r2 = R2Metric.compute(y_true, y_pred)?;
        let n = y_true.rows() as f64;
        let dof = n - self.predictors as f64 - 1.0;
        if dof <= 0.0 {
            return Ok(f64::NAN);
        }
        Ok(1.0 - (1.0 - r2) * (n - 1.0) / dof)
    }

    fn name(&self) -> &'static str {
        "adjusted_r2"
    }
}

/// Mean squared error; 0 for empty inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MseMetric;

impl Metric for MseMetric {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        Ok(residuals("mse", y_true, y_pred)?.map(|d| d * d).mean())
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}

/// Root mean squared error; 0 for empty inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmseMetric;

impl Metric for RmseMetric {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        Ok(MseMetric.compute(y_true, y_pred)?.sqrt())
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

/// Mean absolute error; 0 for empty inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaeMetric;

impl Metric for MaeMetric {
    fn compute(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        Ok(residuals("mae", y_true, y_pred)?.abs().mean())
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

/// Tag used to select a metric at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    R2,
    AdjustedR2,
    Mse,
    Rmse,
    Mae,
    Accuracy,
    Precision,
    Recall,
    FalsePositiveRate,
    F1,
}

/// Builds a regression metric, or `None` for a classification kind.
///
/// `AdjustedR2` is created with zero predictors; use
/// [`AdjustedR2Metric::new`] to set another count.
pub fn create_metric(kind: MetricKind) -> Option<Box<dyn Metric>> {
    let metric: Box<dyn Metric> = match kind {
        MetricKind::R2 => Box::new(R2Metric),
        MetricKind::AdjustedR2 => Box::new(AdjustedR2Metric::new(0)),
        MetricKind::Mse => Box::new(MseMetric),
        MetricKind::Rmse => Box::new(RmseMetric),
        MetricKind::Mae => Box::new(MaeMetric),
        _ => return None,
    };
    Some(metric)
}

/// Builds a classification metric, or `None` for a regression kind.
pub fn create_classification_metric(kind: MetricKind) -> Option<Box<dyn ClassificationMetric>> {
    let metric: Box<dyn ClassificationMetric> = match kind {
        MetricKind::Accuracy => Box::new(Accuracy),
        MetricKind::Precision => Box::new(Precision),
        MetricKind::Recall => Box::new(Recall),
        MetricKind::FalsePositiveRate => Box::new(FalsePositiveRate),
        MetricKind::F1 => Box::new(F1Score),
        _ => return None,
    };
    Some(metric)
}
