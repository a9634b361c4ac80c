//! Binary classification metrics.
//!
//! Labels are `f64` values where `1.0` is the positive class and anything
//! else is negative. A prediction counts as correct only if it equals the
//! true label exactly, so scores should be thresholded first.

use crate::error::{MlError, Result};
use crate::matrix::Matrix;
use crate::metrics::check_shapes;

const POSITIVE: f64 = 1.0;

/// Counts of a binary confusion matrix.
///
/// As a matrix the layout is `[[TP, FN], [FP, TN]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    /// Tallies every element of `y_pred` against `y_true`.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if the shapes differ.
    pub fn compute(y_true: &Matrix, y_pred: &Matrix) -> Result<Self> {
        check_shapes("confusion matrix", y_true, y_pred)?;

        let mut cm = Self::default();
        for (&t, &p) in y_true.as_slice().iter().zip(y_pred.as_slice()) {
            match (p == t, t == POSITIVE) {
                (true, true) => cm.true_positives += 1,
                (true, false) => cm.true_negatives += 1,
                (false, true) => cm.false_negatives += 1,
                (false, false) => cm.false_positives += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_negatives + self.false_positives + self.true_negatives
    }

    /// `[[TP, FN], [FP, TN]]`
    pub fn to_matrix(&self) -> Matrix {
        let mut m = Matrix::zeros(2, 2);
        m[(0, 0)] = self.true_positives as f64;
        m[(0, 1)] = self.false_negatives as f64;
        m[(1, 0)] = self.false_positives as f64;
        m[(1, 1)] = self.true_negatives as f64;
        m
    }
}

/// A score computed from a [`ConfusionMatrix`].
pub trait ClassificationMetric {
    fn compute(&self, confusion: &ConfusionMatrix) -> f64;

    fn name(&self) -> &'static str;
}

impl<M: ClassificationMetric + ?Sized> ClassificationMetric for Box<M> {
    fn compute(&self, confusion: &ConfusionMatrix) -> f64 {
        (**self).compute(confusion)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// (TP + TN) / total
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl ClassificationMetric for Accuracy {
    fn compute(&self, cm: &ConfusionMatrix) -> f64 {
        ratio(cm.true_positives + cm.true_negatives, cm.total())
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

/// TP / (TP + FP)
#[derive(Debug, Clone, Copy, Default)]
pub struct Precision;

impl ClassificationMetric for Precision {
    fn compute(&self, cm: &ConfusionMatrix) -> f64 {
        ratio(cm.true_positives, cm.true_positives + cm.false_positives)
    }

    fn name(&self) -> &'static str {
        "precision"
    }
}

/// TP / (TP + FN), also the true positive rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recall;

impl ClassificationMetric for Recall {
    fn compute(&self, cm: &ConfusionMatrix) -> f64 {
        ratio(cm.true_positives, cm.true_positives + cm.false_negatives)
    }

    fn name(&self) -> &'static str {
        "recall"
    }
}

/// FP / (FP + TN)
#[derive(Debug, Clone, Copy, Default)]
pub struct FalsePositiveRate;

impl ClassificationMetric for FalsePositiveRate {
    fn compute(&self, cm: &ConfusionMatrix) -> f64 {
        ratio(cm.false_positives, cm.false_positives + cm.true_negatives)
    }

    fn name(&self) -> &'static str {
        "fpr"
    }
}

/// Harmonic mean of precision and recall; 0 when both are 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct F1Score;

impl ClassificationMetric for F1Score {
    fn compute(&self, cm: &ConfusionMatrix) -> f64 {
        let precision = Precision.compute(cm);
        let recall = Recall.compute(cm);
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }

    fn name(&self) -> &'static str {
        "f1"
    }
}

/// True and false positive rates at each swept threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RocResult {
    pub thresholds: Vec<f64>,
    pub tpr: Vec<f64>,
    pub fpr: Vec<f64>,
}

/// Receiver operating characteristic over scores in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocCurve;

impl RocCurve {
    /// Threshold step used by [`RocCurve::compute_default`].
    pub const DEFAULT_RESOLUTION: f64 = 0.01;

    /// [`RocCurve::compute`] with a step of [`RocCurve::DEFAULT_RESOLUTION`],
    /// giving 101 thresholds.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if the shapes differ.
    pub fn compute_default(&self, y_true: &Matrix, y_scores: &Matrix) -> Result<RocResult> {
        self.compute(y_true, y_scores, Self::DEFAULT_RESOLUTION)
    }

    /// Sweeps thresholds `0, r, 2r, ...` up to 1 where `r = resolution`.
    ///
    /// At each threshold a score `>= threshold` is predicted positive.
    /// Thresholds are computed as `k * r` rather than by repeated addition.
    ///
    /// # Errors
    /// - [`MlError::InvalidParameter`] unless `0 < resolution <= 1`.
    /// - [`MlError::DimensionMismatch`] if the shapes differ.
    pub fn compute(&self, y_true: &Matrix, y_scores: &Matrix, resolution: f64) -> Result<RocResult> {
        if !(resolution > 0.0 && resolution <= 1.0) {
            return Err(MlError::InvalidParameter(format!(
                "ROC resolution must be in (0, 1], got {}",
                resolution
            )));
        }
        check_shapes("roc curve", y_true, y_scores)?;

        // Tolerance keeps 1.0 itself when 1/r is a float just below an integer.
        let steps = (1.0 / resolution + 1e-9).floor() as usize;
        let mut result = RocResult::default();
        for k in 0..=steps {
            let threshold = k as f64 * resolution;
            let predicted = y_scores.map(|s| if s >= threshold { 1.0 } else { 0.0 });
            let cm = ConfusionMatrix::compute(y_true, &predicted)?;
            result.thresholds.push(threshold);
            result.tpr.push(Recall.compute(&cm));
            result.fpr.push(FalsePositiveRate.compute(&cm));
        }
        Ok(result)
    }
}
