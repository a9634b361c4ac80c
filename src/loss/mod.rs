use crate::error::{MlError, Result};
use crate::matrix::Matrix;

/// A differentiable loss function used during model training.
///
/// Implementors define:
/// - how to compute the scalar cost (for logging/metrics);
/// - how to compute the gradient of that cost w.r.t. the predictions.
///
/// The gradient is what the model projects back onto its parameters in
/// `backward()`. Every gradient here is the exact derivative of the
/// implementor's own `compute`, including the `1/n` averaging factor.
pub trait LossFunction {
    /// Scalar cost of `prediction` against `target`.
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if the shapes differ.
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64>;

    /// Gradient of [`Self::compute`] w.r.t. `prediction`, same shape as `prediction`.
    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix>;

    /// Short identifier such as `"mse"`.
    fn name(&self) -> &'static str;
}

impl<L: LossFunction + ?Sized> LossFunction for Box<L> {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        (**self).compute(prediction, target)
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        (**self).gradient(prediction, target)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

fn residual(prediction: &Matrix, target: &Matrix, op: &'static str) -> Result<Matrix> {
    if prediction.shape() != target.shape() {
        return Err(MlError::mismatch(op, prediction.shape(), target.shape()));
    }
    prediction.sub(target)
}

fn element_count(m: &Matrix) -> f64 {
    (m.rows() * m.cols()) as f64
}

fn mean_absolute(prediction: &Matrix, target: &Matrix) -> Result<f64> {
    Ok(residual(prediction, target, "loss")?.abs().mean())
}

fn mean_absolute_grad(prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
    let diff = residual(prediction, target, "loss gradient")?;
    if diff.is_empty() {
        return Ok(diff);
    }
    let n = element_count(&diff);
    Ok(diff.sign().scale(1.0 / n))
}

fn mean_squared(prediction: &Matrix, target: &Matrix) -> Result<f64> {
    Ok(residual(prediction, target, "loss")?.map(|d| d * d).mean())
}

fn mean_squared_grad(prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
    let diff = residual(prediction, target, "loss gradient")?;
    if diff.is_empty() {
        return Ok(diff);
    }
    let n = element_count(&diff);
    Ok(diff.scale(2.0 / n))
}

/// Mean Absolute Error: `L = (1/n) * Σ|pred_i - target_i|`
///
/// Gradient w.r.t. prediction: `sign(pred - target) / n`
/// (subgradient 0 where `pred == target`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MAELoss;

impl LossFunction for MAELoss {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        mean_absolute(prediction, target)
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        mean_absolute_grad(prediction, target)
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

/// L1 loss. Same cost and gradient as [`MAELoss`].
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss;

impl LossFunction for L1Loss {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        mean_absolute(prediction, target)
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        mean_absolute_grad(prediction, target)
    }

    fn name(&self) -> &'static str {
        "l1"
    }
}

/// Mean Squared Error: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `2 * (pred - target) / n`
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFunction for MSELoss {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        mean_squared(prediction, target)
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        mean_squared_grad(prediction, target)
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}

/// L2 loss. Same cost and gradient as [`MSELoss`].
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Loss;

impl LossFunction for L2Loss {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        mean_squared(prediction, target)
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        mean_squared_grad(prediction, target)
    }

    fn name(&self) -> &'static str {
        "l2"
    }
}

/// Root Mean Squared Error: `L = sqrt(MSE)`
///
/// Gradient w.r.t. prediction: `(pred - target) / (n * RMSE)`, and all zeros
/// when the predictions are exact (the derivative is undefined there).
#[derive(Debug, Clone, Copy, Default)]
pub struct RMSELoss;

impl LossFunction for RMSELoss {
    fn compute(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        Ok(mean_squared(prediction, target)?.sqrt())
    }

    fn gradient(&self, prediction: &Matrix, target: &Matrix) -> Result<Matrix> {
        let diff = residual(prediction, target, "loss gradient")?;
        if diff.is_empty() {
            return Ok(diff);
        }
        let rmse = diff.map(|d| d * d).mean().sqrt();
        if rmse == 0.0 {
            return Ok(Matrix::zeros(diff.rows(), diff.cols()));
        }
        let n = element_count(&diff);
        Ok(diff.scale(1.0 / (n * rmse)))
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

/// Tag used to select a loss at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LossKind {
    L1,
    Mae,
    L2,
    Mse,
    Rmse,
}

/// Builds the loss named by `kind`.
pub fn create_loss(kind: LossKind) -> Box<dyn LossFunction> {
    match kind {
        LossKind::L1 => Box::new(L1Loss),
        LossKind::Mae => Box::new(MAELoss),
        LossKind::L2 => Box::new(L2Loss),
        LossKind::Mse => Box::new(MSELoss),
        LossKind::Rmse => Box::new(RMSELoss),
    }
}
