use crate::error::{MlError, Result};
use crate::matrix::Matrix;

/// Weight penalty added to the training objective.
///
/// The model adds [`Regularizer::gradient`] to the projected loss gradient
/// before the optimizer step. Only weights are penalised; the bias is left
/// alone.
pub trait Regularizer {
    /// Penalty for the given weights.
    fn compute(&self, weights: &Matrix) -> f64;

    /// Gradient of the penalty, same shape as `weights`.
    fn gradient(&self, weights: &Matrix) -> Matrix;

    /// Regularization strength λ.
    fn lambda(&self) -> f64;
}

impl<R: Regularizer + ?Sized> Regularizer for Box<R> {
    fn compute(&self, weights: &Matrix) -> f64 {
        (**self).compute(weights)
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        (**self).gradient(weights)
    }

    fn lambda(&self) -> f64 {
        (**self).lambda()
    }
}

fn validate_lambda(lambda: f64) -> Result<f64> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(MlError::InvalidParameter(format!(
            "regularization strength must be a finite non-negative number, got {}",
            lambda
        )));
    }
    Ok(lambda)
}

/// Lasso penalty: `λ · Σ|w|`, gradient `λ · sign(w)`.
#[derive(Debug, Clone, Copy)]
pub struct L1Regularizer {
    lambda: f64,
}

impl L1Regularizer {
    /// # Errors
    /// [`MlError::InvalidParameter`] for negative or non-finite `lambda`.
    pub fn new(lambda: f64) -> Result<Self> {
        Ok(Self {
            lambda: validate_lambda(lambda)?,
        })
    }
}

impl Regularizer for L1Regularizer {
    fn compute(&self, weights: &Matrix) -> f64 {
        self.lambda * weights.abs().sum()
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        weights.sign().scale(self.lambda)
    }

    fn lambda(&self) -> f64 {
        self.lambda
    }
}

/// Ridge penalty: `(λ/2) · Σ w²`, gradient `λ · w`.
#[derive(Debug, Clone, Copy)]
pub struct L2Regularizer {
    lambda: f64,
}

impl L2Regularizer {
    /// # Errors
    /// [`MlError::InvalidParameter`] for negative or non-finite `lambda`.
    pub fn new(lambda: f64) -> Result<Self> {
        Ok(Self {
            lambda: validate_lambda(lambda)?,
        })
    }
}

impl Regularizer for L2Regularizer {
    fn compute(&self, weights: &Matrix) -> f64 {
        0.5 * self.lambda * weights.map(|w| w * w).sum()
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        weights.scale(self.lambda)
    }

    fn lambda(&self) -> f64 {
        self.lambda
    }
}

/// No penalty. Zero cost and a zero gradient shaped like the weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegularizer;

impl Regularizer for NoRegularizer {
    fn compute(&self, _weights: &Matrix) -> f64 {
        0.0
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        Matrix::zeros(weights.rows(), weights.cols())
    }

    fn lambda(&self) -> f64 {
        0.0
    }
}

/// Tag used to select a regularizer at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegularizerKind {
    None,
    L1,
    L2,
}

/// Builds the regularizer named by `kind`. `lambda` is ignored for `None`.
pub fn create_regularizer(kind: RegularizerKind, lambda: f64) -> Result<Box<dyn Regularizer>> {
    Ok(match kind {
        RegularizerKind::None => Box::new(NoRegularizer),
        RegularizerKind::L1 => Box::new(L1Regularizer::new(lambda)?),
        RegularizerKind::L2 => Box::new(L2Regularizer::new(lambda)?),
    })
}
