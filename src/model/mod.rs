pub mod state;
pub use state::TrainingState;

pub mod linear;

use crate::error::Result;
use crate::matrix::Matrix;

/// A model that can be trained with the forward/backward/update protocol.
///
/// A driver must call, per cycle and in this order:
///
/// ```text
/// let pred = model.forward(&x)?;
/// let loss = model.compute_loss(&pred, &y)?;
/// model.backward(&y)?;
/// model.update()?;
/// ```
///
/// Implementations track the cycle in a [`TrainingState`] and reject
/// out-of-order calls instead of reusing stale gradients.
pub trait TrainableModel {
    /// Inference-only model produced once training is finished.
    type Output;

    /// Computes predictions for `input` and starts a new cycle.
    fn forward(&mut self, input: &Matrix) -> Result<Matrix>;

    /// Loss of `prediction` against `target`. Pure; no state transition.
    fn compute_loss(&self, prediction: &Matrix, target: &Matrix) -> Result<f64>;

    /// Computes and stores the parameter gradient for the last forward pass.
    fn backward(&mut self, target: &Matrix) -> Result<()>;

    /// Applies the stored gradient through the optimizer.
    fn update(&mut self) -> Result<()>;

    /// Current cycle position.
    fn state(&self) -> TrainingState;

    /// Regularization penalty of the current parameters.
    fn regularization_penalty(&self) -> f64;

    fn into_fitted(self) -> Self::Output;
}

/// A trained model used only for prediction.
pub trait InferenceModel {
    /// Predicts one output row per input row.
    fn predict(&self, input: &Matrix) -> Result<Matrix>;
}
