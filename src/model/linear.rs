//! Linear regression: `y = X · W + b`.
//!
//! - [`LinearRegression`] is the trainable model. It owns its parameters and
//!   its loss, optimizer and regularizer for its whole lifetime.
//! - [`LinearModel`] is the fitted, inference-only counterpart. It carries no
//!   training hyperparameters.
//!
//! Bias convention: the bias is a separate `1 x k` row added to every sample,
//! equivalent to an implicit column of ones appended to `X`. Inputs therefore
//! have exactly `n_features` columns and no bias column.

use crate::error::{MlError, Result};
use crate::loss::LossFunction;
use crate::matrix::Matrix;
use crate::model::{InferenceModel, TrainableModel, TrainingState};
use crate::optimizer::Optimizer;
use crate::regularizers::{NoRegularizer, Regularizer};

/// Parameters of a linear model: weights `d x k` and bias `1 x k`.
///
/// Also used for gradients, which have the same shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SerializableLinearParams"))]
pub struct LinearParams {
    pub weights: Matrix,
    pub bias: Matrix,
}

impl LinearParams {
    /// Zero-initialised parameters for `n_features` inputs and `n_outputs` targets.
    pub fn zeros(n_features: usize, n_outputs: usize) -> Self {
        Self {
            weights: Matrix::zeros(n_features, n_outputs),
            bias: Matrix::zeros(1, n_outputs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bias.rows() != 1 || self.bias.cols() != self.weights.cols() {
            return Err(MlError::mismatch(
                "linear params",
                self.weights.shape(),
                self.bias.shape(),
            ));
        }
        Ok(())
    }

    /// `X · W + 1 · b`
    fn predict(&self, x: &Matrix) -> Result<Matrix> {
        if x.cols() != self.weights.rows() {
            return Err(MlError::mismatch("forward", x.shape(), self.weights.shape()));
        }
        let ones = Matrix::filled(x.rows(), 1, 1.0);
        x.multiply(&self.weights)?.add(&ones.multiply(&self.bias)?)
    }
}

/// Unchecked wire form of [`LinearParams`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SerializableLinearParams {
    weights: Matrix,
    bias: Matrix,
}

#[cfg(feature = "serde")]
impl TryFrom<SerializableLinearParams> for LinearParams {
    type Error = MlError;

    fn try_from(value: SerializableLinearParams) -> Result<Self> {
        let params = LinearParams {
            weights: value.weights,
            bias: value.bias,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Trainable linear regression model.
///
/// Forward pass: `X · W + b`
/// Backward pass: `∇W = Xᵀ · ∂L/∂pred + ∇R(W)`, `∇b = column sums of ∂L/∂pred`
///
/// # Example
/// ```rust
/// use matlearn::loss::MSELoss;
/// use matlearn::model::linear::LinearRegression;
/// use matlearn::model::TrainableModel;
/// use matlearn::optimizer::BatchOptimizer;
/// use matlearn::regularizers::L2Regularizer;
/// use matlearn::Matrix;
///
/// let mut model = LinearRegression::new(
///     2,
///     MSELoss,
///     BatchOptimizer::new(0.01),
///     L2Regularizer::new(0.01).unwrap(),
/// );
/// let x = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
/// let y = Matrix::column_vector(vec![5.0, 7.0]);
///
/// let pred = model.forward(&x).unwrap();
/// let _loss = model.compute_loss(&pred, &y).unwrap();
/// model.backward(&y).unwrap();
/// model.update().unwrap();
/// ```
pub struct LinearRegression<L, O, R = NoRegularizer> {
    params: LinearParams,
    loss: L,
    optimizer: O,
    regularizer: R,
    state: TrainingState,
    last_input: Option<Matrix>,
    last_prediction: Option<Matrix>,
    gradients: Option<LinearParams>,
}

impl<L, O> LinearRegression<L, O, NoRegularizer>
where
    L: LossFunction,
    O: Optimizer,
{
    /// Model without a weight penalty.
    pub fn unregularized(n_features: usize, loss: L, optimizer: O) -> Self {
        Self::new(n_features, loss, optimizer, NoRegularizer)
    }
}

impl<L, O, R> LinearRegression<L, O, R>
where
    L: LossFunction,
    O: Optimizer,
    R: Regularizer,
{
    /// Single-output model with zero-initialised weights and bias.
    ///
    /// # Parameters
    /// - `n_features`: number of input columns.
    pub fn new(n_features: usize, loss: L, optimizer: O, regularizer: R) -> Self {
        Self::with_outputs(n_features, 1, loss, optimizer, regularizer)
    }

    /// Model predicting `n_outputs` target columns.
    pub fn with_outputs(
        n_features: usize,
        n_outputs: usize,
        loss: L,
        optimizer: O,
        regularizer: R,
    ) -> Self {
        Self::build(LinearParams::zeros(n_features, n_outputs), loss, optimizer, regularizer)
    }

    /// Constructs a model from explicit parameters (e.g. a warm start).
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] unless `bias` is `1 x weights.cols()`.
    pub fn from_params(params: LinearParams, loss: L, optimizer: O, regularizer: R) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params, loss, optimizer, regularizer))
    }

    fn build(params: LinearParams, loss: L, optimizer: O, regularizer: R) -> Self {
        Self {
            params,
            loss,
            optimizer,
            regularizer,
            state: TrainingState::Constructed,
            last_input: None,
            last_prediction: None,
            gradients: None,
        }
    }

    pub fn n_features(&self) -> usize {
        self.params.weights.rows()
    }

    pub fn params(&self) -> &LinearParams {
        &self.params
    }

    pub fn weights(&self) -> &Matrix {
        &self.params.weights
    }

    pub fn bias(&self) -> &Matrix {
        &self.params.bias
    }

    /// Gradient computed by the last `backward`, until `update` consumes it.
    pub fn pending_gradients(&self) -> Option<&LinearParams> {
        self.gradients.as_ref()
    }

    pub fn loss(&self) -> &L {
        &self.loss
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Mutable access for learning-rate schedules.
    pub fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }

    pub fn regularizer(&self) -> &R {
        &self.regularizer
    }

    fn invalid_state(&self, op: &'static str) -> MlError {
        MlError::InvalidState {
            op,
            state: self.state.to_string(),
        }
    }
}

impl<L, O, R> TrainableModel for LinearRegression<L, O, R>
where
    L: LossFunction,
    O: Optimizer,
    R: Regularizer,
{
    type Output = LinearModel;

    fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        let prediction = self.params.predict(x)?;
        self.last_input = Some(x.clone());
        self.last_prediction = Some(prediction.clone());
        self.gradients = None;
        self.state = TrainingState::Forwarded;
        Ok(prediction)
    }

    fn compute_loss(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        self.loss.compute(prediction, target)
    }

    fn backward(&mut self, target: &Matrix) -> Result<()> {
        if self.state != TrainingState::Forwarded {
            return Err(self.invalid_state("backward"));
        }
        let (Some(x), Some(prediction)) = (&self.last_input, &self.last_prediction) else {
            return Err(self.invalid_state("backward"));
        };

        let grad_output = self.loss.gradient(prediction, target)?;
        let grad_weights = x
            .transpose()
            .multiply(&grad_output)?
            .add(&self.regularizer.gradient(&self.params.weights))?;
        let grad_bias = grad_output.column_sums();

        self.gradients = Some(LinearParams {
            weights: grad_weights,
            bias: grad_bias,
        });
        self.state = TrainingState::BackwardComputed;
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        if self.state != TrainingState::BackwardComputed {
            return Err(self.invalid_state("update"));
        }
        let Some(grads) = self.gradients.as_ref() else {
            return Err(self.invalid_state("update"));
        };

        // Step copies so a failure leaves both parameters untouched.
        let mut weights = self.params.weights.clone();
        let mut bias = self.params.bias.clone();
        self.optimizer.step(&mut weights, &grads.weights)?;
        self.optimizer.step(&mut bias, &grads.bias)?;

        self.params = LinearParams { weights, bias };
        self.gradients = None;
        self.state = TrainingState::Updated;
        Ok(())
    }

    fn state(&self) -> TrainingState {
        self.state
    }

    fn regularization_penalty(&self) -> f64 {
        self.regularizer.compute(&self.params.weights)
    }

    fn into_fitted(self) -> LinearModel {
        LinearModel {
            params: self.params,
        }
    }
}

/// Fitted linear model: inference only, free of training hyperparameters.
///
/// Deserializing goes through [`LinearParams`], so a loaded model has passed
/// the same checks as [`LinearModel::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearModel {
    params: LinearParams,
}

impl LinearModel {
    /// # Errors
    /// [`MlError::DimensionMismatch`] unless `bias` is `1 x weights.cols()`.
    pub fn new(params: LinearParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &LinearParams {
        &self.params
    }

    pub fn weights(&self) -> &Matrix {
        &self.params.weights
    }

    pub fn bias(&self) -> &Matrix {
        &self.params.bias
    }
}

impl InferenceModel for LinearModel {
    fn predict(&self, x: &Matrix) -> Result<Matrix> {
        self.params.predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::{MAELoss, MSELoss};
    use crate::optimizer::BatchOptimizer;
    use crate::regularizers::{L1Regularizer, L2Regularizer};

    fn m(rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    fn params(weights: Vec<f64>, bias: f64) -> LinearParams {
        LinearParams {
            weights: Matrix::column_vector(weights),
            bias: Matrix::filled(1, 1, bias),
        }
    }

    // === Construction ===

    #[test]
    fn test_new_zero_initialized() {
        let model = LinearRegression::unregularized(3, MSELoss, BatchOptimizer::new(0.1));
        assert_eq!(model.weights(), &Matrix::zeros(3, 1));
        assert_eq!(model.bias(), &Matrix::zeros(1, 1));
        assert_eq!(model.state(), TrainingState::Constructed);
        assert_eq!(model.n_features(), 3);
    }

    #[test]
    fn test_with_outputs_shapes() {
        let model = LinearRegression::with_outputs(
            4,
            2,
            MSELoss,
            BatchOptimizer::new(0.1),
            NoRegularizer,
        );
        assert_eq!(model.weights().shape(), (4, 2));
        assert_eq!(model.bias().shape(), (1, 2));
    }

    #[test]
    fn test_from_params_rejects_bad_bias() {
        let bad = LinearParams {
            weights: Matrix::zeros(2, 1),
            bias: Matrix::zeros(1, 2),
        };
        let result = LinearRegression::from_params(bad, MSELoss, BatchOptimizer::new(0.1), NoRegularizer);
        assert!(matches!(result, Err(MlError::DimensionMismatch { .. })));
    }

    // === Forward ===

    #[test]
    fn test_forward_correctness() {
        // [[1, 0], [0, 1]] @ [2, 3] + 1 = [3, 4]
        let mut model = LinearRegression::from_params(
            params(vec![2.0, 3.0], 1.0),
            MSELoss,
            BatchOptimizer::new(0.1),
            NoRegularizer,
        )
        .unwrap();
        let x = m(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let pred = model.forward(&x).unwrap();
        assert_eq!(pred, Matrix::column_vector(vec![3.0, 4.0]));
        assert_eq!(model.state(), TrainingState::Forwarded);
    }

    #[test]
    fn test_forward_wrong_feature_count() {
        let mut model = LinearRegression::unregularized(2, MSELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![1.0, 2.0, 3.0]]);
        let err = model.forward(&x).unwrap_err();
        assert_eq!(err, MlError::mismatch("forward", (1, 3), (2, 1)));
        assert_eq!(model.state(), TrainingState::Constructed);
    }

    // === Backward ===

    #[test]
    fn test_backward_before_forward_is_invalid_state() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        let err = model.backward(&Matrix::zeros(1, 1)).unwrap_err();
        assert!(matches!(err, MlError::InvalidState { op: "backward", .. }));
    }

    #[test]
    fn test_backward_gradient_values() {
        // X = [[1, 2], [3, 4]], w = 0, b = 0, y = [1, 2]
        // pred = [0, 0]; dL/dpred = 2/2 * (pred - y) = [-1, -2]
        // dW = X^T @ [-1, -2] = [1*-1 + 3*-2, 2*-1 + 4*-2] = [-7, -10]
        // db = -3
        let mut model = LinearRegression::unregularized(2, MSELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let y = Matrix::column_vector(vec![1.0, 2.0]);
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();

        let grads = model.pending_gradients().unwrap();
        assert_eq!(grads.weights, Matrix::column_vector(vec![-7.0, -10.0]));
        assert_eq!(grads.bias, Matrix::filled(1, 1, -3.0));
        assert_eq!(model.state(), TrainingState::BackwardComputed);
    }

    #[test]
    fn test_backward_adds_regularizer_gradient_to_weights_only() {
        // Prediction equals target, so only the L2 term remains: 0.5 * w
        let mut model = LinearRegression::from_params(
            params(vec![2.0, -4.0], 1.0),
            MSELoss,
            BatchOptimizer::new(0.1),
            L2Regularizer::new(0.5).unwrap(),
        )
        .unwrap();
        let x = m(vec![vec![1.0, 1.0]]);
        let pred = model.forward(&x).unwrap();
        model.backward(&pred).unwrap();

        let grads = model.pending_gradients().unwrap();
        assert_eq!(grads.weights, Matrix::column_vector(vec![1.0, -2.0]));
        assert_eq!(grads.bias, Matrix::zeros(1, 1));
    }

    #[test]
    fn test_backward_twice_is_invalid_state() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![1.0]]);
        let y = m(vec![vec![2.0]]);
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();
        assert!(matches!(
            model.backward(&y),
            Err(MlError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_backward_target_shape_mismatch_keeps_state() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        model.forward(&m(vec![vec![1.0], vec![2.0]])).unwrap();
        let err = model.backward(&Matrix::zeros(3, 1)).unwrap_err();
        assert!(matches!(err, MlError::DimensionMismatch { .. }));
        assert_eq!(model.state(), TrainingState::Forwarded);
    }

    // === Update ===

    #[test]
    fn test_update_before_backward_is_invalid_state() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        assert!(matches!(
            model.update(),
            Err(MlError::InvalidState { op: "update", .. })
        ));
        model.forward(&m(vec![vec![1.0]])).unwrap();
        assert!(model.update().is_err());
    }

    #[test]
    fn test_update_applies_gradient() {
        // single sample x = 2, y = 1: pred = 0, dL/dpred = 2 * (0 - 1) = -2
        // dW = 2 * -2 = -4, db = -2; lr = 0.1 -> w = 0.4, b = 0.2
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![2.0]]);
        let y = m(vec![vec![1.0]]);
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();
        model.update().unwrap();

        assert!((model.weights()[(0, 0)] - 0.4).abs() < 1e-12);
        assert!((model.bias()[(0, 0)] - 0.2).abs() < 1e-12);
        assert_eq!(model.state(), TrainingState::Updated);
        assert!(model.pending_gradients().is_none());
    }

    #[test]
    fn test_update_twice_is_invalid_state() {
        let mut model = LinearRegression::unregularized(1, MAELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![1.0]]);
        let y = m(vec![vec![3.0]]);
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();
        model.update().unwrap();
        assert!(model.update().is_err());
        assert!(model.backward(&y).is_err());

        // A new forward starts the next cycle.
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();
        model.update().unwrap();
    }

    #[test]
    fn test_forward_discards_pending_gradient() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        let x = m(vec![vec![2.0]]);
        let y = m(vec![vec![1.0]]);
        model.forward(&x).unwrap();
        model.backward(&y).unwrap();
        assert!(model.pending_gradients().is_some());

        model.forward(&x).unwrap();
        assert_eq!(model.state(), TrainingState::Forwarded);
        assert!(model.pending_gradients().is_none());
        assert!(matches!(
            model.update(),
            Err(MlError::InvalidState { op: "update", .. })
        ));
        assert_eq!(model.weights(), &Matrix::zeros(1, 1));
        assert_eq!(model.bias(), &Matrix::zeros(1, 1));
    }

    #[test]
    fn test_regularization_penalty() {
        let model = LinearRegression::from_params(
            params(vec![1.0, -3.0], 0.0),
            MSELoss,
            BatchOptimizer::new(0.1),
            L1Regularizer::new(0.5).unwrap(),
        )
        .unwrap();
        assert_eq!(model.regularization_penalty(), 2.0);
    }

    #[test]
    fn test_optimizer_mut_changes_learning_rate() {
        let mut model = LinearRegression::unregularized(1, MSELoss, BatchOptimizer::new(0.1));
        model.optimizer_mut().set_learning_rate(0.0);
        let x = m(vec![vec![1.0]]);
        model.forward(&x).unwrap();
        model.backward(&m(vec![vec![5.0]])).unwrap();
        model.update().unwrap();
        assert_eq!(model.weights(), &Matrix::zeros(1, 1));
    }

    #[test]
    fn test_boxed_strategies() {
        use crate::loss::{create_loss, LossKind};
        use crate::optimizer::{create_optimizer, OptimizerKind};
        use crate::regularizers::{create_regularizer, RegularizerKind};

        let mut model = LinearRegression::new(
            1,
            create_loss(LossKind::Mse),
            create_optimizer(OptimizerKind::Batch, 0.1),
            create_regularizer(RegularizerKind::L2, 0.01).unwrap(),
        );
        model.forward(&m(vec![vec![1.0]])).unwrap();
        model.backward(&m(vec![vec![1.0]])).unwrap();
        model.update().unwrap();
        assert!(model.weights()[(0, 0)] > 0.0);
    }

    // === Fitted model ===

    #[test]
    fn test_into_fitted_predict() {
        let model = LinearRegression::from_params(
            params(vec![2.0, 3.0], 1.0),
            MSELoss,
            BatchOptimizer::new(0.1),
            NoRegularizer,
        )
        .unwrap();
        let fitted = model.into_fitted();
        // y = 2*1 + 3*2 + 1 = 9
        let pred = fitted.predict(&m(vec![vec![1.0, 2.0]])).unwrap();
        assert_eq!(pred, m(vec![vec![9.0]]));
    }

    #[test]
    fn test_fitted_new_validates() {
        let ok = LinearModel::new(params(vec![1.0], 0.0));
        assert!(ok.is_ok());
        let bad = LinearModel::new(LinearParams {
            weights: Matrix::zeros(1, 1),
            bias: Matrix::zeros(2, 1),
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_fitted_predict_wrong_features() {
        let fitted = LinearModel::new(params(vec![1.0, 1.0], 0.0)).unwrap();
        assert!(fitted.predict(&m(vec![vec![1.0]])).is_err());
    }
}
