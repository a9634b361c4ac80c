use crate::error::{MlError, Result};
use crate::matrix::Matrix;

/// Trait for gradient-based optimizers.
///
/// Optimizers only update parameters from a gradient the caller supplies.
/// How many samples contributed to that gradient (the whole dataset, one
/// mini-batch, or a single sample) is decided by the caller, typically the
/// [`Trainer`](crate::trainer::Trainer), never by the optimizer.
///
/// # Example
/// ```rust
/// use matlearn::optimizer::{BatchOptimizer, Optimizer};
/// use matlearn::Matrix;
///
/// let sgd = BatchOptimizer::new(0.1);
/// let mut params = Matrix::column_vector(vec![2.0, 3.0]);
/// let grads = Matrix::column_vector(vec![1.0, -1.0]);
/// sgd.step(&mut params, &grads).unwrap();
/// assert!(params.approx_eq(&Matrix::column_vector(vec![1.9, 3.1]), 1e-12));
/// ```
pub trait Optimizer {
    /// Performs one update in place:
    /// ```text
    /// param = param - learning_rate * grad
    /// ```
    ///
    /// # Errors
    /// [`MlError::DimensionMismatch`] if `param` and `grad` differ in shape.
    /// `param` is left untouched in that case.
    fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()>;

    /// Current learning rate.
    fn learning_rate(&self) -> f64;

    /// Replaces the learning rate, e.g. for a decay schedule.
    fn set_learning_rate(&mut self, lr: f64);
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()> {
        (**self).step(param, grad)
    }

    fn learning_rate(&self) -> f64 {
        (**self).learning_rate()
    }

    fn set_learning_rate(&mut self, lr: f64) {
        (**self).set_learning_rate(lr)
    }
}

fn descend(param: &mut Matrix, grad: &Matrix, lr: f64) -> Result<()> {
    if param.shape() != grad.shape() {
        return Err(MlError::mismatch("optimizer step", param.shape(), grad.shape()));
    }
    *param = param.sub(&grad.scale(lr))?;
    Ok(())
}

/// Gradient descent driven by the full-dataset gradient.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptimizer {
    lr: f64,
}

impl BatchOptimizer {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }
}

impl Optimizer for BatchOptimizer {
    fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()> {
        descend(param, grad, self.lr)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Gradient descent driven by single-sample gradients.
#[derive(Debug, Clone, Copy)]
pub struct StochasticOptimizer {
    lr: f64,
}

impl StochasticOptimizer {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }
}

impl Optimizer for StochasticOptimizer {
    fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()> {
        descend(param, grad, self.lr)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Gradient descent driven by mini-batch gradients.
#[derive(Debug, Clone, Copy)]
pub struct MiniBatchOptimizer {
    lr: f64,
}

impl MiniBatchOptimizer {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }
}

impl Optimizer for MiniBatchOptimizer {
    fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()> {
        descend(param, grad, self.lr)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Tag used to select an optimizer at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptimizerKind {
    Batch,
    Stochastic,
    MiniBatch,
}

/// Builds the optimizer named by `kind` with learning rate `lr`.
pub fn create_optimizer(kind: OptimizerKind, lr: f64) -> Box<dyn Optimizer> {
    match kind {
        OptimizerKind::Batch => Box::new(BatchOptimizer::new(lr)),
        OptimizerKind::Stochastic => Box::new(StochasticOptimizer::new(lr)),
        OptimizerKind::MiniBatch => Box::new(MiniBatchOptimizer::new(lr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [OptimizerKind; 3] = [
        OptimizerKind::Batch,
        OptimizerKind::Stochastic,
        OptimizerKind::MiniBatch,
    ];

    fn col(values: &[f64]) -> Matrix {
        Matrix::column_vector(values.to_vec())
    }

    #[test]
    fn test_new_initialization() {
        let opt = BatchOptimizer::new(0.01);
        assert_eq!(opt.learning_rate(), 0.01);
    }

    #[test]
    fn test_set_learning_rate() {
        let mut opt = MiniBatchOptimizer::new(0.1);
        opt.set_learning_rate(0.05);
        assert_eq!(opt.learning_rate(), 0.05);

        let mut boxed = create_optimizer(OptimizerKind::Stochastic, 1.0);
        boxed.set_learning_rate(0.5);
        assert_eq!(boxed.learning_rate(), 0.5);
    }

    #[test]
    fn test_step_correctness() {
        // params_new = params_old - lr * grads
        // [2.0 - 0.1*1.0, 3.0 - 0.1*(-1.0)] = [1.9, 3.1]
        let opt = BatchOptimizer::new(0.1);
        let mut params = col(&[2.0, 3.0]);
        opt.step(&mut params, &col(&[1.0, -1.0])).unwrap();
        assert!(params.approx_eq(&col(&[1.9, 3.1]), 1e-12));
    }

    #[test]
    fn test_all_variants_apply_identical_update() {
        let params = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let grads = Matrix::from_rows(vec![vec![0.5, -0.25], vec![0.1, -0.2]]).unwrap();

        let results: Vec<Matrix> = ALL_KINDS
            .iter()
            .map(|&kind| {
                let mut p = params.clone();
                create_optimizer(kind, 0.01).step(&mut p, &grads).unwrap();
                p
            })
            .collect();

        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[test]
    fn test_step_zero_learning_rate() {
        for kind in ALL_KINDS {
            let opt = create_optimizer(kind, 0.0);
            let mut params = col(&[1.0, 2.0]);
            opt.step(&mut params, &col(&[100.0, -7.0])).unwrap();
            assert_eq!(params, col(&[1.0, 2.0]));
        }
    }

    #[test]
    fn test_step_zero_gradients() {
        let opt = StochasticOptimizer::new(0.1);
        let mut params = col(&[1.0, 2.0]);
        opt.step(&mut params, &col(&[0.0, 0.0])).unwrap();
        assert_eq!(params, col(&[1.0, 2.0]));
    }

    #[test]
    fn test_step_negative_learning_rate() {
        // With negative LR: params - (-0.1)*grad = params + 0.1*grad
        let opt = BatchOptimizer::new(-0.1);
        let mut params = col(&[1.0]);
        opt.step(&mut params, &col(&[1.0])).unwrap();
        assert!((params[(0, 0)] - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_step_shape_mismatch_leaves_param_untouched() {
        let opt = BatchOptimizer::new(0.1);
        let mut params = col(&[1.0, 2.0]);
        let err = opt.step(&mut params, &col(&[1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err, MlError::mismatch("optimizer step", (2, 1), (3, 1)));
        assert_eq!(params, col(&[1.0, 2.0]));
    }

    #[test]
    fn test_clone_produces_same_update() {
        let opt = MiniBatchOptimizer::new(0.01);
        let copy = opt;
        let mut a = col(&[1.0]);
        let mut b = col(&[1.0]);
        opt.step(&mut a, &col(&[0.5])).unwrap();
        copy.step(&mut b, &col(&[0.5])).unwrap();
        assert_eq!(a, b);
    }
}
