//! # matlearn
//!
//! Dense `f64` matrices and a composable gradient-descent training loop.
//!
//! ## Core Design Principles
//!
//! - **Value-semantics matrices**: [`Matrix`] owns a row-major buffer; cloning
//!   deep-copies and no two matrices share storage.
//! - **Pluggable strategies**: losses, regularizers and optimizers are traits
//!   with one type per variant, plus `create_*` factories for runtime choice.
//! - **Explicit training cycle**: a model tracks
//!   `forward → backward → update` in a [`model::TrainingState`] and rejects
//!   out-of-order calls with [`MlError::InvalidState`].
//! - **Training/Inference Separation**: `into_fitted` drops every training
//!   component and keeps only the parameters.
//!
//! ## Quick Start
//!
//! ```rust
//! use matlearn::dataset::Dataset;
//! use matlearn::loss::MSELoss;
//! use matlearn::model::linear::LinearRegression;
//! use matlearn::model::{InferenceModel, TrainableModel};
//! use matlearn::optimizer::BatchOptimizer;
//! use matlearn::regularizers::L2Regularizer;
//! use matlearn::trainer::Trainer;
//!
//! let dataset = Dataset::from_rows(
//!     vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]],
//!     vec![5.0, 7.0, 9.0],
//! )?;
//!
//! let mut model = LinearRegression::new(
//!     2,
//!     MSELoss,
//!     BatchOptimizer::new(0.01),
//!     L2Regularizer::new(0.01)?,
//! );
//! let trainer = Trainer::builder().max_epochs(1000).build()?;
//! let history = trainer.fit(&mut model, &dataset)?;
//! assert!(history.final_loss() < history.initial_loss());
//!
//! let fitted = model.into_fitted();
//! let prediction = fitted.predict(dataset.features())?;
//! assert_eq!(prediction.shape(), (3, 1));
//! # Ok::<(), matlearn::MlError>(())
//! ```
//!
//! ## Module Structure
//!
//! - `matrix`: dense matrix, arithmetic and Gaussian elimination
//! - `loss`: differentiable loss functions (MAE, MSE, RMSE)
//! - `regularizers`: weight penalties (L1, L2)
//! - `optimizer`: parameter update rules (batch, stochastic, mini-batch)
//! - `model`: training-cycle protocol and linear regression
//! - `dataset`: in-memory data with row batching
//! - `trainer`: high-level training loop orchestration
//! - `metrics`: regression and classification scores

pub mod error;

/// Dense row-major matrix of `f64`.
pub mod matrix;

/// Differentiable loss functions for model training.
pub mod loss;

/// Weight regularization strategies to prevent overfitting.
pub mod regularizers;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// Models and the training-cycle protocol.
pub mod model;

/// In-memory datasets.
pub mod dataset;

/// High-level training loop.
pub mod trainer;

pub mod metrics;

pub use error::{MlError, Result};
pub use matrix::Matrix;
