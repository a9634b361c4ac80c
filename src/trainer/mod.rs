use crate::{
    dataset::Dataset,
    error::{MlError, Result},
    model::TrainableModel,
};
use log::{debug, info};

/// How many samples contribute to each gradient step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Batching {
    /// One step per epoch over the whole dataset.
    #[default]
    Full,
    /// One step per batch of the given size; the last batch may be smaller.
    MiniBatch(usize),
    /// One step per sample.
    Stochastic,
}

impl Batching {
    fn batch_size(self, n_samples: usize) -> usize {
        match self {
            Batching::Full => n_samples,
            Batching::MiniBatch(size) => size,
            Batching::Stochastic => 1,
        }
    }
}

/// Hyperparameters of the training loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainerConfig {
    pub max_epochs: usize,
    pub batching: Batching,
    /// Emit an `info!` line every `log_every` epochs; 0 disables progress lines.
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs: 1000,
            batching: Batching::Full,
            log_every: 10,
        }
    }
}

impl TrainerConfig {
    fn validate(&self) -> Result<()> {
        if self.batching == Batching::MiniBatch(0) {
            return Err(MlError::InvalidParameter(
                "mini-batch size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Per-epoch loss record returned by [`Trainer::fit`].
///
/// Each entry is the mean over the epoch's batches of the batch loss plus the
/// regularization penalty, measured on the forward pass before that batch's
/// update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn losses(&self) -> &[f64] {
        &self.losses
    }

    pub fn initial_loss(&self) -> Option<f64> {
        self.losses.first().copied()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }

    pub fn epochs(&self) -> usize {
        self.losses.len()
    }
}

/// Orchestrates the training loop for a [`TrainableModel`].
///
/// The model owns its loss, optimizer and regularizer; the trainer only decides
/// how the data is split into batches and how many epochs to run. Once built
/// via [`TrainerBuilder`] it is immutable and can be reused across models.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

/// Fluent builder for constructing a [`Trainer`].
///
/// Defaults:
/// - `max_epochs`: 1000
/// - `batching`: [`Batching::Full`]
/// - `log_every`: 10
#[derive(Debug, Clone, Default)]
pub struct TrainerBuilder {
    config: TrainerConfig,
}

impl TrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.config.max_epochs = epochs;
        self
    }

    pub fn batching(mut self, batching: Batching) -> Self {
        self.config.batching = batching;
        self
    }

    /// Shorthand for `batching(Batching::MiniBatch(size))`.
    pub fn batch_size(self, size: usize) -> Self {
        self.batching(Batching::MiniBatch(size))
    }

    /// Sets how often progress is logged at `info` level.
    ///
    /// `0` suppresses epoch-by-epoch progress. Useful for benchmarking.
    pub fn log_every(mut self, epochs: usize) -> Self {
        self.config.log_every = epochs;
        self
    }

    /// # Errors
    /// [`MlError::InvalidParameter`] for `Batching::MiniBatch(0)`.
    pub fn build(self) -> Result<Trainer> {
        self.config.validate()?;
        Ok(Trainer {
            config: self.config,
        })
    }
}

impl Trainer {
    /// Convenience constructor that starts the builder pattern.
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::new()
    }

    /// Validates and wraps an existing configuration.
    pub fn from_config(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Trains `model` on `dataset` for `max_epochs` epochs.
    ///
    /// For every batch the model goes through one full cycle:
    ///
    /// ```text
    /// pred = forward(X); loss = compute_loss(pred, y); backward(y); update();
    /// ```
    ///
    /// Call [`TrainableModel::into_fitted`] afterwards for inference.
    ///
    /// # Errors
    /// Propagates the first error raised by the model, e.g. a
    /// [`MlError::DimensionMismatch`] when the dataset's feature count does
    /// not match the model.
    pub fn fit<M>(&self, model: &mut M, dataset: &Dataset) -> Result<TrainingHistory>
    where
        M: TrainableModel,
    {
        let batch_size = self.config.batching.batch_size(dataset.len());
        let mut history = TrainingHistory {
            losses: Vec::with_capacity(self.config.max_epochs),
        };

        for epoch in 0..self.config.max_epochs {
            let mut total_loss = 0.0;
            let mut n_batches = 0usize;

            for batch in dataset.batches(batch_size) {
                let (batch_x, batch_y) = batch?;
                let preds = model.forward(&batch_x)?;
                total_loss += model.compute_loss(&preds, &batch_y)? + model.regularization_penalty();
                model.backward(&batch_y)?;
                model.update()?;
                n_batches += 1;
            }

            let avg_loss = total_loss / n_batches.max(1) as f64;
            debug!("epoch {}: loss = {}", epoch, avg_loss);
            if self.config.log_every > 0 && epoch % self.config.log_every == 0 {
                info!("Epoch {}: loss = {:.6}", epoch, avg_loss);
            }
            history.losses.push(avg_loss);
        }

        if let (Some(first), Some(last)) = (history.initial_loss(), history.final_loss()) {
            info!(
                "training finished after {} epochs: loss {:.6} -> {:.6}",
                history.epochs(),
                first,
                last
            );
        }
        Ok(history)
    }
}
