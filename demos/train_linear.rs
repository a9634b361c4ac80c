//! Linear regression end to end: data, training, metrics and inference.
//!
//! Run with: RUST_LOG=info cargo run --example train_linear
//!
//! Add `--features serde` to also print the trainer config and fitted
//! parameters as JSON.

use log::info;
use matlearn::{
    dataset::Dataset,
    loss::{create_loss, LossKind},
    matrix::Matrix,
    metrics::{create_metric, Metric, MetricKind},
    model::{linear::LinearRegression, InferenceModel, TrainableModel},
    optimizer::{create_optimizer, OptimizerKind},
    regularizers::{create_regularizer, RegularizerKind},
    trainer::{Batching, Trainer},
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // y = 2*x1 + 3*x2 + 1 with a little deterministic noise
    let x: Vec<Vec<f64>> = (0..20)
        .map(|i| vec![i as f64 / 10.0, ((i * 7) % 20) as f64 / 10.0])
        .collect();
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, row)| 2.0 * row[0] + 3.0 * row[1] + 1.0 + if i % 2 == 0 { 0.05 } else { -0.05 })
        .collect();
    let dataset = Dataset::from_rows(x, y)?;
    info!(
        "dataset: {} samples, {} features",
        dataset.len(),
        dataset.n_features()
    );

    info!("feature matrix rank: {}", dataset.features().rank());

    let mut model = LinearRegression::new(
        dataset.n_features(),
        create_loss(LossKind::Mse),
        create_optimizer(OptimizerKind::MiniBatch, 0.05),
        create_regularizer(RegularizerKind::L2, 0.001)?,
    );

    let trainer = Trainer::builder()
        .batching(Batching::MiniBatch(5))
        .max_epochs(200)
        .log_every(50)
        .build()?;

    #[cfg(feature = "serde")]
    println!("config: {}", serde_json::to_string(trainer.config())?);

    let history = trainer.fit(&mut model, &dataset)?;
    println!(
        "loss: {:.4} -> {:.6} over {} epochs",
        history.initial_loss().unwrap_or(f64::NAN),
        history.final_loss().unwrap_or(f64::NAN),
        history.epochs()
    );

    let fitted = model.into_fitted();
    println!("weights:\n{}", fitted.weights());
    println!("bias:\n{}", fitted.bias());

    let predictions = fitted.predict(dataset.features())?;
    for kind in [MetricKind::R2, MetricKind::Rmse, MetricKind::Mae] {
        if let Some(metric) = create_metric(kind) {
            println!(
                "{}: {:.4}",
                metric.name(),
                metric.compute(dataset.targets(), &predictions)?
            );
        }
    }

    let new_points = Matrix::from_rows(vec![vec![0.5, 0.5], vec![3.0, 1.0]])?;
    let new_preds = fitted.predict(&new_points)?;
    println!("predictions for new points:\n{}", new_preds);

    #[cfg(feature = "serde")]
    println!("fitted: {}", serde_json::to_string(fitted.params())?);

    Ok(())
}
