use anyhow::{bail, Result};
use ndarray::Array1;
use statrs::statistics::Statistics;

use crate::data::LabeledDataset;
use crate::nn::ComputeProvider;
use crate::training::Checkpoint;

/// Error statistics of a network on held-out data (error = prediction - label).
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub count: usize,
    pub mean_error: f64,
    /// Population standard deviation of the errors
    pub std_error: f64,
    pub mean_abs_error: f64,
    pub max_abs_error: f64,
    pub rmse: f64,
    pub predictions: Array1<f64>,
    pub errors: Array1<f64>,
}

impl ValidationReport {
    pub fn from_predictions(predictions: Array1<f64>, labels: &Array1<f64>) -> Result<Self> {
        if predictions.len() != labels.len() {
            bail!(
                "{} predictions for {} labels",
                predictions.len(),
                labels.len()
            );
        }
        if labels.is_empty() {
            bail!("cannot validate on an empty dataset");
        }

        let errors = &predictions - labels;
        let mean_error = errors.iter().mean();
        let std_error = errors.iter().population_std_dev();
        let mean_abs_error = errors.iter().map(|e| e.abs()).mean();
        let max_abs_error = errors.iter().abs_max();
        let rmse = errors.iter().map(|e| e * e).mean().sqrt();

        Ok(Self {
            count: labels.len(),
            mean_error,
            std_error,
            mean_abs_error,
            max_abs_error,
            rmse,
            predictions,
            errors,
        })
    }
}

/// Restores `checkpoint` into a fresh network and measures it on `data`.
pub fn validate(
    checkpoint: &Checkpoint,
    data: &LabeledDataset,
    provider: &dyn ComputeProvider,
) -> Result<ValidationReport> {
    let network = checkpoint.restore_network()?;
    let predictions = network.predict(&data.features, provider);
    ValidationReport::from_predictions(predictions, &data.labels)
}
