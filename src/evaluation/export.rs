use anyhow::{bail, Context, Result};
use ndarray::Array1;
use std::path::Path;

use crate::data::sampling::{DIV, RATE, SIGMA, SPOT, TIME};
use crate::data::LabeledDataset;

const HEADER: [&str; 8] = [
    "spot",
    "time",
    "sigma",
    "rate",
    "div",
    "bsm_price",
    "nn_price",
    "error",
];

/// Writes one CSV row per validation sample: the five features, the reference
/// price, the network price and their difference.
pub fn write_validation_csv(
    path: impl AsRef<Path>,
    data: &LabeledDataset,
    predictions: &Array1<f64>,
) -> Result<()> {
    if predictions.len() != data.len() {
        bail!(
            "{} predictions for {} validation rows",
            predictions.len(),
            data.len()
        );
    }
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(HEADER)?;

    for ((row, label), prediction) in data
        .features
        .rows()
        .into_iter()
        .zip(data.labels.iter())
        .zip(predictions.iter())
    {
        let record = [
            row[SPOT],
            row[TIME],
            row[SIGMA],
            row[RATE],
            row[DIV],
            *label,
            *prediction,
            prediction - label,
        ];
        writer.write_record(record.iter().map(|v| v.to_string()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
