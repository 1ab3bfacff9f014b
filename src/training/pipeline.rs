use anyhow::{bail, Result};
use ndarray::{Array1, Array2};
use tracing::{debug, info};

use crate::data::{LabeledDataset, SplitFractions};
use crate::nn::{mse, mse_gradient, Adam, ComputeProvider, Mlp};
use crate::training::config::TrainingConfig;
use crate::training::types::{BestSoFar, Checkpoint, EpochObservation, TrainingOutcome};

/// One full-batch epoch.
///
/// Forward on the train and test splits, compare the test loss against the
/// carried best (capturing a checkpoint on strict improvement), then
/// backpropagate the train loss and apply one optimizer step. The test split
/// never contributes to the gradient.
pub fn train_step(
    network: &mut Mlp,
    optimizer: &mut Adam,
    provider: &dyn ComputeProvider,
    train: &LabeledDataset,
    test: &LabeledDataset,
    epoch: usize,
    best: BestSoFar,
) -> (EpochObservation, BestSoFar) {
    let pass = network.forward(&train.features, provider);
    let train_pred = pass.output();
    let train_loss = mse(&train_pred, &train.labels);
    let test_loss = mse(&network.predict(&test.features, provider), &test.labels);

    let best = if best.improves(test_loss) {
        debug!(
            epoch,
            test_loss,
            previous = best.loss,
            "test loss improved, capturing checkpoint"
        );
        best.record(Checkpoint::capture(network, optimizer, epoch, test_loss))
    } else {
        best
    };

    let grad = mse_gradient(&train_pred, &train.labels);
    let grads = network.backward(&pass, &grad, provider);
    optimizer.step(network, &grads);

    (
        EpochObservation {
            epoch,
            train_loss,
            test_loss,
        },
        best,
    )
}

/// Trains `network` on the train slice of `features`/`labels` and keeps the
/// snapshot with the lowest test loss below `config.loss_floor`.
///
/// The data is partitioned with [`SplitFractions::partition`] using both
/// fractions; the trailing validation slice is left untouched so the caller
/// can evaluate on exactly the rows training never saw.
///
/// `epoch_count` alone decides how many epochs run; `config.epochs` is not
/// read here. [`crate::run_experiment`] passes `config.epochs` through.
#[allow(clippy::too_many_arguments)]
pub fn train(
    network: &mut Mlp,
    epoch_count: usize,
    features: &Array2<f64>,
    labels: &Array1<f64>,
    test_fraction: f64,
    validation_fraction: f64,
    provider: &dyn ComputeProvider,
    config: &TrainingConfig,
) -> Result<TrainingOutcome> {
    if features.nrows() != labels.len() {
        bail!(
            "feature rows ({}) and labels ({}) differ in length",
            features.nrows(),
            labels.len()
        );
    }
    if features.ncols() != network.spec().input_width {
        bail!(
            "features have {} columns but the network expects {}",
            features.ncols(),
            network.spec().input_width
        );
    }

    let split = SplitFractions::new(test_fraction, validation_fraction)?;
    let partition = split.partition(labels.len());
    if partition.train.is_empty() || partition.test.is_empty() {
        bail!(
            "{} samples leave train={} test={} rows; both must be non-empty",
            labels.len(),
            partition.train.len(),
            partition.test.len()
        );
    }

    let data = LabeledDataset {
        features: features.clone(),
        labels: labels.clone(),
    };
    let train_set = data.slice(partition.train.clone());
    let test_set = data.slice(partition.test.clone());

    info!(
        device = provider.name(),
        train = train_set.len(),
        test = test_set.len(),
        validation = partition.validation.len(),
        parameters = network.parameter_count(),
        epochs = epoch_count,
        "starting training"
    );

    let mut optimizer = Adam::new(config.optimizer, network);
    let mut progress = Vec::new();
    let mut last = None;

    let best = (0..epoch_count).fold(BestSoFar::floor(config.loss_floor), |best, epoch| {
        let (observation, best) = train_step(
            &mut *network,
            &mut optimizer,
            provider,
            &train_set,
            &test_set,
            epoch,
            best,
        );
        if config.log_every > 0 && epoch % config.log_every == 0 {
            info!(
                epoch,
                train_loss = observation.train_loss,
                "training progress"
            );
            progress.push(observation);
        }
        last = Some(observation);
        best
    });

    match &best.checkpoint {
        Some(checkpoint) => info!(
            best_test_loss = best.loss,
            epoch = checkpoint.epoch(),
            "training finished"
        ),
        None => info!(
            loss_floor = config.loss_floor,
            "training finished without beating the loss floor"
        ),
    }

    Ok(TrainingOutcome {
        best_test_loss: best.loss,
        checkpoint: best.checkpoint,
        progress,
        last,
    })
}
