//! # Surrogate-Lib: Neural Approximation of Black-Scholes-Merton Put Prices
//!
//! `surrogate-lib` trains a small feed-forward network to reproduce the
//! closed-form Black-Scholes-Merton price of a European put over a
//! five-dimensional input domain (spot, maturity, volatility, rate, dividend
//! yield), and measures how closely the network tracks the formula on data it
//! never saw.
//!
//! ## Core Features
//!
//! - **Reference Pricer**: closed-form BSM put and call prices
//! - **Seeded Sampling**: uniform i.i.d. samples with a reproducible three-way split
//! - **Approximator Trainer**: full-batch Adam with best-checkpoint selection
//!   against a loss floor
//! - **Validation**: error statistics, SVG histogram and CSV export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use surrogate_lib::{default_configs, run_experiment};
//!
//! let config = default_configs::minimal();
//! let result = run_experiment(&config)?;
//!
//! println!("best test loss: {:.3e}", result.training.best_test_loss);
//! println!("mean error:     {:.3e}", result.report.mean_error);
//! println!("std error:      {:.3e}", result.report.std_error);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Configuration Presets
//!
//! - `notebook()`: the reference run (100k samples, 4 x 100 network, 6000 epochs)
//! - `fast()`: reduced problem for development
//! - `minimal()`: seconds-long smoke run

// ================================================================================================
// MODULES
// ================================================================================================

pub mod data;
pub mod evaluation;
pub mod models;
pub mod nn;
pub mod training;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use data::generate_dataset;
use evaluation::validate;
use training::train;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Sampling and dataset types
pub use data::{DomainConfig, LabeledDataset, Partition, SplitFractions};

// Reference pricer
pub use models::bs::{bs_call_price, bs_put_price, put_prices};

// Network, optimizer and compute placement
pub use nn::{
    ActivationType, Adam, AdamConfig, ComputeProvider, CpuProvider, Device, Mlp, NetworkSpec,
    ParallelProvider,
};

// Training and configuration
pub use training::{
    Checkpoint, EpochObservation, ExperimentConfig, TrainingConfig, TrainingOutcome,
    DEFAULT_LOSS_FLOOR,
};

// Validation output
pub use evaluation::{render_error_histogram, write_validation_csv, ValidationReport};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured experiment settings.
///
/// # Available Configurations
///
/// - [`notebook()`]: the reference run and its accuracy target
/// - [`fast()`]: development-sized run
/// - [`minimal()`]: smoke-test run
pub mod default_configs {
    use crate::training::config::ExperimentConfig;

    /// Reference configuration.
    ///
    /// **Characteristics:**
    /// - 100,000 samples, seed 314, 70/20/10 split
    /// - 4 hidden layers of 100 ReLU neurons
    /// - 6,000 full-batch Adam epochs at learning rate 1e-3
    /// - Expected mean absolute validation error around 1e-3
    ///
    /// Expect a long run on a single machine.
    ///
    /// # Example
    ///
    /// ```rust
    /// use surrogate_lib::default_configs;
    ///
    /// let config = default_configs::notebook();
    /// assert_eq!(config.seed, 314);
    /// ```
    pub fn notebook() -> ExperimentConfig {
        ExperimentConfig::notebook()
    }

    /// Development configuration.
    ///
    /// **Characteristics:**
    /// - 10,000 samples
    /// - 3 hidden layers of 50 neurons
    /// - 2,000 epochs at learning rate 3e-3
    pub fn fast() -> ExperimentConfig {
        ExperimentConfig::fast()
    }

    /// Smoke-test configuration.
    ///
    /// **Characteristics:**
    /// - 2,000 samples
    /// - 2 hidden layers of 32 neurons
    /// - 500 epochs at learning rate 5e-3, sequential CPU
    pub fn minimal() -> ExperimentConfig {
        ExperimentConfig::minimal()
    }
}

/// Everything produced by [`run_experiment`].
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub training: TrainingOutcome,
    /// Best checkpoint, restored for validation
    pub checkpoint: Checkpoint,
    /// Held-out validation slice
    pub validation: LabeledDataset,
    pub report: ValidationReport,
}

/// Runs the full flow: sample and label, train, restore the best checkpoint
/// into a fresh network and validate it on the held-out tail.
///
/// A single `StdRng` seeded with `config.seed` draws the samples first and the
/// initial weights second, so the whole run is reproducible.
///
/// # Errors
///
/// * invalid configuration (fractions, widths, learning rate)
/// * the test loss never drops below `config.training.loss_floor`, so there
///   is no checkpoint to validate
/// * the validation slice is empty
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentResult> {
    config.validate()?;
    let provider = config.device.provider();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let data = generate_dataset(&config.domain, config.n_samples, &mut rng);
    let mut network = Mlp::new(config.network, &mut rng)?;

    let training = train(
        &mut network,
        config.training.epochs,
        &data.features,
        &data.labels,
        config.split.test,
        config.split.validation,
        provider.as_ref(),
        &config.training,
    )?;

    let checkpoint = training.checkpoint.clone().ok_or_else(|| {
        anyhow!(
            "test loss never dropped below the floor {:e}; no checkpoint to validate",
            config.training.loss_floor
        )
    })?;

    let partition = config.split.partition(data.len());
    let validation = data.slice(partition.validation);
    let report = validate(&checkpoint, &validation, provider.as_ref())?;

    info!(
        samples = report.count,
        mean_error = report.mean_error,
        std_error = report.std_error,
        mean_abs_error = report.mean_abs_error,
        "validation finished"
    );

    Ok(ExperimentResult {
        training,
        checkpoint,
        validation,
        report,
    })
}
