pub mod config;
pub mod pipeline;
pub mod types;

pub use config::{ExperimentConfig, TrainingConfig, DEFAULT_LOSS_FLOOR};
pub use pipeline::{train, train_step};
pub use types::{BestSoFar, Checkpoint, EpochObservation, TrainingOutcome};
