use anyhow::{bail, Result};

use crate::data::{DomainConfig, SplitFractions};
use crate::nn::{AdamConfig, Device, NetworkSpec};

/// Initial "best" test loss. A checkpoint is only recorded once the test loss
/// drops strictly below this value.
pub const DEFAULT_LOSS_FLOOR: f64 = 1e-2;

/// Settings of the epoch loop
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingConfig {
    /// Epoch count [`crate::run_experiment`] hands to the trainer
    #[cfg_attr(feature = "serde", serde(default = "default_epochs"))]
    pub epochs: usize,

    #[cfg_attr(feature = "serde", serde(default))]
    pub optimizer: AdamConfig,

    /// Test loss that must be beaten before any checkpoint is kept
    #[cfg_attr(feature = "serde", serde(default = "default_loss_floor"))]
    pub loss_floor: f64,

    /// Emit a progress observation every `log_every` epochs (0 = never)
    #[cfg_attr(feature = "serde", serde(default = "default_log_every"))]
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            optimizer: AdamConfig::default(),
            loss_floor: default_loss_floor(),
            log_every: default_log_every(),
        }
    }
}

/// Everything needed to reproduce one sample -> train -> validate run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub domain: DomainConfig,

    #[cfg_attr(feature = "serde", serde(default = "default_n_samples"))]
    pub n_samples: usize,

    /// Seeds both sampling and weight initialisation
    #[cfg_attr(feature = "serde", serde(default = "default_seed"))]
    pub seed: u64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub split: SplitFractions,

    #[cfg_attr(feature = "serde", serde(default))]
    pub network: NetworkSpec,

    #[cfg_attr(feature = "serde", serde(default))]
    pub training: TrainingConfig,

    #[cfg_attr(feature = "serde", serde(default))]
    pub device: Device,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::notebook()
    }
}

impl ExperimentConfig {
    /// The reference run: 100k samples, seed 314, 4 x 100 ReLU network,
    /// 6000 full-batch Adam epochs.
    pub fn notebook() -> Self {
        Self {
            domain: DomainConfig::default(),
            n_samples: default_n_samples(),
            seed: default_seed(),
            split: SplitFractions::default(),
            network: NetworkSpec::default(),
            training: TrainingConfig::default(),
            device: Device::Auto,
        }
    }

    /// Smaller problem for development: minutes instead of hours.
    pub fn fast() -> Self {
        Self {
            n_samples: 10_000,
            network: NetworkSpec {
                width: 50,
                depth: 3,
                ..NetworkSpec::default()
            },
            training: TrainingConfig {
                epochs: 2_000,
                optimizer: AdamConfig {
                    learning_rate: 3e-3,
                    ..AdamConfig::default()
                },
                ..TrainingConfig::default()
            },
            ..Self::notebook()
        }
    }

    /// Seconds-long run for smoke tests.
    pub fn minimal() -> Self {
        Self {
            n_samples: 2_000,
            network: NetworkSpec {
                width: 32,
                depth: 2,
                ..NetworkSpec::default()
            },
            training: TrainingConfig {
                epochs: 500,
                optimizer: AdamConfig {
                    learning_rate: 5e-3,
                    ..AdamConfig::default()
                },
                log_every: 50,
                ..TrainingConfig::default()
            },
            device: Device::Cpu,
            ..Self::notebook()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.network.validate()?;
        if self.n_samples == 0 {
            bail!("n_samples must be positive");
        }
        let lr = self.training.optimizer.learning_rate;
        if !(lr.is_finite() && lr > 0.0) {
            bail!("learning rate must be finite and > 0, got {}", lr);
        }
        Ok(())
    }

    /// Parses a TOML document; omitted keys take the notebook defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        use anyhow::Context;
        let config: Self = toml::from_str(text).context("invalid experiment config")?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

fn default_epochs() -> usize {
    6000
}

fn default_loss_floor() -> f64 {
    DEFAULT_LOSS_FLOOR
}

fn default_log_every() -> usize {
    100
}

fn default_n_samples() -> usize {
    100_000
}

fn default_seed() -> u64 {
    314
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_defaults() {
        let config = ExperimentConfig::notebook();
        assert_eq!(config.n_samples, 100_000);
        assert_eq!(config.seed, 314);
        assert_eq!(config.network.width, 100);
        assert_eq!(config.network.depth, 4);
        assert_eq!(config.training.epochs, 6000);
        assert_eq!(config.training.loss_floor, DEFAULT_LOSS_FLOOR);
        assert_eq!(config.training.log_every, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [
            ExperimentConfig::notebook(),
            ExperimentConfig::fast(),
            ExperimentConfig::minimal(),
        ] {
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_invalid_learning_rate_rejected() {
        let mut config = ExperimentConfig::minimal();
        config.training.optimizer.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        use crate::nn::ActivationType;

        let text = r#"
            seed = 7
            n_samples = 500
            device = "cpu"

            [network]
            width = 16
            activation = "tanh"

            [training]
            epochs = 20
            loss_floor = 0.5

            [training.optimizer]
            learning_rate = 0.01

            [domain]
            spot = [0.8, 1.2]
        "#;
        let config = ExperimentConfig::from_toml_str(text).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_samples, 500);
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.network.width, 16);
        assert_eq!(config.network.depth, 4);
        assert_eq!(config.network.activation, ActivationType::Tanh);
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.loss_floor, 0.5);
        assert_eq!(config.training.log_every, 100);
        assert_eq!(config.training.optimizer.learning_rate, 0.01);
        assert_eq!(config.training.optimizer.beta2, 0.999);
        assert_eq!(config.domain.spot, (0.8, 1.2));
        assert_eq!(config.domain.time, (0.0, 3.0));
        assert_eq!(config.split, SplitFractions::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_invalid_toml_split_rejected() {
        let text = r#"
            [split]
            test = 0.6
            validation = 0.5
        "#;
        assert!(ExperimentConfig::from_toml_str(text).is_err());
    }
}
