use anyhow::Result;

use crate::nn::{Adam, AdamConfig, AdamState, DenseLayer, Mlp, NetworkSpec};

/// Snapshot of the network and optimizer taken at the best test loss seen.
///
/// The parameters are those that produced `test_loss`, i.e. the state before
/// that epoch's optimizer step.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    spec: NetworkSpec,
    epoch: usize,
    test_loss: f64,
    layers: Vec<DenseLayer>,
    optimizer_config: AdamConfig,
    optimizer_state: AdamState,
}

impl Checkpoint {
    pub fn capture(network: &Mlp, optimizer: &Adam, epoch: usize, test_loss: f64) -> Self {
        Self {
            spec: *network.spec(),
            epoch,
            test_loss,
            layers: network.layers().to_vec(),
            optimizer_config: *optimizer.config(),
            optimizer_state: optimizer.state().clone(),
        }
    }

    /// Hidden layer width
    pub fn width(&self) -> usize {
        self.spec.width
    }

    /// Number of hidden layers
    pub fn depth(&self) -> usize {
        self.spec.depth
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn test_loss(&self) -> f64 {
        self.test_loss
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn optimizer_state(&self) -> &AdamState {
        &self.optimizer_state
    }

    /// Fresh network with the same architecture and the captured parameters.
    pub fn restore_network(&self) -> Result<Mlp> {
        Mlp::from_layers(self.spec, self.layers.clone())
    }

    /// Optimizer resumed from the captured moments, for continuing training.
    pub fn restore_optimizer(&self, network: &Mlp) -> Result<Adam> {
        Adam::from_state(self.optimizer_config, self.optimizer_state.clone(), network)
    }
}

/// Losses observed in one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochObservation {
    pub epoch: usize,
    pub train_loss: f64,
    pub test_loss: f64,
}

/// Best test loss carried through the epoch fold together with its checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSoFar {
    pub loss: f64,
    pub checkpoint: Option<Checkpoint>,
}

impl BestSoFar {
    /// Starting point: nothing captured, the floor as the value to beat.
    pub fn floor(loss_floor: f64) -> Self {
        Self {
            loss: loss_floor,
            checkpoint: None,
        }
    }

    /// Strict improvement only; NaN never improves.
    pub fn improves(&self, test_loss: f64) -> bool {
        test_loss < self.loss
    }

    pub fn record(self, checkpoint: Checkpoint) -> Self {
        Self {
            loss: checkpoint.test_loss,
            checkpoint: Some(checkpoint),
        }
    }
}

/// Result of [`train`](crate::training::pipeline::train).
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Best test loss reached, or the floor when it was never beaten
    pub best_test_loss: f64,
    /// `None` when the floor was never beaten
    pub checkpoint: Option<Checkpoint>,
    /// Periodic progress observations
    pub progress: Vec<EpochObservation>,
    /// Losses of the last epoch run
    pub last: Option<EpochObservation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn checkpoint_with_loss(loss: f64) -> Checkpoint {
        let spec = NetworkSpec {
            width: 3,
            depth: 1,
            ..NetworkSpec::default()
        };
        let network = Mlp::new(spec, &mut StdRng::seed_from_u64(0)).unwrap();
        let adam = Adam::new(AdamConfig::default(), &network);
        Checkpoint::capture(&network, &adam, 12, loss)
    }

    #[test]
    fn test_floor_is_the_value_to_beat() {
        let best = BestSoFar::floor(0.01);
        assert!(!best.improves(0.01));
        assert!(!best.improves(0.5));
        assert!(!best.improves(f64::NAN));
        assert!(best.improves(0.009));
        assert!(best.checkpoint.is_none());
    }

    #[test]
    fn test_record_replaces_value_and_checkpoint() {
        let best = BestSoFar::floor(0.01).record(checkpoint_with_loss(0.004));
        assert_eq!(best.loss, 0.004);
        assert!(!best.improves(0.004));
        assert!(best.improves(0.003));

        let best = best.record(checkpoint_with_loss(0.002));
        assert_eq!(best.checkpoint.as_ref().map(|c| c.test_loss()), Some(0.002));
    }

    #[test]
    fn test_checkpoint_restores_structurally_identical_network() {
        let checkpoint = checkpoint_with_loss(0.001);
        assert_eq!(checkpoint.width(), 3);
        assert_eq!(checkpoint.depth(), 1);
        assert_eq!(checkpoint.epoch(), 12);

        let network = checkpoint.restore_network().unwrap();
        assert_eq!(network.layers(), checkpoint.layers());
        let adam = checkpoint.restore_optimizer(&network).unwrap();
        assert_eq!(adam.state(), checkpoint.optimizer_state());
    }
}
