//! Adam optimizer with an explicit, clonable state so it can be checkpointed
//! alongside the network parameters.

use anyhow::{bail, Result};
use ndarray::{Array, Array1, Array2, Dimension, Zip};

use super::network::{Gradients, Mlp};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// First and second moment estimates per parameter tensor plus the step count.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamState {
    pub step: u64,
    pub m_weights: Vec<Array2<f64>>,
    pub v_weights: Vec<Array2<f64>>,
    pub m_biases: Vec<Array1<f64>>,
    pub v_biases: Vec<Array1<f64>>,
}

impl AdamState {
    fn zeros_like(network: &Mlp) -> Self {
        let m_weights: Vec<_> = network
            .layers()
            .iter()
            .map(|l| Array2::zeros(l.weights.dim()))
            .collect();
        let m_biases: Vec<_> = network
            .layers()
            .iter()
            .map(|l| Array1::zeros(l.biases.len()))
            .collect();
        Self {
            step: 0,
            v_weights: m_weights.clone(),
            v_biases: m_biases.clone(),
            m_weights,
            m_biases,
        }
    }

    fn matches(&self, network: &Mlp) -> bool {
        let layers = network.layers();
        self.m_weights.len() == layers.len()
            && self.v_weights.len() == layers.len()
            && self.m_biases.len() == layers.len()
            && self.v_biases.len() == layers.len()
            && layers.iter().enumerate().all(|(i, l)| {
                self.m_weights[i].dim() == l.weights.dim()
                    && self.v_weights[i].dim() == l.weights.dim()
                    && self.m_biases[i].len() == l.biases.len()
                    && self.v_biases[i].len() == l.biases.len()
            })
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    state: AdamState,
}

impl Adam {
    /// Fresh optimizer with zeroed moments sized for `network`.
    pub fn new(config: AdamConfig, network: &Mlp) -> Self {
        Self {
            config,
            state: AdamState::zeros_like(network),
        }
    }

    /// Resumes from a previously captured state.
    pub fn from_state(config: AdamConfig, state: AdamState, network: &Mlp) -> Result<Self> {
        if !state.matches(network) {
            bail!("optimizer state does not match the network architecture");
        }
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    pub fn state(&self) -> &AdamState {
        &self.state
    }

    /// Applies one bias-corrected Adam update to every parameter of `network`.
    pub fn step(&mut self, network: &mut Mlp, grads: &Gradients) {
        self.state.step += 1;
        let t = self.state.step as i32;
        let bc1 = 1.0 - self.config.beta1.powi(t);
        let bc2 = 1.0 - self.config.beta2.powi(t);
        let cfg = self.config;

        for (i, layer) in network.layers_mut().iter_mut().enumerate() {
            update(
                &mut layer.weights,
                &grads.weights[i],
                &mut self.state.m_weights[i],
                &mut self.state.v_weights[i],
                &cfg,
                bc1,
                bc2,
            );
            update(
                &mut layer.biases,
                &grads.biases[i],
                &mut self.state.m_biases[i],
                &mut self.state.v_biases[i],
                &cfg,
                bc1,
                bc2,
            );
        }
    }
}

fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    cfg: &AdamConfig,
    bc1: f64,
    bc2: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = cfg.beta1 * *m + (1.0 - cfg.beta1) * g;
            *v = cfg.beta2 * *v + (1.0 - cfg.beta2) * g * g;
            let m_hat = *m / bc1;
            let v_hat = *v / bc2;
            *p -= cfg.learning_rate * m_hat / (v_hat.sqrt() + cfg.epsilon);
        });
}
