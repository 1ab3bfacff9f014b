//! Fully-connected regression network.
//!
//! `depth` hidden layers of `width` neurons share one activation; the output
//! layer is a single linear neuron. Weights are stored `(fan_in, fan_out)` so
//! a forward step is `z = a · W + b`.

use anyhow::{bail, Result};
use ndarray::{Array1, Array2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use super::activation::ActivationType;
use super::compute::ComputeProvider;
use crate::data::FEATURE_COUNT;

/// Architecture of an [`Mlp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkSpec {
    pub input_width: usize,
    /// Neurons per hidden layer
    pub width: usize,
    /// Number of hidden layers
    pub depth: usize,
    pub activation: ActivationType,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        Self {
            input_width: FEATURE_COUNT,
            width: 100,
            depth: 4,
            activation: ActivationType::ReLU,
        }
    }
}

impl NetworkSpec {
    pub fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.width == 0 {
            bail!(
                "network widths must be positive (input={}, hidden={})",
                self.input_width,
                self.width
            );
        }
        Ok(())
    }

    /// `(fan_in, fan_out)` of every layer, output layer last.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        let mut shapes = Vec::with_capacity(self.depth + 1);
        let mut fan_in = self.input_width;
        for _ in 0..self.depth {
            shapes.push((fan_in, self.width));
            fan_in = self.width;
        }
        shapes.push((fan_in, 1));
        shapes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

impl DenseLayer {
    /// Uniform initialisation on `(-1/sqrt(fan_in), 1/sqrt(fan_in))` for both
    /// weights and biases.
    fn init<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (fan_in as f64).sqrt();
        let dist = Uniform::new(-bound, bound);
        let weights = Array2::from_shape_simple_fn((fan_in, fan_out), || dist.sample(rng));
        let biases = Array1::from_shape_simple_fn(fan_out, || dist.sample(rng));
        Self { weights, biases }
    }
}

/// Intermediate values of a forward pass kept for backpropagation.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Input to each layer; `inputs[0]` is the feature batch.
    pub inputs: Vec<Array2<f64>>,
    /// Pre-activation of each layer.
    pub pre_activations: Vec<Array2<f64>>,
}

impl ForwardPass {
    /// Network output as a column vector.
    pub fn output(&self) -> Array1<f64> {
        self.pre_activations
            .last()
            .map(|z| z.column(0).to_owned())
            .unwrap_or_else(|| Array1::zeros(0))
    }
}

/// Parameter gradients, indexed like [`Mlp::layers`].
#[derive(Debug, Clone)]
pub struct Gradients {
    pub weights: Vec<Array2<f64>>,
    pub biases: Vec<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    spec: NetworkSpec,
    layers: Vec<DenseLayer>,
}

impl Mlp {
    pub fn new<R: Rng + ?Sized>(spec: NetworkSpec, rng: &mut R) -> Result<Self> {
        spec.validate()?;
        let layers = spec
            .layer_shapes()
            .into_iter()
            .map(|(fan_in, fan_out)| DenseLayer::init(fan_in, fan_out, rng))
            .collect();
        Ok(Self { spec, layers })
    }

    /// Rebuilds a network from stored parameters, checking every shape against `spec`.
    pub fn from_layers(spec: NetworkSpec, layers: Vec<DenseLayer>) -> Result<Self> {
        spec.validate()?;
        let shapes = spec.layer_shapes();
        if shapes.len() != layers.len() {
            bail!(
                "expected {} layers for width={} depth={}, got {}",
                shapes.len(),
                spec.width,
                spec.depth,
                layers.len()
            );
        }
        for (i, ((fan_in, fan_out), layer)) in shapes.iter().zip(&layers).enumerate() {
            if layer.weights.dim() != (*fan_in, *fan_out) || layer.biases.len() != *fan_out {
                bail!(
                    "layer {} has weights {:?} and {} biases, expected ({}, {})",
                    i,
                    layer.weights.dim(),
                    layer.biases.len(),
                    fan_in,
                    fan_out
                );
            }
        }
        Ok(Self { spec, layers })
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    fn activation_for(&self, layer: usize) -> Option<ActivationType> {
        (layer + 1 < self.layers.len()).then_some(self.spec.activation)
    }

    /// Forward pass keeping every intermediate needed by [`Mlp::backward`].
    pub fn forward(&self, features: &Array2<f64>, provider: &dyn ComputeProvider) -> ForwardPass {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut a = features.clone();

        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = provider.matmul(a.view(), layer.weights.view());
            z += &layer.biases;
            let next = match self.activation_for(i) {
                Some(act) => act.forward(&z),
                None => z.clone(),
            };
            inputs.push(a);
            pre_activations.push(z);
            a = next;
        }

        ForwardPass {
            inputs,
            pre_activations,
        }
    }

    /// Predictions only, without retaining intermediates.
    pub fn predict(&self, features: &Array2<f64>, provider: &dyn ComputeProvider) -> Array1<f64> {
        let mut a = features.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = provider.matmul(a.view(), layer.weights.view());
            z += &layer.biases;
            a = match self.activation_for(i) {
                Some(act) => act.forward(&z),
                None => z,
            };
        }
        a.column(0).to_owned()
    }

    /// Backpropagates `d_output` (loss gradient w.r.t. the output column).
    pub fn backward(
        &self,
        pass: &ForwardPass,
        d_output: &Array1<f64>,
        provider: &dyn ComputeProvider,
    ) -> Gradients {
        let n_layers = self.layers.len();
        let mut weights = Vec::with_capacity(n_layers);
        let mut biases = Vec::with_capacity(n_layers);
        let mut delta = d_output.clone().insert_axis(Axis(1));

        for i in (0..n_layers).rev() {
            let dz = match self.activation_for(i) {
                Some(act) => delta * act.backward(&pass.pre_activations[i]),
                None => delta,
            };
            weights.push(provider.matmul_tn(pass.inputs[i].view(), dz.view()));
            biases.push(dz.sum_axis(Axis(0)));
            delta = if i > 0 {
                provider.matmul(dz.view(), self.layers[i].weights.t())
            } else {
                dz
            };
        }

        weights.reverse();
        biases.reverse();
        Gradients { weights, biases }
    }
}

/// Mean squared error.
pub fn mse(predictions: &Array1<f64>, targets: &Array1<f64>) -> f64 {
    let diff = predictions - targets;
    diff.mapv(|d| d * d).mean().unwrap_or(f64::NAN)
}

/// Gradient of [`mse`] with respect to `predictions`.
pub fn mse_gradient(predictions: &Array1<f64>, targets: &Array1<f64>) -> Array1<f64> {
    let n = predictions.len().max(1) as f64;
    (predictions - targets) * (2.0 / n)
}
