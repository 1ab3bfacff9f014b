//! Hidden-layer activation functions.

use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ActivationType {
    #[default]
    ReLU,
    Tanh,
    Sigmoid,
}

impl ActivationType {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Tanh => x.tanh(),
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            ActivationType::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationType::Tanh => 1.0 - x.tanh().powi(2),
            ActivationType::Sigmoid => {
                let s = self.apply(x);
                s * (1.0 - s)
            }
        }
    }

    pub fn forward(self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| self.apply(v))
    }

    pub fn backward(self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| self.derivative(v))
    }
}
