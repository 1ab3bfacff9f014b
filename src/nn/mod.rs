//! Feed-forward network, Adam optimizer and compute placement.

pub mod activation;
pub mod compute;
pub mod network;
pub mod optimizer;

pub use activation::ActivationType;
pub use compute::{ComputeProvider, CpuProvider, Device, ParallelProvider};
pub use network::{mse, mse_gradient, DenseLayer, ForwardPass, Gradients, Mlp, NetworkSpec};
pub use optimizer::{Adam, AdamConfig, AdamState};
