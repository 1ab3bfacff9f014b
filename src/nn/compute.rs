//! Placement of the dense linear algebra used by the network.
//!
//! The training algorithm only ever talks to a [`ComputeProvider`]; which
//! implementation backs it is decided once, when the [`Device`] is resolved.

use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;
use std::ops::Range;
use tracing::debug;

/// Rows per block handed to a rayon worker.
pub const DEFAULT_CHUNK_ROWS: usize = 2048;

/// Tensor compute capability required by forward and backward passes.
pub trait ComputeProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Matrix product `a · b`.
    fn matmul(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64>;

    /// Transposed-left product `aᵀ · b`, the shape of every weight gradient.
    fn matmul_tn(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64>;
}

/// Sequential execution on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuProvider;

impl ComputeProvider for CpuProvider {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        a.dot(&b)
    }

    fn matmul_tn(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        a.t().dot(&b)
    }
}

/// Row-blocked execution across the rayon thread pool.
///
/// Block boundaries depend only on `chunk_rows`, never on the number of
/// threads, and partial sums are combined in block order, so repeated runs
/// produce identical results.
#[derive(Debug, Clone, Copy)]
pub struct ParallelProvider {
    chunk_rows: usize,
}

impl Default for ParallelProvider {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_ROWS)
    }
}

impl ParallelProvider {
    pub fn new(chunk_rows: usize) -> Self {
        Self {
            chunk_rows: chunk_rows.max(1),
        }
    }

    fn blocks(&self, rows: usize) -> Vec<Range<usize>> {
        (0..rows)
            .step_by(self.chunk_rows)
            .map(|start| start..(start + self.chunk_rows).min(rows))
            .collect()
    }
}

impl ComputeProvider for ParallelProvider {
    fn name(&self) -> &str {
        "parallel"
    }

    fn matmul(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        if a.nrows() <= self.chunk_rows {
            return a.dot(&b);
        }
        let blocks = self.blocks(a.nrows());
        let products: Vec<Array2<f64>> = blocks
            .par_iter()
            .map(|rows| a.slice(s![rows.clone(), ..]).dot(&b))
            .collect();

        let mut out = Array2::zeros((a.nrows(), b.ncols()));
        for (rows, block) in blocks.into_iter().zip(products) {
            out.slice_mut(s![rows, ..]).assign(&block);
        }
        out
    }

    fn matmul_tn(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        if a.nrows() <= self.chunk_rows {
            return a.t().dot(&b);
        }
        let partials: Vec<Array2<f64>> = self
            .blocks(a.nrows())
            .into_par_iter()
            .map(|rows| {
                a.slice(s![rows.clone(), ..])
                    .reversed_axes()
                    .dot(&b.slice(s![rows, ..]))
            })
            .collect();

        let mut out = Array2::zeros((a.ncols(), b.ncols()));
        for partial in &partials {
            out += partial;
        }
        out
    }
}

/// Requested execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Device {
    /// Parallel when more than one hardware thread is available, CPU otherwise.
    ///
    /// The two providers sum in a different order, so their results agree to
    /// floating-point tolerance but not bit for bit. An `Auto` run repeats
    /// exactly on the same machine; across machines with different thread
    /// availability, pin `Cpu` or `Parallel` for identical output.
    #[default]
    Auto,
    Cpu,
    Parallel,
}

impl Device {
    /// Resolves the device into a provider. Never fails: an unavailable
    /// parallel target falls back to the sequential CPU provider.
    pub fn provider(self) -> Box<dyn ComputeProvider> {
        match self {
            Device::Cpu => Box::new(CpuProvider),
            Device::Parallel => Box::new(ParallelProvider::default()),
            Device::Auto => {
                let threads = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                if threads > 1 {
                    Box::new(ParallelProvider::default())
                } else {
                    debug!(threads, "parallel execution unavailable, using cpu");
                    Box::new(CpuProvider)
                }
            }
        }
    }
}
