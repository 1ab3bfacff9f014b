use anyhow::{bail, Result};
use std::ops::Range;

/// Test and validation shares of a dataset; the training share is the remainder.
///
/// The same fractions are used by the caller that reserves the validation tail
/// and by the trainer that splits the rest, so all three partitions come from
/// one calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SplitFractions {
    pub test: f64,
    pub validation: f64,
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self {
            test: 0.2,
            validation: 0.1,
        }
    }
}

/// Index ranges of the three contiguous partitions, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Range<usize>,
    pub test: Range<usize>,
    pub validation: Range<usize>,
}

impl SplitFractions {
    pub fn new(test: f64, validation: f64) -> Result<Self> {
        let fractions = Self { test, validation };
        fractions.validate()?;
        Ok(fractions)
    }

    pub fn train(&self) -> f64 {
        1.0 - self.test - self.validation
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("test", self.test), ("validation", self.validation)] {
            if !(value.is_finite() && (0.0..1.0).contains(&value)) {
                bail!("{} fraction must lie in [0, 1), got {}", name, value);
            }
        }
        if self.train() <= 0.0 {
            bail!(
                "test ({}) and validation ({}) fractions leave no training data",
                self.test,
                self.validation
            );
        }
        Ok(())
    }

    /// Splits `n` positions as `[0, round(n*train))`, `[.., round(n*(train+test)))`
    /// and the remaining tail for validation.
    pub fn partition(&self, n: usize) -> Partition {
        let total = n as f64;
        let train_end = ((total * self.train()).round() as usize).min(n);
        let test_end = ((total * (self.train() + self.test)).round() as usize).clamp(train_end, n);
        Partition {
            train: 0..train_end,
            test: train_end..test_end,
            validation: test_end..n,
        }
    }
}
