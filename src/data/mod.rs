pub mod sampling;
pub mod split;

pub use sampling::{
    generate_dataset, sample_features, DomainConfig, LabeledDataset, FEATURE_COUNT,
};
pub use split::{Partition, SplitFractions};
