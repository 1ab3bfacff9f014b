//! Out-of-sample validation of a trained checkpoint and its reporting.

pub mod export;
pub mod plot;
pub mod report;

pub use export::write_validation_csv;
pub use plot::{histogram, render_error_histogram, Bin};
pub use report::{validate, ValidationReport};
