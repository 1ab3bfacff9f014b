//! End-to-end run: sample, train, validate, then write the error histogram
//! and a per-sample CSV.
//!
//! ```text
//! cargo run --release --example notebook_run [config.toml] [output_dir]
//! ```
//!
//! Without a config path the reference notebook preset is used. Set
//! `RUST_LOG=debug` to see every checkpoint capture.

use std::path::PathBuf;

use anyhow::Result;
use surrogate_lib::evaluation::{render_error_histogram, write_validation_csv};
use surrogate_lib::{default_configs, run_experiment, ExperimentConfig};
use tracing_subscriber::EnvFilter;

const HISTOGRAM_BINS: usize = 60;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => ExperimentConfig::from_toml_file(&path)?,
        _ => default_configs::notebook(),
    };
    let out_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("target/notebook_run"),
    };
    std::fs::create_dir_all(&out_dir)?;

    println!(
        "Training {} x {} network on {} samples for {} epochs",
        config.network.depth, config.network.width, config.n_samples, config.training.epochs
    );
    let started = std::time::Instant::now();
    let result = run_experiment(&config)?;
    let elapsed = started.elapsed();

    let report = &result.report;
    println!("\n=== Training ===");
    println!(
        "  Best test loss:    {:.6e}",
        result.training.best_test_loss
    );
    println!("  Checkpoint epoch:  {}", result.checkpoint.epoch());
    if let Some(last) = result.training.last {
        println!("  Final train loss:  {:.6e}", last.train_loss);
        println!("  Final test loss:   {:.6e}", last.test_loss);
    }
    println!("  Elapsed:           {:.1?}", elapsed);

    println!("\n=== Validation ({} samples) ===", report.count);
    println!("  Mean error:        {:.6e}", report.mean_error);
    println!("  Std error:         {:.6e}", report.std_error);
    println!("  Mean abs error:    {:.6e}", report.mean_abs_error);
    println!("  Max abs error:     {:.6e}", report.max_abs_error);
    println!("  RMSE:              {:.6e}", report.rmse);

    let errors = report.errors.to_vec();
    let svg_path = out_dir.join("validation_errors.svg");
    render_error_histogram(&errors, &svg_path, HISTOGRAM_BINS)?;
    println!("\nHistogram written to {}", svg_path.display());

    let csv_path = out_dir.join("validation.csv");
    write_validation_csv(&csv_path, &result.validation, &report.predictions)?;
    println!("Per-sample results written to {}", csv_path.display());

    Ok(())
}
