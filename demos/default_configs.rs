use surrogate_lib::{default_configs, run_experiment, ExperimentConfig};

fn describe(name: &str, config: &ExperimentConfig, use_case: &str) {
    println!("{}:", name);
    println!("   Samples: {} (seed {})", config.n_samples, config.seed);
    println!(
        "   Split: train {:.2} / test {:.2} / validation {:.2}",
        config.split.train(), config.split.test, config.split.validation
    );
    println!(
        "   Network: {} x {} {:?}",
        config.network.depth, config.network.width, config.network.activation
    );
    println!(
        "   Epochs: {} at learning rate {:.1e}",
        config.training.epochs, config.training.optimizer.learning_rate
    );
    println!("   Loss floor: {:.1e}", config.training.loss_floor);
    println!("   Device: {:?}", config.device);
    println!("   Use case: {}\n", use_case);
}

fn main() {
    println!("Surrogate-lib Default Configuration Examples\n");

    let notebook = default_configs::notebook();
    describe("1. Notebook", &notebook, "Reference accuracy run");

    let fast = default_configs::fast();
    describe("2. Fast", &fast, "Development, quick iteration");

    let minimal = default_configs::minimal();
    describe("3. Minimal", &minimal, "Smoke tests, debugging");

    // Presets serialize to the same TOML layout `ExperimentConfig::from_toml_file` reads
    match toml::to_string_pretty(&minimal) {
        Ok(text) => println!("Minimal configuration as TOML:\n{}", text),
        Err(e) => println!("Failed to serialize configuration: {}", e),
    }

    println!("Running the minimal configuration...");
    match run_experiment(&minimal) {
        Ok(result) => {
            println!("Run successful!");
            println!("   Best test loss: {:.3e}", result.training.best_test_loss);
            println!("   Checkpoint epoch: {}", result.checkpoint.epoch());
            println!("   Mean error: {:.3e}", result.report.mean_error);
            println!("   Std error: {:.3e}", result.report.std_error);
        }
        Err(e) => {
            println!("Run failed: {}", e);
        }
    }
}
