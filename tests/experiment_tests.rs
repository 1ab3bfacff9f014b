
use surrogate_lib::{
    default_configs, put_prices, run_experiment, ExperimentConfig, TrainingConfig,
    DEFAULT_LOSS_FLOOR,
};
use test_utils::{label_variance, smoke_config};

/// The minimal preset trains a network that clearly beats a constant predictor
/// on the held-out validation tail.
#[test]
fn test_minimal_run_beats_constant_predictor() {
    let config = default_configs::minimal();
    let result = run_experiment(&config).expect("minimal run should succeed");

    println!(
        "best test loss {:.3e} at epoch {}, validation rmse {:.3e}",
        result.training.best_test_loss, result.checkpoint.epoch(), result.report.rmse
    );

    assert!(result.training.best_test_loss < config.training.loss_floor);
    assert_eq!(
        result.checkpoint.test_loss(),
        result.training.best_test_loss
    );

    let variance = label_variance(&result.validation.labels);
    let mse = result.report.rmse.powi(2);
    assert!(
        mse < 0.2 * variance,
        "validation MSE {:.3e} not well below label variance {:.3e}",
        mse,
        variance
    );
}

#[test]
fn test_validation_slice_is_the_untouched_tail() {
    let config = smoke_config(7);
    let result = run_experiment(&config).unwrap();

    // 2000 samples: train 0..1400, test 1400..1800, validation 1800..2000
    assert_eq!(result.validation.len(), 200);
    assert_eq!(result.report.count, 200);

    let reference = put_prices(&result.validation.features, config.domain.strike);
    assert_eq!(reference, result.validation.labels);
    assert_eq!(result.report.predictions.len(), 200);
}

#[test]
fn test_experiment_is_reproducible() {
    let config = ExperimentConfig {
        training: TrainingConfig {
            epochs: 150,
            ..default_configs::minimal().training
        },
        ..smoke_config(314)
    };

    let a = run_experiment(&config).unwrap();
    let b = run_experiment(&config).unwrap();

    assert_eq!(a.training.best_test_loss, b.training.best_test_loss);
    assert_eq!(a.checkpoint, b.checkpoint);
    assert_eq!(a.report.errors, b.report.errors);
}

#[test]
fn test_unbeaten_floor_is_an_error() {
    let config = ExperimentConfig {
        training: TrainingConfig {
            epochs: 5,
            loss_floor: 0.0,
            ..default_configs::minimal().training
        },
        ..smoke_config(1)
    };

    let err = run_experiment(&config).unwrap_err();
    assert!(
        err.to_string().contains("floor"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = smoke_config(1);
    config.split.test = 0.8;
    config.split.validation = 0.3;
    assert!(run_experiment(&config).is_err());

    let mut config = smoke_config(1);
    config.network.width = 0;
    assert!(run_experiment(&config).is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_toml_overrides_preset_values() {
    let text = r#"
        n_samples = 1500
        seed = 11

        [network]
        width = 24
        depth = 2

        [training]
        epochs = 40
        log_every = 10

        [training.optimizer]
        learning_rate = 0.005
    "#;
    let config = ExperimentConfig::from_toml_str(text).unwrap();
    assert_eq!(config.n_samples, 1500);
    assert_eq!(config.network.width, 24);
    assert_eq!(config.network.input_width, 5);
    assert_eq!(config.training.loss_floor, DEFAULT_LOSS_FLOOR);

    let result = run_experiment(&ExperimentConfig {
        training: TrainingConfig {
            loss_floor: f64::MAX,
            ..config.training.clone()
        },
        ..config
    })
    .unwrap();
    let epochs: Vec<usize> = result.training.progress.iter().map(|o| o.epoch).collect();
    assert_eq!(epochs, vec![0, 10, 20, 30]);
}

/// Full reference run. Takes a long time on a single machine.
#[test]
#[ignore]
fn test_notebook_accuracy() {
    let config = default_configs::notebook();
    let result = run_experiment(&config).unwrap();
    let report = &result.report;

    println!(
        "mean error {:.3e}, std error {:.3e}, mean abs error {:.3e}",
        report.mean_error, report.std_error, report.mean_abs_error
    );
    assert_eq!(report.count, 10_000);
    assert!(report.mean_error.abs() < 0.005);
    assert!(report.std_error < 0.01);
}
