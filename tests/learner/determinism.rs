use calibrator::prelude::*;

use crate::{quadratic_oracle, quadratic_seeds};

fn run_history(config: &LearnerConfig, grid_seed: u64) -> Vec<HistoryRecord> {
    let grid = sample_grid(&[(-5.0, 5.0)], 120, grid_seed).unwrap();
    let mut oracle = quadratic_oracle;
    active_learning_loop(config.clone(), quadratic_seeds(), grid, &mut oracle)
        .unwrap()
        .history
}

fn assert_reproducible(config: &LearnerConfig) {
    let first = run_history(config, 4);
    let second = run_history(config, 4);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn polynomial_bootstrap_run_is_reproducible() {
    let config = LearnerConfig::builder()
        .n_iters(8)
        .ensemble_size(4)
        .bootstrap(true)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(3)))
        .seed(17)
        .build()
        .unwrap();
    assert_reproducible(&config);
}

#[test]
fn tree_bootstrap_run_is_reproducible() {
    let config = LearnerConfig::builder()
        .n_iters(8)
        .ensemble_size(4)
        .bootstrap(true)
        .family(ModelFamily::Tree(TreeConfig::new().max_depth(3).seed(2)))
        .acquisition(Acquisition::expected_improvement())
        .build()
        .unwrap();
    assert_reproducible(&config);
}

#[test]
fn neural_run_is_reproducible() {
    let config = LearnerConfig::builder()
        .n_iters(3)
        .ensemble_size(2)
        .family(ModelFamily::Neural(
            NeuralConfig::new()
                .hidden_layers(vec![6, 6])
                .dropout(0.1)
                .epochs(15),
        ))
        .seed(5)
        .build()
        .unwrap();
    assert_reproducible(&config);
}

#[test]
fn grid_seed_controls_candidates() {
    let a = sample_grid(&[(-5.0, 5.0)], 120, 4).unwrap();
    let b = sample_grid(&[(-5.0, 5.0)], 120, 4).unwrap();
    let c = sample_grid(&[(-5.0, 5.0)], 120, 5).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}
