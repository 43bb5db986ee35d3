use core::convert::Infallible;

use calibrator::prelude::*;

use crate::{quadratic_oracle, quadratic_seeds, test_functions};

#[test]
fn quadratic_calibration_finds_minimum() {
    let grid = sample_grid(&[(-5.0, 5.0)], 200, 0).unwrap();
    let config = LearnerConfig::builder()
        .n_iters(15)
        .ensemble_size(5)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
        .kappa(1.6, 0.8)
        .acquisition(Acquisition::LowerConfidenceBound)
        .build()
        .unwrap();

    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(config, quadratic_seeds(), grid, &mut oracle).unwrap();

    let (x, value) = outcome.best().unwrap();
    assert!(value < 0.05, "best value {value}");
    assert!((x[0] - 3.0).abs() < 0.3, "best x {}", x[0]);
    assert!(outcome.history.len() <= 15);
    assert!(outcome.stop_reason.is_some());
}

#[test]
fn quadratic_calibration_with_bootstrap_ensemble() {
    let grid = sample_grid(&[(-5.0, 5.0)], 200, 3).unwrap();
    let config = LearnerConfig::builder()
        .n_iters(20)
        .ensemble_size(6)
        .bootstrap(true)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
        .min_improve_pct(None)
        .seed(11)
        .build()
        .unwrap();

    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(config, quadratic_seeds(), grid, &mut oracle).unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::MaxIterations));
    assert_eq!(outcome.history.len(), 20);
    let (_, value) = outcome.best().unwrap();
    assert!(value < 0.1, "best value {value}");
}

#[test]
fn sphere_with_expected_improvement() {
    let grid = sample_grid(&[(-2.0, 2.0), (-2.0, 2.0)], 300, 1).unwrap();
    let rows = [
        [-2.0, -2.0],
        [2.0, -2.0],
        [-2.0, 2.0],
        [2.0, 2.0],
        [1.5, 0.0],
        [0.0, -1.0],
        [-1.0, 0.5],
    ];
    let values: Vec<f64> = rows.iter().map(|r| test_functions::sphere(r)).collect();
    let seeds = Observations::from_rows(&rows, &values).unwrap();

    let config = LearnerConfig::builder()
        .n_iters(20)
        .ensemble_size(3)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
        .acquisition(Acquisition::expected_improvement())
        .min_improve_pct(None)
        .build()
        .unwrap();

    let mut oracle = |x: &[f64]| Ok::<_, Infallible>(test_functions::sphere(x));
    let outcome = active_learning_loop(config, seeds, grid, &mut oracle).unwrap();

    let (_, value) = outcome.best().unwrap();
    assert!(value < 0.15, "best value {value}");
}

#[test]
fn tree_surrogate_improves_on_seeds() {
    let grid = sample_grid(&[(0.0, 1.0)], 200, 5).unwrap();
    let xs = [0.0, 0.25, 0.5, 1.0];
    let ys: Vec<f64> = xs.iter().map(|&x| test_functions::forrester(&[x])).collect();
    let seeds = Observations::from_scalars(&xs, &ys).unwrap();
    let seed_best = seeds.best_value().unwrap();

    let config = LearnerConfig::builder()
        .n_iters(25)
        .ensemble_size(6)
        .bootstrap(true)
        .family(ModelFamily::Tree(TreeConfig::new().max_depth(4)))
        .min_improve_pct(None)
        .build()
        .unwrap();

    let mut oracle = |x: &[f64]| Ok::<_, Infallible>(test_functions::forrester(x));
    let outcome = active_learning_loop(config, seeds, grid, &mut oracle).unwrap();

    let (_, value) = outcome.best().unwrap();
    assert!(value <= seed_best);
    assert_eq!(outcome.history.len(), 25);
}

#[test]
fn neural_surrogate_runs_end_to_end() {
    let grid = sample_grid(&[(-5.0, 5.0)], 60, 2).unwrap();
    let config = LearnerConfig::builder()
        .n_iters(4)
        .ensemble_size(2)
        .family(ModelFamily::Neural(
            NeuralConfig::new()
                .hidden_layers(vec![8])
                .activation(Activation::Tanh)
                .epochs(30)
                .learning_rate(0.01),
        ))
        .min_improve_pct(None)
        .build()
        .unwrap();

    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(config, quadratic_seeds(), grid, &mut oracle).unwrap();

    assert_eq!(outcome.history.len(), 4);
    assert_eq!(outcome.observations.len(), 7);
    assert!(outcome.history.iter().all(|r| r.value.is_finite()));
}
