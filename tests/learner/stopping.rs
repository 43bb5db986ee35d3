use core::convert::Infallible;

use calibrator::prelude::*;

use crate::{line_grid, quadratic_oracle};

fn poly_config() -> calibrator::LearnerConfigBuilder {
    LearnerConfig::builder()
        .ensemble_size(2)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(1)))
}

#[test]
fn constant_oracle_converges_after_patience() {
    let seeds = Observations::from_scalars(&[0.0], &[1.0]).unwrap();
    let config = poly_config()
        .n_iters(30)
        .patience(3)
        .min_improve_pct(Some(0.01))
        .build()
        .unwrap();

    let mut oracle = |_: &[f64]| Ok::<_, Infallible>(1.0);
    let outcome = active_learning_loop(config, seeds, line_grid(-1.0, 1.0, 20), &mut oracle).unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::Converged));
    assert_eq!(outcome.history.len(), 3);
}

#[test]
fn improvement_resets_patience() {
    let seeds = Observations::from_scalars(&[10.0], &[10.0]).unwrap();
    let config = poly_config()
        .n_iters(30)
        .patience(3)
        .min_improve_pct(Some(0.01))
        .build()
        .unwrap();

    // best_so_far: 5 (improved), 5, 1 (improved), 1, 1, 1 -> stop on the sixth call.
    let mut values = [5.0, 5.0, 1.0, 5.0, 5.0, 5.0].into_iter();
    let mut oracle = |_: &[f64]| Ok::<_, Infallible>(values.next().unwrap_or(5.0));
    let outcome = active_learning_loop(config, seeds, line_grid(-1.0, 1.0, 20), &mut oracle).unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::Converged));
    let best: Vec<f64> = outcome.history.iter().map(|r| r.best_so_far).collect();
    assert_eq!(best, vec![5.0, 5.0, 1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn early_stopping_disabled_runs_full_budget() {
    let seeds = Observations::from_scalars(&[0.0], &[1.0]).unwrap();
    let config = poly_config().n_iters(8).min_improve_pct(None).build().unwrap();

    let mut oracle = |_: &[f64]| Ok::<_, Infallible>(1.0);
    let outcome = active_learning_loop(config, seeds, line_grid(-1.0, 1.0, 20), &mut oracle).unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::MaxIterations));
    assert_eq!(outcome.history.len(), 8);
}

#[test]
fn small_grid_is_exhausted() {
    let config = poly_config().n_iters(10).min_improve_pct(None).build().unwrap();
    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(
        config,
        Observations::new(1).unwrap(),
        line_grid(0.0, 2.0, 3),
        &mut oracle,
    )
    .unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::GridExhausted));
    assert_eq!(outcome.history.len(), 3);
    assert_eq!(outcome.cache.len(), 3);
}

#[test]
fn seeded_grid_points_count_as_evaluated() {
    // 1.000_000_1 shares a cache key with the grid point 1.0.
    let seeds = Observations::from_scalars(&[1.000_000_1], &[4.0]).unwrap();
    let config = poly_config().n_iters(10).min_improve_pct(None).build().unwrap();
    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(config, seeds, line_grid(0.0, 2.0, 3), &mut oracle).unwrap();

    assert_eq!(outcome.stop_reason, Some(StopReason::GridExhausted));
    assert_eq!(outcome.history.len(), 2);
    assert!(outcome.history.iter().all(|r| r.vector != vec![1.0]));
}

#[test]
fn exhaustion_does_not_consume_an_iteration() {
    let config = poly_config().n_iters(10).min_improve_pct(None).build().unwrap();
    let mut learner =
        ActiveLearner::new(config, Observations::new(1).unwrap(), line_grid(0.0, 1.0, 3)).unwrap();
    let mut oracle = quadratic_oracle;

    assert_eq!(learner.run(&mut oracle).unwrap(), StopReason::GridExhausted);
    assert_eq!(learner.iteration(), 3);
}

#[test]
fn budget_equal_to_grid_size_hits_the_limit() {
    let config = poly_config().n_iters(3).min_improve_pct(None).build().unwrap();
    let mut learner =
        ActiveLearner::new(config, Observations::new(1).unwrap(), line_grid(0.0, 1.0, 3)).unwrap();
    let mut oracle = quadratic_oracle;

    assert_eq!(learner.run(&mut oracle).unwrap(), StopReason::MaxIterations);
    assert_eq!(learner.iteration(), 3);
}

#[test]
fn terminal_state_is_sticky() {
    let config = poly_config().n_iters(2).min_improve_pct(None).build().unwrap();
    let mut learner =
        ActiveLearner::new(config, Observations::new(1).unwrap(), line_grid(0.0, 1.0, 10)).unwrap();
    let mut oracle = quadratic_oracle;
    assert_eq!(learner.run(&mut oracle).unwrap(), StopReason::MaxIterations);

    let mut calls = 0;
    let mut counting = |x: &[f64]| {
        calls += 1;
        quadratic_oracle(x)
    };
    assert_eq!(learner.run(&mut counting).unwrap(), StopReason::MaxIterations);
    assert_eq!(calls, 0);
    assert_eq!(learner.history().len(), 2);
}
