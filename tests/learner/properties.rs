use std::collections::HashSet;

use calibrator::acquisition::{RankOrder, lower_confidence_bound, rank_candidates};
use calibrator::prelude::*;
use calibrator::{CanonicalKey, ensemble_predict, train_ensemble};

use crate::{quadratic_oracle, quadratic_seeds, test_functions};

fn multimodal_outcome(family: ModelFamily) -> Outcome {
    let grid = sample_grid(&[(-3.0, 3.0)], 150, 9).unwrap();
    let xs = [-3.0, -1.0, 1.0, 3.0];
    let ys: Vec<f64> = xs.iter().map(|&x| test_functions::rastrigin(&[x])).collect();
    let seeds = Observations::from_scalars(&xs, &ys).unwrap();
    let config = LearnerConfig::builder()
        .n_iters(25)
        .ensemble_size(4)
        .bootstrap(true)
        .family(family)
        .min_improve_pct(None)
        .build()
        .unwrap();

    let mut oracle = |x: &[f64]| Ok::<_, core::convert::Infallible>(test_functions::rastrigin(x));
    active_learning_loop(config, seeds, grid, &mut oracle).unwrap()
}

#[test]
fn best_so_far_is_running_minimum() {
    for family in [
        ModelFamily::Polynomial(PolynomialConfig::new(4)),
        ModelFamily::Tree(TreeConfig::default()),
    ] {
        let outcome = multimodal_outcome(family);
        let mut running = outcome.observations.values()[..4]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        for pair in outcome.history.windows(2) {
            assert!(pair[1].best_so_far <= pair[0].best_so_far);
        }
        for record in &outcome.history {
            running = running.min(record.value);
            assert_eq!(record.best_so_far, running);
        }
    }
}

#[test]
fn selected_candidates_are_distinct() {
    let outcome = multimodal_outcome(ModelFamily::Tree(TreeConfig::new().max_depth(3)));
    let mut keys: HashSet<CanonicalKey> = outcome
        .observations
        .points()
        .iter()
        .take(4)
        .map(CanonicalKey::new)
        .collect();
    for record in &outcome.history {
        assert!(
            keys.insert(CanonicalKey::new(&record.vector)),
            "{:?} evaluated twice",
            record.vector
        );
    }
    assert_eq!(outcome.cache.len(), keys.len());
}

#[test]
fn history_lines_up_with_observations() {
    let outcome = multimodal_outcome(ModelFamily::Polynomial(PolynomialConfig::new(3)));
    assert_eq!(outcome.observations.len(), 4 + outcome.history.len());
    for (i, record) in outcome.history.iter().enumerate() {
        assert_eq!(record.iteration, i);
        assert_eq!(outcome.observations.points().row(4 + i), record.vector.as_slice());
        assert_eq!(outcome.observations.values()[4 + i], record.value);
        assert_eq!(outcome.cache.get(&record.vector), Some(record.value));
    }
}

#[test]
fn single_member_ensemble_has_zero_sigma() {
    let obs = quadratic_seeds();
    let grid = sample_grid(&[(-5.0, 5.0)], 40, 0).unwrap();
    for family in [
        ModelFamily::Polynomial(PolynomialConfig::new(2)),
        ModelFamily::Tree(TreeConfig::default()),
        ModelFamily::Neural(NeuralConfig::new().epochs(3)),
    ] {
        let ensemble =
            train_ensemble(&obs, 1, true, &family, &mut fastrand::Rng::with_seed(1)).unwrap();
        let prediction = ensemble.predict(&grid).unwrap();
        assert!(prediction.std.iter().all(|&s| s == 0.0));
    }
}

#[test]
fn single_member_loop_ignores_kappa() {
    // Zero sigma on every iteration makes LCB equal to the mean whatever kappa is.
    let run = |family: ModelFamily, start: f64, end: f64| {
        let config = LearnerConfig::builder()
            .n_iters(10)
            .ensemble_size(1)
            .bootstrap(true)
            .family(family)
            .kappa(start, end)
            .min_improve_pct(None)
            .seed(5)
            .build()
            .unwrap();
        let grid = sample_grid(&[(-5.0, 5.0)], 80, 4).unwrap();
        let mut oracle = quadratic_oracle;
        let outcome = active_learning_loop(config, quadratic_seeds(), grid, &mut oracle).unwrap();
        outcome
            .history
            .into_iter()
            .map(|record| record.vector)
            .collect::<Vec<_>>()
    };

    for family in [
        ModelFamily::Polynomial(PolynomialConfig::new(2)),
        ModelFamily::Tree(TreeConfig::default()),
    ] {
        let baseline = run(family.clone(), 0.0, 0.0);
        assert_eq!(baseline.len(), 10);
        for (start, end) in [(1.6, 0.8), (10.0, 0.1), (0.5, 25.0)] {
            assert_eq!(run(family.clone(), start, end), baseline);
        }
    }
}

#[test]
fn zero_kappa_ranks_by_mean() {
    let xs: Vec<f64> = (0..10).map(|i| f64::from(i) - 4.5).collect();
    let ys: Vec<f64> = xs.iter().map(|x| x.sin() + 0.1 * x).collect();
    let obs = Observations::from_scalars(&xs, &ys).unwrap();
    let grid = sample_grid(&[(-5.0, 5.0)], 64, 2).unwrap();

    let ensemble = train_ensemble(
        &obs,
        5,
        true,
        &ModelFamily::Polynomial(PolynomialConfig::new(3)),
        &mut fastrand::Rng::with_seed(3),
    )
    .unwrap();
    let pred = ensemble_predict(ensemble.models(), &grid).unwrap();
    assert!(pred.std.iter().any(|&s| s > 0.0));

    let lcb = lower_confidence_bound(&pred.mean, &pred.std, 0.0);
    assert_eq!(
        rank_candidates(&lcb, RankOrder::Ascending),
        rank_candidates(&pred.mean, RankOrder::Ascending)
    );
}

#[test]
fn seeds_feed_the_first_surrogate() {
    // A perfect degree-2 fit of the seeds sends the first pick next to x = 3.
    let grid = sample_grid(&[(-5.0, 5.0)], 200, 0).unwrap();
    let config = LearnerConfig::builder()
        .n_iters(1)
        .ensemble_size(1)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
        .build()
        .unwrap();
    let mut oracle = quadratic_oracle;
    let outcome = active_learning_loop(config, quadratic_seeds(), grid.clone(), &mut oracle).unwrap();

    let picked = outcome.history[0].vector[0];
    let closest = grid
        .iter()
        .map(|x| x[0])
        .min_by(|a, b| (a - 3.0).abs().total_cmp(&(b - 3.0).abs()))
        .unwrap();
    assert_eq!(picked, closest);
}
