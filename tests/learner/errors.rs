use core::convert::Infallible;
use core::fmt;

use calibrator::prelude::*;

use crate::{line_grid, quadratic_oracle, quadratic_seeds};

#[derive(Debug, PartialEq)]
struct SimulatorCrashed {
    call: usize,
}

impl fmt::Display for SimulatorCrashed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulator crashed on call {}", self.call)
    }
}

impl std::error::Error for SimulatorCrashed {}

/// Succeeds twice, then fails.
struct FlakySimulator {
    calls: usize,
}

impl Oracle for FlakySimulator {
    type Error = SimulatorCrashed;

    fn evaluate(&mut self, x: &[f64]) -> core::result::Result<f64, SimulatorCrashed> {
        self.calls += 1;
        if self.calls == 3 {
            return Err(SimulatorCrashed { call: self.calls });
        }
        Ok((x[0] - 3.0).powi(2))
    }
}

fn config(n_iters: usize) -> LearnerConfig {
    LearnerConfig::builder()
        .n_iters(n_iters)
        .ensemble_size(2)
        .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
        .min_improve_pct(None)
        .build()
        .unwrap()
}

#[test]
fn oracle_failure_keeps_prior_history() {
    let grid = sample_grid(&[(-5.0, 5.0)], 50, 0).unwrap();
    let mut learner = ActiveLearner::new(config(10), quadratic_seeds(), grid).unwrap();
    let mut oracle = FlakySimulator { calls: 0 };

    let err = learner.run(&mut oracle).unwrap_err();
    match &err {
        RunError::Oracle { iteration, source } => {
            assert_eq!(*iteration, 2);
            assert_eq!(source, &SimulatorCrashed { call: 3 });
        }
        other => panic!("expected oracle error, got {other:?}"),
    }
    assert_eq!(learner.history().len(), 2);
    assert_eq!(learner.observations().len(), 5);
    assert_eq!(learner.cache().len(), 5);
    assert_eq!(learner.stop_reason(), None);

    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "simulator crashed on call 3");
    assert_eq!(err.into_oracle_error(), Some(SimulatorCrashed { call: 3 }));
}

#[test]
fn oracle_is_not_retried() {
    let grid = sample_grid(&[(-5.0, 5.0)], 50, 0).unwrap();
    let mut oracle = FlakySimulator { calls: 0 };
    let result = active_learning_loop(config(10), quadratic_seeds(), grid, &mut oracle);

    assert!(matches!(result, Err(RunError::Oracle { iteration: 2, .. })));
    assert_eq!(oracle.calls, 3);
}

#[test]
fn configuration_errors_precede_oracle_calls() {
    let mut calls = 0;
    let mut oracle = |x: &[f64]| {
        calls += 1;
        quadratic_oracle(x)
    };

    let bad = LearnerConfig {
        ensemble_size: 0,
        ..LearnerConfig::default()
    };
    let result = active_learning_loop(bad, quadratic_seeds(), line_grid(-5.0, 5.0, 11), &mut oracle);
    assert!(matches!(
        result,
        Err(RunError::Learner(Error::InvalidEnsembleSize(0)))
    ));

    let bad = LearnerConfig {
        family: ModelFamily::Tree(TreeConfig::new().max_depth(0)),
        ..LearnerConfig::default()
    };
    let result = active_learning_loop(bad, quadratic_seeds(), line_grid(-5.0, 5.0, 11), &mut oracle);
    assert!(matches!(
        result,
        Err(RunError::Learner(Error::InvalidFamilyConfig { family: "tree", .. }))
    ));

    assert_eq!(calls, 0);
}

#[test]
fn unknown_names_are_rejected() {
    assert_eq!(
        "ucb".parse::<Acquisition>().unwrap_err(),
        Error::UnknownAcquisition("ucb".into())
    );
    assert_eq!(
        "forest".parse::<ModelFamily>().unwrap_err(),
        Error::UnknownModelFamily("forest".into())
    );
    assert_eq!("Poly".parse::<FamilyKind>().unwrap(), FamilyKind::Polynomial);
}

#[test]
fn grid_dimension_mismatch_is_rejected() {
    let grid = sample_grid(&[(-1.0, 1.0), (-1.0, 1.0)], 10, 0).unwrap();
    let err = ActiveLearner::new(config(5), quadratic_seeds(), grid).err().unwrap();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 1,
            got: 2,
            ..
        }
    ));
}

#[test]
fn non_finite_oracle_value_stops_the_run() {
    let mut oracle = |x: &[f64]| {
        Ok::<_, Infallible>(if x[0] > 0.0 { f64::INFINITY } else { 1.0 })
    };
    let grid = line_grid(1.0, 2.0, 5);
    let mut learner = ActiveLearner::new(config(5), quadratic_seeds(), grid).unwrap();

    let err = learner.run(&mut oracle).unwrap_err();
    assert!(matches!(
        err,
        RunError::NonFiniteValue { iteration: 0, value } if value.is_infinite()
    ));
    assert!(learner.history().is_empty());
    assert_eq!(learner.observations().len(), 3);
    assert!(err.to_string().contains("non-finite"));
}

#[test]
fn invalid_inputs_are_rejected() {
    assert_eq!(
        Observations::from_scalars(&[1.0, 2.0], &[1.0]).unwrap_err(),
        Error::LengthMismatch { rows: 2, values: 1 }
    );
    assert_eq!(
        Observations::from_scalars(&[1.0], &[f64::NAN]).unwrap_err(),
        Error::NonFiniteValue { index: 0 }
    );
    assert!(matches!(
        Points::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
        Err(Error::DimensionMismatch {
            expected: 2,
            got: 1,
            row: 1
        })
    ));
    assert_eq!(
        sample_grid(&[(1.0, -1.0)], 10, 0).unwrap_err(),
        Error::InvalidBounds { low: 1.0, high: -1.0 }
    );
}
