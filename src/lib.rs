#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Surrogate-assisted active learning for calibrating expensive models.
//!
//! A calibration run searches a fixed grid of candidate parameter vectors for
//! the one with the lowest fit value, spending as few calls to the expensive
//! [`Oracle`] as possible. Every iteration fits an ensemble of cheap
//! surrogate models to the observations so far, scores the grid with an
//! acquisition function built from the ensemble's mean and spread, and
//! evaluates the best-scoring candidate that has not been seen yet.
//!
//! # Getting Started
//!
//! ```
//! use calibrator::prelude::*;
//!
//! let grid = sample_grid(&[(-5.0, 5.0)], 200, 0).unwrap();
//! let seeds = Observations::from_scalars(&[-5.0, 0.0, 5.0], &[64.0, 9.0, 4.0]).unwrap();
//!
//! let config = LearnerConfig::builder()
//!     .n_iters(15)
//!     .ensemble_size(5)
//!     .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
//!     .kappa(1.6, 0.8)
//!     .build()
//!     .unwrap();
//!
//! let mut oracle = |x: &[f64]| Ok::<_, core::convert::Infallible>((x[0] - 3.0).powi(2));
//! let outcome = active_learning_loop(config, seeds, grid, &mut oracle).unwrap();
//!
//! let (x, value) = outcome.best().unwrap();
//! assert!(value < 0.05);
//! assert!((x[0] - 3.0).abs() < 0.3);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`ActiveLearner`] | Owns the run state and drives the loop one oracle call per iteration. |
//! | [`LearnerConfig`] | Iteration budget, ensemble, acquisition and early-stopping settings. |
//! | [`Oracle`] | The expensive evaluation; any `FnMut(&[f64]) -> Result<f64, E>` qualifies. |
//! | [`ModelFamily`] | Which surrogate to fit: polynomial, regression tree or neural network. |
//! | [`Acquisition`] | Lower confidence bound or expected improvement. |
//! | [`EvaluationCache`] | Skips candidates already evaluated, keyed at six decimals. |
//! | [`Outcome`] | Final observations, per-iteration history and stop reason. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on configuration, data and result types | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at each iteration | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
mod cache;
pub mod ensemble;
mod error;
mod grid;
pub mod learner;
mod observations;
mod oracle;
mod points;
mod rng_util;
pub mod surrogate;

pub use acquisition::Acquisition;
pub use cache::{CANONICAL_DECIMALS, CanonicalKey, EvaluationCache};
pub use ensemble::{Ensemble, Prediction, ensemble_predict, train_ensemble};
pub use error::{Error, Result, RunError};
pub use grid::{DEFAULT_GRID_SIZE, sample_grid};
pub use learner::{
    ActiveLearner, HistoryRecord, LearnerConfig, LearnerConfigBuilder, Outcome, StopReason,
    active_learning_loop,
};
pub use observations::Observations;
pub use oracle::Oracle;
pub use points::Points;
pub use surrogate::{FamilyKind, Model, ModelFamily, Surrogate};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use calibrator::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::Acquisition;
    pub use crate::cache::EvaluationCache;
    pub use crate::error::{Error, Result, RunError};
    pub use crate::grid::sample_grid;
    pub use crate::learner::{
        ActiveLearner, HistoryRecord, LearnerConfig, Outcome, StopReason, active_learning_loop,
    };
    pub use crate::observations::Observations;
    pub use crate::oracle::Oracle;
    pub use crate::points::Points;
    pub use crate::surrogate::{
        Activation, FamilyKind, ModelFamily, NeuralConfig, PolynomialConfig, Surrogate, TreeConfig,
    };
}
