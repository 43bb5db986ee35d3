//! The active-learning loop.
//!
//! Each iteration trains a surrogate ensemble on everything observed so
//! far, scores the candidate grid with the configured acquisition rule, and
//! sends the best-ranked candidate that has not been evaluated yet to the
//! oracle. The run ends after `n_iters` evaluations, when every candidate
//! has been evaluated, when the best value stops moving, or on the first
//! error.
//!
//! ```
//! use calibrator::prelude::*;
//!
//! let grid = sample_grid(&[(-5.0, 5.0)], 200, 0).unwrap();
//! let seeds = Observations::from_scalars(&[-5.0, 0.0, 5.0], &[64.0, 9.0, 4.0]).unwrap();
//! let config = LearnerConfig::builder()
//!     .n_iters(10)
//!     .ensemble_size(3)
//!     .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
//!     .build()
//!     .unwrap();
//!
//! let mut oracle = |x: &[f64]| Ok::<_, core::convert::Infallible>((x[0] - 3.0).powi(2));
//! let outcome = active_learning_loop(config, seeds, grid, &mut oracle).unwrap();
//!
//! let (_, best) = outcome.best().unwrap();
//! assert!(best < 4.0);
//! ```

mod config;
mod convergence;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use config::{LearnerConfig, LearnerConfigBuilder};
use convergence::ConvergenceTracker;

use crate::acquisition::rank_candidates;
use crate::cache::EvaluationCache;
use crate::ensemble::{Prediction, train_ensemble};
use crate::error::{Error, Result, RunError};
use crate::observations::Observations;
use crate::oracle::Oracle;
use crate::points::Points;

/// Why a run ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopReason {
    /// `n_iters` evaluations were made.
    MaxIterations,
    /// Every grid candidate was already in the cache.
    GridExhausted,
    /// The best value stalled for `patience` consecutive iterations.
    Converged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxIterations => "reached the iteration limit",
            Self::GridExhausted => "exhausted the candidate grid",
            Self::Converged => "converged",
        })
    }
}

/// One oracle evaluation made by the loop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryRecord {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// The evaluated parameter vector.
    pub vector: Vec<f64>,
    /// The oracle's fit value.
    pub value: f64,
    /// Lowest value among all observations after this evaluation.
    pub best_so_far: f64,
}

/// Final state of a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outcome {
    /// Seed observations followed by every loop evaluation.
    pub observations: Observations,
    /// One record per loop evaluation, in order.
    pub history: Vec<HistoryRecord>,
    /// Every evaluated vector, seeds included.
    pub cache: EvaluationCache,
    /// Why the run ended, or `None` if it never reached a terminal state.
    pub stop_reason: Option<StopReason>,
}

impl Outcome {
    /// The lowest-valued observation (first one on ties).
    #[must_use]
    pub fn best(&self) -> Option<(&[f64], f64)> {
        self.observations.best()
    }
}

/// Drives the calibration loop over a fixed candidate grid.
///
/// The learner owns its observations, cache and history, so everything
/// recorded before an oracle failure stays available through the
/// accessors or [`into_outcome`](Self::into_outcome).
pub struct ActiveLearner {
    config: LearnerConfig,
    grid: Points,
    observations: Observations,
    cache: EvaluationCache,
    history: Vec<HistoryRecord>,
    convergence: ConvergenceTracker,
    rng: fastrand::Rng,
    iteration: usize,
    stopped: Option<StopReason>,
}

impl ActiveLearner {
    /// Creates a learner from seed observations (possibly empty) and a grid.
    ///
    /// The cache starts with every seed observation.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`LearnerConfig::validate`], or
    /// [`Error::DimensionMismatch`] if the grid and the observations have
    /// different dimensionality.
    pub fn new(config: LearnerConfig, observations: Observations, grid: Points) -> Result<Self> {
        config.validate()?;
        if grid.n_dims() != observations.n_dims() {
            return Err(Error::DimensionMismatch {
                expected: observations.n_dims(),
                got: grid.n_dims(),
                row: 0,
            });
        }

        let cache = EvaluationCache::from_observations(&observations);
        let convergence = ConvergenceTracker::new(
            config.min_improve_pct,
            config.patience,
            observations.best_value(),
        );
        let rng = fastrand::Rng::with_seed(config.seed);

        Ok(Self {
            config,
            grid,
            observations,
            cache,
            history: Vec::new(),
            convergence,
            rng,
            iteration: 0,
            stopped: None,
        })
    }

    /// Adds previously evaluated vectors to the cache.
    ///
    /// Grid candidates matching these entries are skipped. Only the seed
    /// observations feed the surrogates; cached values are never used for
    /// training.
    #[must_use]
    pub fn with_cache(mut self, cache: &EvaluationCache) -> Self {
        self.cache.merge(cache);
        self
    }

    /// Runs iterations until a stopping condition is met.
    ///
    /// Once the run has stopped, further calls return the same
    /// [`StopReason`] without calling the oracle. After an error the state
    /// recorded so far is kept, and calling `run` again resumes from the
    /// failed iteration.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Oracle`] with the oracle's error unchanged,
    /// [`RunError::NonFiniteValue`] if the oracle returns NaN or an
    /// infinity, and [`RunError::Learner`] if the ensemble cannot be trained.
    pub fn run<O>(&mut self, oracle: &mut O) -> core::result::Result<StopReason, RunError<O::Error>>
    where
        O: Oracle + ?Sized,
    {
        if let Some(reason) = self.stopped {
            return Ok(reason);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "run",
            n_iters = self.config.n_iters,
            family = %self.config.family.kind(),
            acquisition = %self.config.acquisition
        )
        .entered();

        trace_info!(
            initial_best = ?self.observations.best_value(),
            n_observations = self.observations.len(),
            grid_size = self.grid.len(),
            "starting active learning run"
        );

        while self.iteration < self.config.n_iters {
            if let Some(reason) = self.step(oracle)? {
                self.stopped = Some(reason);
                return Ok(reason);
            }
        }

        trace_info!(iterations = self.iteration, "iteration limit reached");
        self.stopped = Some(StopReason::MaxIterations);
        Ok(StopReason::MaxIterations)
    }

    /// One iteration. Returns a stop reason if the loop should end here.
    fn step<O>(
        &mut self,
        oracle: &mut O,
    ) -> core::result::Result<Option<StopReason>, RunError<O::Error>>
    where
        O: Oracle + ?Sized,
    {
        let t = self.iteration;

        let ensemble = train_ensemble(
            &self.observations,
            self.config.ensemble_size,
            self.config.bootstrap,
            &self.config.family,
            &mut self.rng,
        )?;
        let Prediction { mean, std } = ensemble.predict(&self.grid)?;

        let kappa = self.config.kappa_at(t);
        let y_best = self
            .observations
            .best_value()
            .unwrap_or_else(|| mean.iter().copied().fold(f64::INFINITY, f64::min));
        let scores = self.config.acquisition.score(&mean, &std, kappa, y_best);
        let ranking = rank_candidates(&scores, self.config.acquisition.order());

        let Some(candidate) = ranking
            .into_iter()
            .find(|&i| !self.cache.contains(self.grid.row(i)))
        else {
            trace_info!(iteration = t, "all grid candidates already evaluated");
            return Ok(Some(StopReason::GridExhausted));
        };

        let x = self.grid.row(candidate).to_vec();
        let value = oracle
            .evaluate(&x)
            .map_err(|source| RunError::Oracle { iteration: t, source })?;
        if !value.is_finite() {
            return Err(RunError::NonFiniteValue { iteration: t, value });
        }

        self.observations.push(&x, value)?;
        self.cache.insert(&x, value);
        let best_so_far = self.observations.best_value().unwrap_or(value);
        trace_info!(
            iteration = t,
            kappa,
            candidate,
            value,
            best_so_far,
            "evaluated candidate"
        );
        self.history.push(HistoryRecord {
            iteration: t,
            vector: x,
            value,
            best_so_far,
        });
        self.iteration += 1;

        if self.convergence.observe(best_so_far) {
            trace_info!(
                iteration = t,
                patience = self.config.patience,
                "best value stalled; stopping early"
            );
            return Ok(Some(StopReason::Converged));
        }
        trace_debug!(stalled = self.convergence.stalled(), "convergence check");
        Ok(None)
    }

    /// The run's configuration.
    #[must_use]
    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// The candidate grid.
    #[must_use]
    pub fn grid(&self) -> &Points {
        &self.grid
    }

    /// Seed observations plus every evaluation made so far.
    #[must_use]
    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// The evaluation cache.
    #[must_use]
    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Records of the evaluations made so far.
    #[must_use]
    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The terminal state, once reached.
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }

    /// The lowest-valued observation so far.
    #[must_use]
    pub fn best(&self) -> Option<(&[f64], f64)> {
        self.observations.best()
    }

    /// Consumes the learner, returning everything it recorded.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        Outcome {
            observations: self.observations,
            history: self.history,
            cache: self.cache,
            stop_reason: self.stopped,
        }
    }
}

/// Runs a complete calibration in one call.
///
/// Equivalent to [`ActiveLearner::new`] followed by
/// [`run`](ActiveLearner::run) and [`into_outcome`](ActiveLearner::into_outcome).
///
/// # Errors
///
/// Same as [`ActiveLearner::new`] and [`ActiveLearner::run`]. Configuration
/// errors are reported before the oracle is called.
pub fn active_learning_loop<O>(
    config: LearnerConfig,
    observations: Observations,
    grid: Points,
    oracle: &mut O,
) -> core::result::Result<Outcome, RunError<O::Error>>
where
    O: Oracle + ?Sized,
{
    let mut learner = ActiveLearner::new(config, observations, grid)?;
    learner.run(oracle)?;
    Ok(learner.into_outcome())
}
