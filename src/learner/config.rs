#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::acquisition::Acquisition;
use crate::error::{Error, Result};
use crate::surrogate::ModelFamily;

/// Settings for an active-learning run.
///
/// Fields are public; [`LearnerConfig::builder`] offers a fluent way to set
/// them with validation on [`build`](LearnerConfigBuilder::build).
/// [`ActiveLearner::new`](super::ActiveLearner::new) validates again, so a
/// hand-edited config is checked before the first oracle call either way.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `n_iters` | 30 |
/// | `ensemble_size` | 8 |
/// | `family` | polynomial, degree 5 |
/// | `bootstrap` | `false` |
/// | `kappa_start` → `kappa_end` | 1.6 → 0.8 |
/// | `acquisition` | lower confidence bound |
/// | `patience` | 10 |
/// | `min_improve_pct` | `Some(0.01)` |
/// | `seed` | 0 |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LearnerConfig {
    /// Maximum number of oracle evaluations.
    pub n_iters: usize,
    /// Number of surrogates in the ensemble.
    pub ensemble_size: usize,
    /// Surrogate family and its settings.
    pub family: ModelFamily,
    /// Fit each member on a bootstrap resample of the observations.
    pub bootstrap: bool,
    /// Confidence-bound weight at the first iteration.
    pub kappa_start: f64,
    /// Confidence-bound weight at the last iteration.
    pub kappa_end: f64,
    /// Acquisition rule.
    pub acquisition: Acquisition,
    /// Consecutive stalled iterations that end the run.
    pub patience: usize,
    /// Relative change below which an iteration counts as stalled, as a
    /// fraction (`0.01` is one percent). `None` disables early stopping.
    pub min_improve_pct: Option<f64>,
    /// Seed for the loop's random generator.
    pub seed: u64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            n_iters: 30,
            ensemble_size: 8,
            family: ModelFamily::default(),
            bootstrap: false,
            kappa_start: 1.6,
            kappa_end: 0.8,
            acquisition: Acquisition::LowerConfidenceBound,
            patience: 10,
            min_improve_pct: Some(0.01),
            seed: 0,
        }
    }
}

impl LearnerConfig {
    /// Starts a builder from the default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use calibrator::prelude::*;
    ///
    /// let config = LearnerConfig::builder()
    ///     .n_iters(15)
    ///     .ensemble_size(5)
    ///     .family(ModelFamily::Polynomial(PolynomialConfig::new(2)))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.kappa_at(0), 1.6);
    /// assert_eq!(config.kappa_at(14), 0.8);
    /// ```
    #[must_use]
    pub fn builder() -> LearnerConfigBuilder {
        LearnerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Checks every setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnsembleSize`] for an empty ensemble,
    /// [`Error::InvalidFamilyConfig`] for bad surrogate settings and
    /// [`Error::InvalidConfig`] for out-of-range loop options.
    pub fn validate(&self) -> Result<()> {
        if self.ensemble_size == 0 {
            return Err(Error::InvalidEnsembleSize(0));
        }
        self.family.validate()?;

        for (field, value) in [
            ("kappa_start", self.kappa_start),
            ("kappa_end", self.kappa_end),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidConfig {
                    field,
                    reason: format!("must be finite, got {value}"),
                });
            }
        }

        if let Acquisition::ExpectedImprovement { xi } = self.acquisition
            && !xi.is_finite()
        {
            return Err(Error::InvalidConfig {
                field: "acquisition",
                reason: format!("xi must be finite, got {xi}"),
            });
        }

        if let Some(pct) = self.min_improve_pct {
            if !pct.is_finite() || pct < 0.0 {
                return Err(Error::InvalidConfig {
                    field: "min_improve_pct",
                    reason: format!("must be a non-negative finite fraction, got {pct}"),
                });
            }
            if self.patience == 0 {
                return Err(Error::InvalidConfig {
                    field: "patience",
                    reason: "must be at least 1 when early stopping is enabled".to_owned(),
                });
            }
        }

        Ok(())
    }

    /// Confidence-bound weight for iteration `t`.
    ///
    /// Interpolates linearly from `kappa_start` at `t = 0` to `kappa_end`
    /// at `t = n_iters - 1`; a single-iteration run uses `kappa_start`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kappa_at(&self, t: usize) -> f64 {
        if self.n_iters <= 1 {
            return self.kappa_start;
        }
        let frac = t as f64 / (self.n_iters - 1) as f64;
        self.kappa_start + (self.kappa_end - self.kappa_start) * frac
    }
}

/// Fluent builder for [`LearnerConfig`].
///
/// Created by [`LearnerConfig::builder`].
#[derive(Clone, Debug)]
pub struct LearnerConfigBuilder {
    config: LearnerConfig,
}

impl LearnerConfigBuilder {
    /// Sets the maximum number of oracle evaluations.
    #[must_use]
    pub fn n_iters(mut self, n_iters: usize) -> Self {
        self.config.n_iters = n_iters;
        self
    }

    /// Sets the number of ensemble members.
    #[must_use]
    pub fn ensemble_size(mut self, size: usize) -> Self {
        self.config.ensemble_size = size;
        self
    }

    /// Sets the surrogate family.
    #[must_use]
    pub fn family(mut self, family: ModelFamily) -> Self {
        self.config.family = family;
        self
    }

    /// Enables or disables bootstrap resampling.
    #[must_use]
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    /// Sets the confidence-bound annealing schedule.
    #[must_use]
    pub fn kappa(mut self, start: f64, end: f64) -> Self {
        self.config.kappa_start = start;
        self.config.kappa_end = end;
        self
    }

    /// Sets the acquisition rule.
    #[must_use]
    pub fn acquisition(mut self, acquisition: Acquisition) -> Self {
        self.config.acquisition = acquisition;
        self
    }

    /// Sets the number of stalled iterations tolerated before stopping.
    #[must_use]
    pub fn patience(mut self, patience: usize) -> Self {
        self.config.patience = patience;
        self
    }

    /// Sets the stall threshold; `None` disables early stopping.
    #[must_use]
    pub fn min_improve_pct(mut self, pct: Option<f64>) -> Self {
        self.config.min_improve_pct = pct;
        self
    }

    /// Sets the loop seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Same as [`LearnerConfig::validate`].
    pub fn build(self) -> Result<LearnerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
