//! Ensembles of independently fitted surrogates.
//!
//! The spread of the members' predictions stands in for model uncertainty:
//! [`ensemble_predict`] reduces `M` predictions per grid point to a mean and
//! a sample standard deviation.

use crate::error::{Error, Result};
use crate::observations::Observations;
use crate::points::Points;
use crate::rng_util;
use crate::surrogate::{Model, ModelFamily, Surrogate};

/// Per-candidate ensemble statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Mean prediction per grid point.
    pub mean: Vec<f64>,
    /// Sample standard deviation (`N - 1` denominator) per grid point.
    pub std: Vec<f64>,
}

/// A trained set of surrogates of one family.
#[derive(Clone, Debug)]
pub struct Ensemble {
    models: Vec<Model>,
    n_dims: usize,
}

impl Ensemble {
    /// The fitted members.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always `false`: training rejects empty ensembles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Mean and standard deviation of the members' predictions on `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `grid` does not have the
    /// dimensionality the ensemble was trained on.
    pub fn predict(&self, grid: &Points) -> Result<Prediction> {
        if grid.n_dims() != self.n_dims {
            return Err(Error::DimensionMismatch {
                expected: self.n_dims,
                got: grid.n_dims(),
                row: 0,
            });
        }
        ensemble_predict(&self.models, grid)
    }
}

/// Fits `size` models of `family` on `observations`.
///
/// With `bootstrap` set and more than one observation, each member is fit on
/// `n` rows drawn with replacement, independently per member. Otherwise
/// every member sees the full set; tree and polynomial members are then
/// identical, while neural members still differ through their
/// initialization.
///
/// # Errors
///
/// Returns [`Error::InvalidEnsembleSize`] if `size` is zero and
/// [`Error::InvalidFamilyConfig`] if the family settings are invalid.
pub fn train_ensemble(
    observations: &Observations,
    size: usize,
    bootstrap: bool,
    family: &ModelFamily,
    rng: &mut fastrand::Rng,
) -> Result<Ensemble> {
    if size == 0 {
        return Err(Error::InvalidEnsembleSize(0));
    }
    family.validate()?;

    let resample = bootstrap && observations.len() > 1;
    trace_debug!(
        size,
        family = %family.kind(),
        n_samples = observations.len(),
        bootstrap = resample,
        "training ensemble"
    );

    let mut models = Vec::with_capacity(size);
    for _ in 0..size {
        let model = if resample {
            let indices = rng_util::bootstrap_indices(rng, observations.len());
            family.fit(&observations.resample(&indices), rng)?
        } else {
            family.fit(observations, rng)?
        };
        models.push(model);
    }

    Ok(Ensemble {
        models,
        n_dims: observations.n_dims(),
    })
}

/// Mean and sample standard deviation of `models`' predictions on `grid`.
///
/// With a single model the standard deviation is exactly zero everywhere.
///
/// # Errors
///
/// Returns [`Error::InvalidEnsembleSize`] if `models` is empty.
///
/// # Examples
///
/// ```
/// use calibrator::Points;
/// use calibrator::ensemble::ensemble_predict;
/// use calibrator::surrogate::{PolynomialConfig, PolynomialSurrogate};
///
/// let x = Points::from_column(&[0.0, 1.0]).unwrap();
/// let a = PolynomialSurrogate::fit(&x, &[0.0, 1.0], &PolynomialConfig::new(1));
/// let b = PolynomialSurrogate::fit(&x, &[0.0, 3.0], &PolynomialConfig::new(1));
///
/// let grid = Points::from_column(&[1.0]).unwrap();
/// let pred = ensemble_predict(&[a, b], &grid).unwrap();
/// assert!((pred.mean[0] - 2.0).abs() < 1e-9);
/// assert!((pred.std[0] - 2.0_f64.sqrt()).abs() < 1e-9);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn ensemble_predict<S: Surrogate>(models: &[S], grid: &Points) -> Result<Prediction> {
    if models.is_empty() {
        return Err(Error::InvalidEnsembleSize(0));
    }

    let per_model: Vec<Vec<f64>> = models.iter().map(|m| m.predict(grid)).collect();
    let m = models.len() as f64;

    let mut mean = vec![0.0; grid.len()];
    for preds in &per_model {
        for (acc, p) in mean.iter_mut().zip(preds) {
            *acc += p;
        }
    }
    for v in &mut mean {
        *v /= m;
    }

    let std = if models.len() == 1 {
        vec![0.0; grid.len()]
    } else {
        let mut var = vec![0.0; grid.len()];
        for preds in &per_model {
            for ((acc, p), mu) in var.iter_mut().zip(preds).zip(&mean) {
                *acc += (p - mu).powi(2);
            }
        }
        var.into_iter().map(|v| (v / (m - 1.0)).sqrt()).collect()
    };

    Ok(Prediction { mean, std })
}
