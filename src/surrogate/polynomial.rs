//! Polynomial least-squares surrogate.
//!
//! Inputs are expanded to every monomial of total degree up to `degree`
//! (bias included), ordered by degree and then lexicographically by variable
//! index: for two variables and degree 2 the terms are
//! `1, x0, x1, x0², x0·x1, x1²`. Coefficients are the minimum-norm least
//! squares solution obtained from an SVD, so underdetermined designs still
//! interpolate their samples.

use nalgebra::{DMatrix, DVector};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Surrogate;
use crate::points::Points;

/// Default polynomial degree.
pub const DEFAULT_DEGREE: usize = 5;

/// Settings for [`PolynomialSurrogate`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolynomialConfig {
    /// Maximum total degree of the expansion (default: 5).
    pub degree: usize,
}

impl PolynomialConfig {
    /// Creates a configuration with the given degree.
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    /// Sets the maximum total degree.
    #[must_use]
    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEGREE)
    }
}

/// A fitted polynomial.
#[derive(Clone, Debug)]
pub struct PolynomialSurrogate {
    degree: usize,
    /// Each term lists the variable indices multiplied together (empty = bias).
    terms: Vec<Vec<usize>>,
    coefficients: Vec<f64>,
}

impl PolynomialSurrogate {
    /// Fits a polynomial to `y` over the rows of `x`.
    ///
    /// With fewer than two samples the degree is forced to 0, giving a
    /// constant model (the single value, or 0 with no samples at all). If
    /// the least-squares solve breaks down the model falls back to the
    /// constant sample mean.
    ///
    /// # Panics
    ///
    /// Panics if `x` and `y` have different lengths.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(x: &Points, y: &[f64], config: &PolynomialConfig) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have the same length");

        let degree = if y.len() < 2 { 0 } else { config.degree };
        if degree < config.degree {
            trace_debug!(
                n_samples = y.len(),
                requested = config.degree,
                "too few samples for polynomial degree; fitting a constant"
            );
        }

        if y.is_empty() {
            return Self::constant(0.0);
        }

        let terms = monomial_terms(x.n_dims(), degree);
        match least_squares(x, y, &terms) {
            Some(coefficients) => Self {
                degree,
                terms,
                coefficients,
            },
            None => {
                trace_debug!(
                    n_samples = y.len(),
                    degree,
                    "polynomial least squares failed; fitting a constant"
                );
                Self::constant(y.iter().sum::<f64>() / y.len() as f64)
            }
        }
    }

    fn constant(value: f64) -> Self {
        Self {
            degree: 0,
            terms: vec![Vec::new()],
            coefficients: vec![value],
        }
    }

    /// The degree actually used for the fit.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of monomial terms, including the bias.
    #[must_use]
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Fitted coefficients, one per term in expansion order.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Surrogate for PolynomialSurrogate {
    fn predict_one(&self, x: &[f64]) -> f64 {
        self.terms
            .iter()
            .zip(&self.coefficients)
            .map(|(term, c)| c * term_value(x, term))
            .sum()
    }
}

/// Enumerates monomials of total degree `0..=degree` in graded order.
fn monomial_terms(n_dims: usize, degree: usize) -> Vec<Vec<usize>> {
    let mut terms = vec![Vec::new()];
    let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];
    for _ in 0..degree {
        let mut next = Vec::new();
        for term in &frontier {
            let start = term.last().copied().unwrap_or(0);
            for var in start..n_dims {
                let mut extended = term.clone();
                extended.push(var);
                next.push(extended);
            }
        }
        terms.extend(next.iter().cloned());
        frontier = next;
    }
    terms
}

fn term_value(x: &[f64], term: &[usize]) -> f64 {
    term.iter().map(|&i| x[i]).product()
}

/// Minimum-norm least squares via SVD with a numpy-style rank cutoff.
#[allow(clippy::cast_precision_loss)]
fn least_squares(x: &Points, y: &[f64], terms: &[Vec<usize>]) -> Option<Vec<f64>> {
    let n = x.len();
    let p = terms.len();
    let design = DMatrix::from_fn(n, p, |i, j| term_value(x.row(i), &terms[j]));
    let target = DVector::from_column_slice(y);

    let svd = design.svd(true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = max_sv * n.max(p) as f64 * f64::EPSILON;
    let solution = svd.solve(&target, cutoff).ok()?;

    let coefficients: Vec<f64> = solution.iter().copied().collect();
    coefficients
        .iter()
        .all(|c| c.is_finite())
        .then_some(coefficients)
}
