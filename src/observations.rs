//! The observation set: evaluated parameter vectors and their fit values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::points::Points;

/// Parameter vectors paired with their observed fit values.
///
/// Stored as two aligned collections: a [`Points`] matrix and a value
/// vector of the same length. Values are minimized, so the best
/// observation is the one with the lowest value.
///
/// # Examples
///
/// ```
/// use calibrator::Observations;
///
/// let obs = Observations::from_scalars(&[-1.0, 0.0, 2.0], &[4.0, 1.0, 9.0]).unwrap();
/// let (x, y) = obs.best().unwrap();
/// assert_eq!(x, &[0.0]);
/// assert_eq!(y, 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawObservations"))]
pub struct Observations {
    points: Points,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawObservations {
    points: Points,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawObservations> for Observations {
    type Error = Error;

    fn try_from(raw: RawObservations) -> Result<Self> {
        Self::from_parts(raw.points, raw.values)
    }
}

impl Observations {
    /// Creates an empty observation set for `n_dims`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDimensions`] if `n_dims` is zero.
    pub fn new(n_dims: usize) -> Result<Self> {
        Ok(Self {
            points: Points::new(n_dims)?,
            values: Vec::new(),
        })
    }

    /// Pairs an existing matrix with its fit values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the lengths differ and
    /// [`Error::NonFiniteValue`] if any value is NaN or infinite.
    pub fn from_parts(points: Points, values: Vec<f64>) -> Result<Self> {
        if points.len() != values.len() {
            return Err(Error::LengthMismatch {
                rows: points.len(),
                values: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteValue { index });
        }
        Ok(Self { points, values })
    }

    /// Builds an observation set from a non-empty list of rows.
    ///
    /// # Errors
    ///
    /// Propagates [`Points::from_rows`] errors and the checks of
    /// [`from_parts`](Self::from_parts).
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], values: &[f64]) -> Result<Self> {
        Self::from_parts(Points::from_rows(rows)?, values.to_vec())
    }

    /// Builds a one-dimensional observation set.
    ///
    /// # Errors
    ///
    /// Same as [`from_parts`](Self::from_parts), plus non-finite inputs.
    pub fn from_scalars(xs: &[f64], values: &[f64]) -> Result<Self> {
        Self::from_parts(Points::from_column(xs)?, values.to_vec())
    }

    /// Appends one observation.
    ///
    /// # Errors
    ///
    /// Returns the [`Points::push`] errors, or [`Error::NonFiniteValue`] for a
    /// NaN or infinite `value`. Nothing is appended on error.
    pub fn push(&mut self, x: &[f64], value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue {
                index: self.values.len(),
            });
        }
        self.points.push(x)?;
        self.values.push(value);
        Ok(())
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dimensionality of the parameter vectors.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.points.n_dims()
    }

    /// The parameter matrix.
    #[must_use]
    pub fn points(&self) -> &Points {
        &self.points
    }

    /// The fit values, aligned with [`points`](Self::points).
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over `(vector, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> {
        self.points.iter().zip(self.values.iter().copied())
    }

    /// The first observation with the lowest value.
    #[must_use]
    pub fn best(&self) -> Option<(&[f64], f64)> {
        let index = self.best_index()?;
        Some((self.points.row(index), self.values[index]))
    }

    /// The lowest observed value.
    #[must_use]
    pub fn best_value(&self) -> Option<f64> {
        self.best_index().map(|i| self.values[i])
    }

    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if best.is_none_or(|b| v < self.values[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// Gathers the given observations (repeats allowed) into a new set.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn resample(&self, indices: &[usize]) -> Self {
        Self {
            points: self.points.select(indices),
            values: indices.iter().map(|&i| self.values[i]).collect(),
        }
    }
}
