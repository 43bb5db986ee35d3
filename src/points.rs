//! Row-major storage for parameter vectors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A matrix of parameter vectors, one vector per row.
///
/// Rows live in a single contiguous buffer and are addressed by index,
/// so appending a row amortizes to a single `extend`. Every coordinate is
/// finite and every row has exactly [`n_dims`](Points::n_dims) entries.
///
/// # Examples
///
/// ```
/// use calibrator::Points;
///
/// let mut points = Points::new(2).unwrap();
/// points.push(&[0.5, -1.0]).unwrap();
/// points.push(&[1.5, 2.0]).unwrap();
///
/// assert_eq!(points.len(), 2);
/// assert_eq!(points.row(1), &[1.5, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPoints"))]
pub struct Points {
    n_dims: usize,
    data: Vec<f64>,
}

/// Wire form of [`Points`], checked by [`Points::from_flat`] on the way in.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPoints {
    n_dims: usize,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPoints> for Points {
    type Error = Error;

    fn try_from(raw: RawPoints) -> Result<Self> {
        Self::from_flat(raw.n_dims, raw.data)
    }
}

impl Points {
    /// Creates an empty matrix whose rows will have `n_dims` coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDimensions`] if `n_dims` is zero.
    pub fn new(n_dims: usize) -> Result<Self> {
        Self::with_capacity(n_dims, 0)
    }

    /// Creates an empty matrix with room for `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDimensions`] if `n_dims` is zero.
    pub fn with_capacity(n_dims: usize, rows: usize) -> Result<Self> {
        if n_dims == 0 {
            return Err(Error::ZeroDimensions);
        }
        Ok(Self {
            n_dims,
            data: Vec::with_capacity(n_dims * rows),
        })
    }

    /// Builds a matrix from a non-empty list of rows.
    ///
    /// The dimensionality is taken from the first row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDimensions`] if `rows` is empty or the first row is
    /// empty, [`Error::DimensionMismatch`] if rows differ in length, and
    /// [`Error::NonFiniteCoordinate`] for NaN or infinite coordinates.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_dims = rows.first().map_or(0, |r| r.as_ref().len());
        let mut points = Self::with_capacity(n_dims, rows.len())?;
        for row in rows {
            points.push(row.as_ref())?;
        }
        Ok(points)
    }

    /// Builds a single-column matrix from scalar inputs.
    ///
    /// This is how one-dimensional parameter spaces are represented.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteCoordinate`] for NaN or infinite values.
    pub fn from_column(values: &[f64]) -> Result<Self> {
        Self::from_flat(1, values.to_vec())
    }

    /// Builds a matrix from a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDimensions`] if `n_dims` is zero,
    /// [`Error::DimensionMismatch`] if the buffer length is not a multiple of
    /// `n_dims`, and [`Error::NonFiniteCoordinate`] for NaN or infinite values.
    pub fn from_flat(n_dims: usize, data: Vec<f64>) -> Result<Self> {
        if n_dims == 0 {
            return Err(Error::ZeroDimensions);
        }
        if data.len() % n_dims != 0 {
            return Err(Error::DimensionMismatch {
                expected: n_dims,
                got: data.len() % n_dims,
                row: data.len() / n_dims,
            });
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteCoordinate { row: pos / n_dims });
        }
        Ok(Self { n_dims, data })
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the row has the wrong length
    /// and [`Error::NonFiniteCoordinate`] if it contains NaN or infinities.
    /// The matrix is left unchanged on error.
    pub fn push(&mut self, row: &[f64]) -> Result<()> {
        let index = self.len();
        if row.len() != self.n_dims {
            return Err(Error::DimensionMismatch {
                expected: self.n_dims,
                got: row.len(),
                row: index,
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteCoordinate { row: index });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Number of coordinates per row.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.n_dims
    }

    /// Returns `true` if the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_dims;
        &self.data[start..start + self.n_dims]
    }

    /// Iterates over rows in order.
    pub fn iter(&self) -> core::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.n_dims)
    }

    /// The underlying row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Gathers the given rows (repeats allowed) into a new matrix.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_dims);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            n_dims: self.n_dims,
            data,
        }
    }
}

impl<'a> IntoIterator for &'a Points {
    type Item = &'a [f64];
    type IntoIter = core::slice::ChunksExact<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
