//! Seeded uniform candidate grids.

use crate::error::{Error, Result};
use crate::points::Points;
use crate::rng_util;

/// Default number of grid points sampled for a calibration run.
pub const DEFAULT_GRID_SIZE: usize = 200;

/// Samples `n_samples` candidate vectors uniformly inside per-dimension bounds.
///
/// Each coordinate is drawn from `[low, high)` with a generator seeded by
/// `seed`; a degenerate range (`low == high`) always yields `low`. The same
/// bounds, size and seed always produce the same grid.
///
/// # Errors
///
/// Returns [`Error::ZeroDimensions`] if `bounds` is empty and
/// [`Error::InvalidBounds`] if any range is reversed or not finite.
///
/// # Examples
///
/// ```
/// use calibrator::sample_grid;
///
/// let grid = sample_grid(&[(-5.0, 5.0), (0.0, 0.0)], 100, 42).unwrap();
/// assert_eq!(grid.len(), 100);
/// assert!(grid.iter().all(|x| (-5.0..5.0).contains(&x[0]) && x[1] == 0.0));
/// ```
pub fn sample_grid(bounds: &[(f64, f64)], n_samples: usize, seed: u64) -> Result<Points> {
    for &(low, high) in bounds {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(Error::InvalidBounds { low, high });
        }
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut points = Points::with_capacity(bounds.len(), n_samples)?;
    let mut row = vec![0.0; bounds.len()];
    for _ in 0..n_samples {
        for (slot, &(low, high)) in row.iter_mut().zip(bounds) {
            #[allow(clippy::float_cmp)]
            let degenerate = low == high;
            *slot = if degenerate {
                low
            } else {
                rng_util::f64_range(&mut rng, low, high)
            };
        }
        points.push(&row)?;
    }
    Ok(points)
}
