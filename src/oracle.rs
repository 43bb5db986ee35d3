//! The [`Oracle`] trait: the expensive evaluation being calibrated.
//!
//! Closures returning `Result<f64, E>` are oracles already:
//!
//! ```
//! use calibrator::Oracle;
//!
//! let mut oracle = |x: &[f64]| Ok::<_, std::io::Error>(x[0] * x[0]);
//! assert_eq!(oracle.evaluate(&[3.0]).unwrap(), 9.0);
//! ```
//!
//! Implement the trait on a struct when the evaluation carries state of its
//! own, such as a simulator handle or a reference data set:
//!
//! ```
//! use calibrator::Oracle;
//!
//! struct Misfit {
//!     observed: Vec<f64>,
//! }
//!
//! impl Oracle for Misfit {
//!     type Error = core::convert::Infallible;
//!
//!     fn evaluate(&mut self, x: &[f64]) -> Result<f64, Self::Error> {
//!         let slope = x[0];
//!         Ok(self
//!             .observed
//!             .iter()
//!             .enumerate()
//!             .map(|(i, y)| (slope * i as f64 - y).powi(2))
//!             .sum())
//!     }
//! }
//!
//! let mut oracle = Misfit { observed: vec![0.0, 2.0, 4.0] };
//! assert_eq!(oracle.evaluate(&[2.0]).unwrap(), 0.0);
//! ```

/// Maps a parameter vector to a scalar fit value (lower is better).
///
/// Called at most once per loop iteration, synchronously. The loop never
/// retries a failed evaluation; the error is handed back to the caller
/// unchanged inside [`RunError::Oracle`](crate::RunError::Oracle).
pub trait Oracle {
    /// The error type returned when an evaluation fails.
    type Error;

    /// Evaluates the fit value at `x`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the evaluation fails.
    fn evaluate(&mut self, x: &[f64]) -> Result<f64, Self::Error>;
}

impl<F, E> Oracle for F
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    type Error = E;

    fn evaluate(&mut self, x: &[f64]) -> Result<f64, E> {
        self(x)
    }
}
