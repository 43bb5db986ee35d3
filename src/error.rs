/// Configuration and input errors.
///
/// Every variant is raised before the oracle is called for the affected
/// iteration and is never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Returned when an acquisition function name is not recognized.
    #[error("unknown acquisition function: {0:?}")]
    UnknownAcquisition(String),

    /// Returned when a surrogate model family tag is not recognized.
    #[error("unknown model family: {0:?}")]
    UnknownModelFamily(String),

    /// Returned when a surrogate family is configured with invalid settings.
    #[error("invalid {family} configuration: {reason}")]
    InvalidFamilyConfig {
        /// The family whose configuration was rejected.
        family: &'static str,
        /// Why the configuration was rejected.
        reason: String,
    },

    /// Returned when a loop option is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidConfig {
        /// The offending configuration field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when an ensemble would contain no models.
    #[error("invalid ensemble size: {0} (must be at least 1)")]
    InvalidEnsembleSize(usize),

    /// Returned when a bound is NaN or infinite, or the lower bound is greater
    /// than the upper bound.
    #[error("invalid bounds: low ({low}) and high ({high}) must be finite with low <= high")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when parameter vectors would have zero dimensions.
    #[error("parameter vectors must have at least one dimension")]
    ZeroDimensions,

    /// Returned when a vector's length differs from the expected dimensionality.
    #[error("dimension mismatch: expected {expected} dimensions but row {row} has {got}")]
    DimensionMismatch {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of dimensions.
        got: usize,
        /// The index of the offending row.
        row: usize,
    },

    /// Returned when the parameter matrix and value vector are not aligned.
    #[error("length mismatch: {rows} parameter rows but {values} values")]
    LengthMismatch {
        /// Number of parameter rows.
        rows: usize,
        /// Number of fit values.
        values: usize,
    },

    /// Returned when a parameter vector contains NaN or an infinity.
    #[error("row {row} contains a non-finite coordinate")]
    NonFiniteCoordinate {
        /// The index of the offending row.
        row: usize,
    },

    /// Returned when a seed observation has a non-finite fit value.
    #[error("observation {index} has a non-finite fit value")]
    NonFiniteValue {
        /// The index of the offending observation.
        index: usize,
    },
}

pub type Result<T> = core::result::Result<T, Error>;

/// Error returned by a loop invocation.
///
/// The oracle's own error type is carried unchanged in
/// [`RunError::Oracle`], so callers can match on it directly.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E> {
    /// The loop or one of its components rejected its input.
    #[error(transparent)]
    Learner(#[from] Error),

    /// The oracle failed; the loop stopped at this iteration.
    #[error("oracle failed at iteration {iteration}")]
    Oracle {
        /// The iteration whose evaluation failed.
        iteration: usize,
        /// The error returned by the oracle.
        #[source]
        source: E,
    },

    /// The oracle returned NaN or an infinity.
    #[error("oracle returned a non-finite value ({value}) at iteration {iteration}")]
    NonFiniteValue {
        /// The iteration whose evaluation produced the value.
        iteration: usize,
        /// The value returned by the oracle.
        value: f64,
    },
}

impl<E> RunError<E> {
    /// Returns the oracle's error if this failure came from the oracle.
    pub fn into_oracle_error(self) -> Option<E> {
        match self {
            Self::Oracle { source, .. } => Some(source),
            _ => None,
        }
    }
}
