//! Acquisition functions: scoring and ranking candidate vectors.
//!
//! Both functions turn per-candidate ensemble statistics into a score and
//! an ordering of the grid. Lower confidence bound favors small
//! `mu - kappa·sigma` and ranks ascending; expected improvement favors a
//! large expected gain over the incumbent and ranks descending.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default exploration margin for expected improvement.
pub const DEFAULT_XI: f64 = 0.01;

/// Floor applied to `sigma` before dividing by it in expected improvement.
pub const SIGMA_FLOOR: f64 = 1e-8;

/// The acquisition rule used to pick the next candidate.
///
/// ```
/// use calibrator::Acquisition;
///
/// assert_eq!("LCB".parse::<Acquisition>().unwrap(), Acquisition::LowerConfidenceBound);
/// assert!("ucb".parse::<Acquisition>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Acquisition {
    /// `mu - kappa * sigma`, with kappa annealed over the run.
    #[default]
    LowerConfidenceBound,
    /// Expected improvement over the incumbent, with margin `xi`.
    ExpectedImprovement {
        /// Exploration margin subtracted from the improvement.
        xi: f64,
    },
}

impl Acquisition {
    /// Expected improvement with the default margin.
    #[must_use]
    pub fn expected_improvement() -> Self {
        Self::ExpectedImprovement { xi: DEFAULT_XI }
    }

    /// The direction in which this rule's scores are ranked.
    #[must_use]
    pub fn order(self) -> RankOrder {
        match self {
            Self::LowerConfidenceBound => RankOrder::Ascending,
            Self::ExpectedImprovement { .. } => RankOrder::Descending,
        }
    }

    /// Scores every candidate.
    ///
    /// `kappa` is used by the confidence bound and `y_best` by expected
    /// improvement; each rule ignores the other argument.
    #[must_use]
    pub fn score(self, mu: &[f64], sigma: &[f64], kappa: f64, y_best: f64) -> Vec<f64> {
        match self {
            Self::LowerConfidenceBound => lower_confidence_bound(mu, sigma, kappa),
            Self::ExpectedImprovement { xi } => expected_improvement(mu, sigma, y_best, xi),
        }
    }

    /// The canonical name (`"lcb"` or `"ei"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowerConfidenceBound => "lcb",
            Self::ExpectedImprovement { .. } => "ei",
        }
    }
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Acquisition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lcb" => Ok(Self::LowerConfidenceBound),
            "ei" => Ok(Self::expected_improvement()),
            _ => Err(Error::UnknownAcquisition(s.to_owned())),
        }
    }
}

/// Which end of the score range is best.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankOrder {
    /// Lowest score first.
    Ascending,
    /// Highest score first.
    Descending,
}

/// Lower confidence bound `mu - kappa * sigma` per candidate.
///
/// # Panics
///
/// Panics if `mu` and `sigma` have different lengths.
#[must_use]
pub fn lower_confidence_bound(mu: &[f64], sigma: &[f64], kappa: f64) -> Vec<f64> {
    assert_eq!(mu.len(), sigma.len(), "mu and sigma must have the same length");
    mu.iter().zip(sigma).map(|(m, s)| m - kappa * s).collect()
}

/// Expected improvement below `y_best` per candidate.
///
/// `improvement = y_best - mu - xi` and `Z = improvement / max(sigma, 1e-8)`;
/// the score is `improvement·Φ(Z) + max(sigma, 1e-8)·φ(Z)`.
///
/// # Panics
///
/// Panics if `mu` and `sigma` have different lengths.
///
/// # Examples
///
/// ```
/// use calibrator::acquisition::expected_improvement;
///
/// let ei = expected_improvement(&[0.0, 1.0], &[1.0, 1.0], 0.5, 0.0);
/// assert!(ei[0] > ei[1]);
/// ```
#[must_use]
pub fn expected_improvement(mu: &[f64], sigma: &[f64], y_best: f64, xi: f64) -> Vec<f64> {
    assert_eq!(mu.len(), sigma.len(), "mu and sigma must have the same length");
    mu.iter()
        .zip(sigma)
        .map(|(&m, &s)| {
            let s = s.max(SIGMA_FLOOR);
            let improvement = y_best - m - xi;
            let z = improvement / s;
            improvement * norm_cdf(z) + s * norm_pdf(z)
        })
        .collect()
}

/// Candidate indices ordered from best to worst score.
///
/// The sort is stable, so equal scores keep grid order. NaN scores sort last
/// in either direction.
///
/// ```
/// use calibrator::acquisition::{rank_candidates, RankOrder};
///
/// let scores = [2.0, f64::NAN, 1.0, 2.0];
/// assert_eq!(rank_candidates(&scores, RankOrder::Ascending), vec![2, 0, 3, 1]);
/// assert_eq!(rank_candidates(&scores, RankOrder::Descending), vec![0, 3, 2, 1]);
/// ```
#[must_use]
pub fn rank_candidates(scores: &[f64], order: RankOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| compare_scores(scores[a], scores[b], order));
    indices
}

fn compare_scores(a: f64, b: f64, order: RankOrder) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match order {
            RankOrder::Ascending => a.total_cmp(&b),
            RankOrder::Descending => b.total_cmp(&a),
        },
    }
}

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun 26.2.17).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let poly = 0.319_381_530 * t - 0.356_563_782 * t2 + 1.781_477_937 * t3 - 1.821_255_978 * t4
        + 1.330_274_429 * t5;
    let upper_tail = norm_pdf(abs_x) * poly;

    if x >= 0.0 {
        1.0 - upper_tail
    } else {
        upper_tail
    }
}
