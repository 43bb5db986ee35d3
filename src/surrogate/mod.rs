//! Surrogate models: cheap regression fits of the oracle's response surface.
//!
//! Three families share the [`Surrogate`] prediction contract:
//!
//! | Family | Config | Fitted model | Randomness |
//! |--------|--------|--------------|------------|
//! | Polynomial least squares | [`PolynomialConfig`] | [`PolynomialSurrogate`] | none |
//! | CART regression tree | [`TreeConfig`] | [`TreeSurrogate`] | own `seed` |
//! | Feed-forward network | [`NeuralConfig`] | [`NeuralSurrogate`] | caller's RNG |
//!
//! A [`ModelFamily`] holds one family's settings and fits a [`Model`] from an
//! [`Observations`] set. Fitted models are immutable, so concurrent
//! predictions on one instance are safe.
//!
//! ```
//! use calibrator::Observations;
//! use calibrator::surrogate::{ModelFamily, PolynomialConfig, Surrogate};
//!
//! let obs = Observations::from_scalars(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
//! let family = ModelFamily::Polynomial(PolynomialConfig::new(1));
//! let model = family.fit(&obs, &mut fastrand::Rng::with_seed(0)).unwrap();
//!
//! assert!((model.predict_one(&[10.0]) - 21.0).abs() < 1e-8);
//! ```

pub mod neural;
pub mod polynomial;
pub mod tree;

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use neural::{Activation, NeuralConfig, NeuralSurrogate};
pub use polynomial::{PolynomialConfig, PolynomialSurrogate};
pub use tree::{TreeConfig, TreeSurrogate};

use crate::error::{Error, Result};
use crate::observations::Observations;
use crate::points::Points;

/// A fitted regression function from parameter vectors to predicted fit values.
pub trait Surrogate {
    /// Predicts the value at one parameter vector.
    fn predict_one(&self, x: &[f64]) -> f64;

    /// Predicts the value at every row of `points`.
    fn predict(&self, points: &Points) -> Vec<f64> {
        points.iter().map(|x| self.predict_one(x)).collect()
    }
}

/// Tag naming a surrogate family.
///
/// Parses case-insensitively from `"poly"`/`"polynomial"`, `"tree"` and
/// `"nn"`/`"neural"`.
///
/// ```
/// use calibrator::surrogate::FamilyKind;
///
/// assert_eq!("NN".parse::<FamilyKind>().unwrap(), FamilyKind::Neural);
/// assert!("forest".parse::<FamilyKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FamilyKind {
    /// Polynomial least squares.
    Polynomial,
    /// Regression tree.
    Tree,
    /// Feed-forward neural network.
    Neural,
}

impl FamilyKind {
    /// The canonical short tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polynomial => "poly",
            Self::Tree => "tree",
            Self::Neural => "nn",
        }
    }
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poly" | "polynomial" => Ok(Self::Polynomial),
            "tree" => Ok(Self::Tree),
            "nn" | "neural" => Ok(Self::Neural),
            _ => Err(Error::UnknownModelFamily(s.to_owned())),
        }
    }
}

/// A surrogate family together with its settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelFamily {
    /// Polynomial least squares.
    Polynomial(PolynomialConfig),
    /// Regression tree.
    Tree(TreeConfig),
    /// Feed-forward neural network.
    Neural(NeuralConfig),
}

impl ModelFamily {
    /// The family's tag.
    #[must_use]
    pub fn kind(&self) -> FamilyKind {
        match self {
            Self::Polynomial(_) => FamilyKind::Polynomial,
            Self::Tree(_) => FamilyKind::Tree,
            Self::Neural(_) => FamilyKind::Neural,
        }
    }

    /// Checks the family's settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamilyConfig`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Polynomial(_) => Ok(()),
            Self::Tree(config) => config.validate(),
            Self::Neural(config) => config.validate(),
        }
    }

    /// Fits one model of this family.
    ///
    /// `rng` supplies weight initialization and dropout for neural networks;
    /// the other families ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamilyConfig`] if the settings are invalid.
    pub fn fit(&self, observations: &Observations, rng: &mut fastrand::Rng) -> Result<Model> {
        self.validate()?;
        let x = observations.points();
        let y = observations.values();
        Ok(match self {
            Self::Polynomial(config) => Model::Polynomial(PolynomialSurrogate::fit(x, y, config)),
            Self::Tree(config) => Model::Tree(TreeSurrogate::fit(x, y, config)),
            Self::Neural(config) => Model::Neural(NeuralSurrogate::fit(x, y, config, rng)),
        })
    }
}

impl Default for ModelFamily {
    fn default() -> Self {
        Self::Polynomial(PolynomialConfig::default())
    }
}

impl From<FamilyKind> for ModelFamily {
    /// The family with default settings.
    fn from(kind: FamilyKind) -> Self {
        match kind {
            FamilyKind::Polynomial => Self::Polynomial(PolynomialConfig::default()),
            FamilyKind::Tree => Self::Tree(TreeConfig::default()),
            FamilyKind::Neural => Self::Neural(NeuralConfig::default()),
        }
    }
}

impl FromStr for ModelFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<FamilyKind>().map(Self::from)
    }
}

/// A fitted surrogate of any family.
#[derive(Clone, Debug)]
pub enum Model {
    /// A fitted polynomial.
    Polynomial(PolynomialSurrogate),
    /// A fitted regression tree.
    Tree(TreeSurrogate),
    /// A trained neural network.
    Neural(NeuralSurrogate),
}

impl Surrogate for Model {
    fn predict_one(&self, x: &[f64]) -> f64 {
        match self {
            Self::Polynomial(m) => m.predict_one(x),
            Self::Tree(m) => m.predict_one(x),
            Self::Neural(m) => m.predict_one(x),
        }
    }

    fn predict(&self, points: &Points) -> Vec<f64> {
        match self {
            Self::Polynomial(m) => m.predict(points),
            Self::Tree(m) => m.predict(points),
            Self::Neural(m) => m.predict(points),
        }
    }
}
