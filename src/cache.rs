//! Deduplication cache keyed by a fixed-precision encoding of parameter vectors.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::observations::Observations;

/// Number of decimal places preserved by [`CanonicalKey`].
pub const CANONICAL_DECIMALS: u32 = 6;

const LATTICE_SCALE: f64 = 1e6;

/// A parameter vector snapped to an integer lattice with spacing `1e-6`.
///
/// Two vectors share a key exactly when every coordinate rounds to the same
/// multiple of `1e-6` (ties round away from zero). Integers hash and compare
/// identically on every platform, unlike rounded floats. Coordinates beyond
/// roughly `±9.2e12` saturate to the ends of the `i64` range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanonicalKey(Box<[i64]>);

impl CanonicalKey {
    /// Encodes a parameter vector.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(x: &[f64]) -> Self {
        Self(x.iter().map(|&v| (v * LATTICE_SCALE).round() as i64).collect())
    }

    /// The lattice coordinates.
    #[must_use]
    pub fn lattice(&self) -> &[i64] {
        &self.0
    }

    /// Decodes the key back to (rounded) coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_vector(&self) -> Vec<f64> {
        self.0.iter().map(|&k| k as f64 / LATTICE_SCALE).collect()
    }
}

impl From<&[f64]> for CanonicalKey {
    fn from(x: &[f64]) -> Self {
        Self::new(x)
    }
}

/// Observed fit values indexed by [`CanonicalKey`].
///
/// The loop only consults the cache to skip candidates that were already
/// evaluated; surrogates are always fit from the observation set. Entries
/// are never removed.
///
/// # Examples
///
/// ```
/// use calibrator::EvaluationCache;
///
/// let mut cache = EvaluationCache::new();
/// cache.insert(&[0.123_456_7, 2.0], 1.5);
///
/// // Differences below the sixth decimal collapse to the same key.
/// assert_eq!(cache.get(&[0.123_457_1, 2.0]), Some(1.5));
/// assert!(!cache.contains(&[0.123_459, 2.0]));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "Vec<(CanonicalKey, f64)>", into = "Vec<(CanonicalKey, f64)>")
)]
pub struct EvaluationCache {
    entries: HashMap<CanonicalKey, f64>,
}

impl EvaluationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cache from every observation.
    ///
    /// When two observations share a key, the later one's value is kept.
    #[must_use]
    pub fn from_observations(observations: &Observations) -> Self {
        let mut cache = Self::new();
        for (x, y) in observations.iter() {
            cache.insert(x, y);
        }
        cache
    }

    /// Records `value` for `x`, returning the previous value if any.
    pub fn insert(&mut self, x: &[f64], value: f64) -> Option<f64> {
        self.entries.insert(CanonicalKey::new(x), value)
    }

    /// Returns `true` if a vector with the same key was recorded.
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        self.entries.contains_key(&CanonicalKey::new(x))
    }

    /// Looks up a vector's recorded value.
    #[must_use]
    pub fn get(&self, x: &[f64]) -> Option<f64> {
        self.entries.get(&CanonicalKey::new(x)).copied()
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get_key(&self, key: &CanonicalKey) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// Adds every entry of `other` whose key is not present yet.
    ///
    /// Existing entries are kept, so the cache still only grows.
    pub fn merge(&mut self, other: &Self) {
        for (key, &value) in &other.entries {
            self.entries.entry(key.clone()).or_insert(value);
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, f64)> {
        self.entries.iter().map(|(k, &v)| (k, v))
    }
}

impl From<Vec<(CanonicalKey, f64)>> for EvaluationCache {
    fn from(entries: Vec<(CanonicalKey, f64)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl From<EvaluationCache> for Vec<(CanonicalKey, f64)> {
    fn from(cache: EvaluationCache) -> Self {
        let mut entries: Vec<_> = cache.entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
