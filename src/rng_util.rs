/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Draw `n` indices from `0..n` with replacement.
pub(crate) fn bootstrap_indices(rng: &mut fastrand::Rng, n: usize) -> Vec<usize> {
    (0..n).map(|_| rng.usize(0..n)).collect()
}

/// A random permutation of `0..n` (Fisher-Yates).
pub(crate) fn permutation(rng: &mut fastrand::Rng, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.usize(0..=i);
        indices.swap(i, j);
    }
    indices
}
