//! Numeric helpers shared by the belief model, the policy evaluator and the
//! simulation harness.

use rand::{Rng, distr::StandardUniform};

/// Relative tolerance used by [`is_close`] (same default as numpy's `isclose`).
pub const CLOSE_RTOL: f64 = 1e-5;
/// Absolute tolerance used by [`is_close`].
pub const CLOSE_ATOL: f64 = 1e-8;

/// Returns true when `a` and `b` are equal within `CLOSE_ATOL + CLOSE_RTOL * |b|`.
///
/// Infinities compare equal only to themselves and NaN never compares equal.
///
/// # Examples
///
/// ```
/// use nudge::utils::is_close;
///
/// assert!(is_close(1.0, 1.0 + 1e-9));
/// assert!(!is_close(1.0, 1.1));
/// assert!(is_close(f64::NEG_INFINITY, f64::NEG_INFINITY));
/// assert!(!is_close(f64::NAN, f64::NAN));
/// ```
pub fn is_close(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= CLOSE_ATOL + CLOSE_RTOL * b.abs()
}

/// `n` evenly spaced values over the closed interval `[start, stop]`.
///
/// # Examples
///
/// ```
/// use nudge::utils::linspace;
///
/// assert_eq!(linspace(0.0, 1000.0, 3), vec![0.0, 500.0, 1000.0]);
/// assert_eq!(linspace(4.0, 9.0, 1), vec![4.0]);
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Numerically stable softmax.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0 / values.len() as f64; values.len()];
    }
    let exp: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

/// Draw an index from a categorical distribution.
///
/// Weights need not be normalized. Non-positive totals fall back to a uniform
/// draw; the last index is returned if rounding leaves the threshold uncrossed.
///
/// # Panics
///
/// Panics if `weights` is empty.
pub fn sample_categorical<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    assert!(!weights.is_empty(), "categorical requires at least one weight");
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return rng.random_range(0..weights.len());
    }
    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;
    for (idx, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight <= 0.0 {
            continue;
        }
        if threshold < weight {
            return idx;
        }
        threshold -= weight;
    }
    weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(weights.len() - 1)
}

/// Index of the value closest to `target`; ties resolve to the lowest index.
pub fn nearest_index(values: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, &value) in values.iter().enumerate() {
        let distance = (value - target).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}
