//! Fourier frequency grid and cutoff-band selection.
//!
//! Frequencies follow the usual DFT layout: index `k` of an `n`-point
//! transform maps to the angular frequency `2*pi*k / (n*delta)` for
//! `k <= (n - 1) / 2` and wraps to the negative half-axis afterwards.
//! The zero frequency is never used for likelihood sums (the mean is not
//! modeled), and an optional band `lower <= |omega| <= upper` restricts the
//! remaining grid with closed endpoints.

use ndarray::{Array1, ArrayView1};

/// Angular Fourier frequencies of an `n`-point transform at sampling
/// interval `delta`, in DFT order (non-negative half first, then the
/// wrapped negative half).
pub(crate) fn fourier_frequencies(n: usize, delta: f64) -> Array1<f64> {
    let half = (n - 1) / 2;
    let scale = 2.0 * std::f64::consts::PI / (n as f64 * delta);
    Array1::from_shape_fn(n, |k| {
        if k <= half {
            scale * k as f64
        } else {
            scale * (k as f64 - n as f64)
        }
    })
}

/// Indices into a DFT-ordered frequency grid that survive the cutoff band.
///
/// Index 0 (the zero frequency) is always excluded; every other index is
/// kept when `lower <= |omega[k]| <= upper`.
pub(crate) fn band_indices(omega: ArrayView1<'_, f64>, lower: f64, upper: f64) -> Vec<usize> {
    omega
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, w)| {
            let abs = w.abs();
            lower <= abs && abs <= upper
        })
        .map(|(k, _)| k)
        .collect()
}
