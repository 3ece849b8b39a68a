//! Purpose
//! -------
//! Frequency-domain data built once per series and reused across every
//! likelihood evaluation: the cutoff-filtered frequency grid and the
//! packed multitaper periodogram, plus the lag kernel needed by the
//! debiased variant.
//!
//! Key behaviors
//! -------------
//! - The discrete Fourier transform of each component is computed with an
//!   FFT after applying a unit-energy taper (default `1/sqrt(n)`).
//! - Periodogram matrices are Hermitian and stored packed:
//!   `I_ij(omega) = (delta / 2 pi) J_i(omega) conj(J_j(omega))` for
//!   `i >= j`.
//! - The zero frequency is always dropped; an optional band
//!   `lower <= |omega| <= upper` (closed) filters the rest.
//!
//! Invariants & assumptions
//! ------------------------
//! - Tapers are normalized to unit energy before use, so scaling a taper
//!   does not change the periodogram.
//! - [`DebiasedWhittleData`] always uses the default taper; its expected
//!   periodogram is computed lag-by-lag and has no taper to match.
//! - The surviving grid is non-empty; an empty band is a construction
//!   error, not a zero-term sum.
//!
//! Conventions
//! -----------
//! - `omega` holds angular frequencies in DFT order after filtering.
//! - `grid_idx` (debiased) indexes the full `n`-point grid so FFT outputs
//!   can be gathered without recomputing the band.
//!
//! Downstream usage
//! ----------------
//! - [`crate::likelihood::WhittleLikelihood`] and
//!   [`crate::likelihood::DebiasedWhittleLikelihood`] own one of these and
//!   evaluate models against it.
//!
//! Testing notes
//! -------------
//! - Tests pin the DFT convention through single-tone and Parseval
//!   identities rather than re-deriving FFT outputs.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::likelihood::errors::{WhittleError, WhittleResult};
use crate::likelihood::freqs::{band_indices, fourier_frequencies};
use crate::likelihood::hermitian::{compact_index, compact_len};
use crate::series::TimeSeries;

/// Options for standard Whittle data: frequency band and optional taper.
///
/// Cutoffs bound `|omega|` with closed endpoints; the taper, when given,
/// must match the series length and is normalized to unit energy.
#[derive(Debug, Clone, PartialEq)]
pub struct WhittleOptions {
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
    pub taper: Option<Array1<f64>>,
}

impl WhittleOptions {
    /// Validated construction from a cutoff band; no taper.
    ///
    /// Errors with [`WhittleError::InvalidCutoffs`] unless
    /// `0 <= lower <= upper` (upper may be infinite).
    pub fn new(lower_cutoff: f64, upper_cutoff: f64) -> WhittleResult<Self> {
        validate_cutoffs(lower_cutoff, upper_cutoff)?;
        Ok(WhittleOptions { lower_cutoff, upper_cutoff, taper: None })
    }

    /// Attach a taper; length and energy are validated when the data is
    /// built, where the series length is known.
    pub fn with_taper(mut self, taper: Array1<f64>) -> Self {
        self.taper = Some(taper);
        self
    }
}

impl Default for WhittleOptions {
    /// Full frequency band, default taper.
    fn default() -> Self {
        WhittleOptions { lower_cutoff: 0.0, upper_cutoff: f64::INFINITY, taper: None }
    }
}

/// Options for debiased Whittle data: frequency band only.
///
/// The debiased variant pairs the observed periodogram with an expected
/// periodogram computed from the model autocovariance; tapering has no
/// counterpart on the expected side and is therefore not offered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebiasedWhittleOptions {
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
}

impl DebiasedWhittleOptions {
    /// Validated construction from a cutoff band.
    pub fn new(lower_cutoff: f64, upper_cutoff: f64) -> WhittleResult<Self> {
        validate_cutoffs(lower_cutoff, upper_cutoff)?;
        Ok(DebiasedWhittleOptions { lower_cutoff, upper_cutoff })
    }
}

impl Default for DebiasedWhittleOptions {
    fn default() -> Self {
        DebiasedWhittleOptions { lower_cutoff: 0.0, upper_cutoff: f64::INFINITY }
    }
}

/// Frequency-domain data for the standard Whittle likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct WhittleData {
    pub(crate) omega: Array1<f64>,
    pub(crate) periodogram: Array2<Complex64>,
    pub(crate) delta: f64,
    pub(crate) dim: usize,
}

impl WhittleData {
    /// Purpose
    /// -------
    /// Build the filtered frequency grid and packed periodogram for
    /// `series` under `options`.
    ///
    /// Parameters
    /// ----------
    /// - `series`: validated observations.
    /// - `options`: cutoff band and optional taper.
    ///
    /// Returns
    /// -------
    /// - `Ok(WhittleData)` ready for repeated evaluation.
    ///
    /// Errors
    /// ------
    /// - [`WhittleError::InvalidCutoffs`] for a malformed band.
    /// - [`WhittleError::TaperLengthMismatch`],
    ///   [`WhittleError::NonFiniteTaper`], [`WhittleError::ZeroEnergyTaper`]
    ///   for a malformed taper.
    /// - [`WhittleError::EmptyFrequencyGrid`] when the band excludes every
    ///   usable frequency.
    pub fn new(series: &TimeSeries, options: &WhittleOptions) -> WhittleResult<Self> {
        validate_cutoffs(options.lower_cutoff, options.upper_cutoff)?;
        let num_obs = series.num_obs();
        let taper = unit_energy_taper(num_obs, options.taper.as_ref())?;
        let grid = fourier_frequencies(num_obs, series.delta());
        let grid_idx = band_indices(grid.view(), options.lower_cutoff, options.upper_cutoff);
        if grid_idx.is_empty() {
            return Err(WhittleError::EmptyFrequencyGrid {
                lower: options.lower_cutoff,
                upper: options.upper_cutoff,
            });
        }

        let dft = tapered_dft(series.values(), taper.view());
        let scale = series.delta() / (2.0 * std::f64::consts::PI);
        let periodogram = packed_periodogram(&dft, &grid_idx, series.dim(), scale);
        let omega: Array1<f64> = grid_idx.iter().map(|&k| grid[k]).collect();

        Ok(WhittleData { omega, periodogram, delta: series.delta(), dim: series.dim() })
    }

    /// Surviving angular frequencies, in DFT order.
    pub fn omega(&self) -> ArrayView1<'_, f64> {
        self.omega.view()
    }

    /// Number of frequencies in the likelihood sum.
    pub fn num_freqs(&self) -> usize {
        self.omega.len()
    }

    /// Sampling interval of the underlying series.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Process dimension of the underlying series.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Frequency-domain data for the debiased Whittle likelihood.
///
/// Carries the observed periodogram (default taper), the indices of the
/// surviving frequencies into the full grid, and the triangular lag kernel
/// `kappa(t) = 1 - t / (2 n)` used when transforming model autocovariances
/// into expected periodograms.
#[derive(Debug, Clone)]
pub struct DebiasedWhittleData {
    pub(crate) omega: Array1<f64>,
    pub(crate) grid_idx: Vec<usize>,
    pub(crate) periodogram: Array2<Complex64>,
    pub(crate) kernel: Array1<f64>,
    pub(crate) delta: f64,
    pub(crate) num_obs: usize,
    pub(crate) dim: usize,
}

impl DebiasedWhittleData {
    /// Build debiased-Whittle data for `series` under `options`.
    ///
    /// Same validation and errors as [`WhittleData::new`] minus the taper
    /// paths; the observed periodogram always uses the default taper.
    pub fn new(series: &TimeSeries, options: &DebiasedWhittleOptions) -> WhittleResult<Self> {
        validate_cutoffs(options.lower_cutoff, options.upper_cutoff)?;
        let num_obs = series.num_obs();
        let taper = unit_energy_taper(num_obs, None)?;
        let grid = fourier_frequencies(num_obs, series.delta());
        let grid_idx = band_indices(grid.view(), options.lower_cutoff, options.upper_cutoff);
        if grid_idx.is_empty() {
            return Err(WhittleError::EmptyFrequencyGrid {
                lower: options.lower_cutoff,
                upper: options.upper_cutoff,
            });
        }

        let dft = tapered_dft(series.values(), taper.view());
        let scale = series.delta() / (2.0 * std::f64::consts::PI);
        let periodogram = packed_periodogram(&dft, &grid_idx, series.dim(), scale);
        let omega: Array1<f64> = grid_idx.iter().map(|&k| grid[k]).collect();
        let kernel =
            Array1::from_shape_fn(num_obs, |t| 1.0 - t as f64 / (2.0 * num_obs as f64));

        Ok(DebiasedWhittleData {
            omega,
            grid_idx,
            periodogram,
            kernel,
            delta: series.delta(),
            num_obs,
            dim: series.dim(),
        })
    }

    /// Surviving angular frequencies, in DFT order.
    pub fn omega(&self) -> ArrayView1<'_, f64> {
        self.omega.view()
    }

    /// Number of frequencies in the likelihood sum.
    pub fn num_freqs(&self) -> usize {
        self.omega.len()
    }

    /// Sampling interval of the underlying series.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Length of the underlying series.
    pub fn num_obs(&self) -> usize {
        self.num_obs
    }

    /// Process dimension of the underlying series.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn validate_cutoffs(lower: f64, upper: f64) -> WhittleResult<()> {
    if lower.is_nan() || upper.is_nan() || lower < 0.0 || lower > upper {
        return Err(WhittleError::InvalidCutoffs { lower, upper });
    }
    Ok(())
}

/// Resolve and normalize the taper: default `1/sqrt(n)` or a validated
/// user taper scaled to unit energy.
fn unit_energy_taper(num_obs: usize, taper: Option<&Array1<f64>>) -> WhittleResult<Array1<f64>> {
    match taper {
        None => Ok(Array1::from_elem(num_obs, 1.0 / (num_obs as f64).sqrt())),
        Some(weights) => {
            if weights.len() != num_obs {
                return Err(WhittleError::TaperLengthMismatch {
                    expected: num_obs,
                    actual: weights.len(),
                });
            }
            for (index, &value) in weights.iter().enumerate() {
                if !value.is_finite() {
                    return Err(WhittleError::NonFiniteTaper { index, value });
                }
            }
            let energy: f64 = weights.iter().map(|w| w * w).sum();
            if energy <= 0.0 {
                return Err(WhittleError::ZeroEnergyTaper);
            }
            Ok(weights / energy.sqrt())
        }
    }
}

/// Forward DFT of each tapered component: `J_i(omega_k) = sum_t h_t x_ti
/// exp(-2 pi i t k / n)`.
fn tapered_dft(values: ArrayView2<'_, f64>, taper: ArrayView1<'_, f64>) -> Array2<Complex64> {
    let (num_obs, dim) = values.dim();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(num_obs);

    let mut out = Array2::from_elem((num_obs, dim), Complex64::new(0.0, 0.0));
    let mut buffer = vec![Complex64::new(0.0, 0.0); num_obs];
    for col in 0..dim {
        for t in 0..num_obs {
            buffer[t] = Complex64::new(taper[t] * values[[t, col]], 0.0);
        }
        fft.process(&mut buffer);
        for t in 0..num_obs {
            out[[t, col]] = buffer[t];
        }
    }
    out
}

/// Gather the packed periodogram at the surviving grid indices.
fn packed_periodogram(
    dft: &Array2<Complex64>,
    grid_idx: &[usize],
    dim: usize,
    scale: f64,
) -> Array2<Complex64> {
    let packed = compact_len(dim);
    let mut out = Array2::from_elem((grid_idx.len(), packed), Complex64::new(0.0, 0.0));
    for (w, &k) in grid_idx.iter().enumerate() {
        for row in 0..dim {
            for col in 0..=row {
                out[[w, compact_index(row, col)]] = dft[[k, row]] * dft[[k, col]].conj() * scale;
            }
        }
    }
    out
}
