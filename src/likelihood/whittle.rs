//! Purpose
//! -------
//! The public likelihood objects. [`WhittleLikelihood`] scores a model's
//! aliased spectral density against the observed periodogram;
//! [`DebiasedWhittleLikelihood`] scores the model's expected periodogram
//! instead, which removes the finite-sample bias of the standard sum and
//! swaps the observed Hessian for the always-PSD expected one.
//!
//! Key behaviors
//! -------------
//! - Construction validates the series/model dimension match, then builds
//!   the frequency-domain data and evaluation storage once; every
//!   evaluation afterwards reuses them without allocating.
//! - [`WhittleLikelihood::evaluate`] returns the value;
//!   [`WhittleLikelihood::evaluate_into`] computes any subset of value,
//!   gradient, and Hessian in a single pass over the frequencies.
//! - The standard variant's Hessian is the observed one and needs the
//!   model's second-derivative hooks; the debiased variant's is the
//!   expected one and needs first derivatives only, so models without
//!   second-derivative hooks still expose curvature there.
//!
//! Invariants & assumptions
//! ------------------------
//! - The value is a negated log-likelihood up to constants: smaller is
//!   better, and fitting minimizes it directly.
//! - A model spectrum that is not positive definite at some frequency
//!   yields an infinite value and NaN derivative buffers, never an error;
//!   errors are reserved for malformed inputs and missing model hooks.
//! - Evaluation takes `&mut self`: storage is rewritten on every call, so
//!   a likelihood object serves one evaluation at a time and concurrent
//!   callers must construct their own.
//!
//! Conventions
//! -----------
//! - `evaluate_into(theta, want_value, gradient, hessian)` returns
//!   `Ok(None)` when `want_value` is false; requested buffers are always
//!   fully overwritten, requested or not returned.
//!
//! Downstream usage
//! ----------------
//! - The fitting layer drives `evaluate_into` through its objective
//!   adapter; inference consumes the expected Hessian at the optimum.
//!
//! Testing notes
//! -------------
//! - Values, gradients, and Hessians are pinned against an independent
//!   direct-DFT evaluation of the same sums recorded at full precision.

use std::fmt;
use std::marker::PhantomData;

use ndarray::{Array1, Array2, ArrayView1};

use crate::likelihood::core::{likelihood_sums, HessianKind};
use crate::likelihood::data::{
    DebiasedWhittleData, DebiasedWhittleOptions, WhittleData, WhittleOptions,
};
use crate::likelihood::errors::{WhittleError, WhittleResult};
use crate::likelihood::storage::{EvalRequest, Storage};
use crate::models::SpectralModel;
use crate::series::TimeSeries;

/// Standard Whittle likelihood of model family `M` for one series.
///
/// Owns the filtered periodogram and the per-evaluation scratch; the
/// model itself is a type parameter and is instantiated from each
/// parameter vector handed to the evaluation calls.
pub struct WhittleLikelihood<M: SpectralModel> {
    data: WhittleData,
    storage: Storage,
    model: PhantomData<M>,
}

impl<M: SpectralModel> WhittleLikelihood<M> {
    /// Purpose
    /// -------
    /// Build a standard Whittle likelihood for `series` under `options`.
    ///
    /// Parameters
    /// ----------
    /// - `series`: validated observations with `M::DIM` components.
    /// - `options`: cutoff band and optional taper.
    ///
    /// Returns
    /// -------
    /// - `Ok(WhittleLikelihood)` ready for repeated evaluation.
    ///
    /// Errors
    /// ------
    /// - [`WhittleError::DimensionMismatch`] when the series column count
    ///   differs from `M::DIM`.
    /// - Everything [`WhittleData::new`] raises for malformed options.
    pub fn new(series: &TimeSeries, options: &WhittleOptions) -> WhittleResult<Self> {
        if series.dim() != M::DIM {
            return Err(WhittleError::DimensionMismatch {
                expected: M::DIM,
                actual: series.dim(),
            });
        }
        let data = WhittleData::new(series, options)?;
        let storage = Storage::spectral(M::DIM, M::NPARAMS, data.num_freqs());
        Ok(WhittleLikelihood { data, storage, model: PhantomData })
    }

    /// Likelihood value at `theta`.
    ///
    /// Validates the parameter vector, instantiates the model, and runs
    /// the value-only frequency walk. Infinite when the model spectrum is
    /// not positive definite somewhere on the grid.
    pub fn evaluate(&mut self, theta: ArrayView1<'_, f64>) -> WhittleResult<f64> {
        self.run(theta, None, None)
    }

    /// Purpose
    /// -------
    /// Evaluate any subset of value, gradient, and observed Hessian at
    /// `theta` in one pass.
    ///
    /// Parameters
    /// ----------
    /// - `theta`: parameter vector of length `M::NPARAMS`.
    /// - `want_value`: whether to return the value.
    /// - `gradient`, `hessian`: optional output buffers, overwritten in
    ///   place when present.
    ///
    /// Returns
    /// -------
    /// - `Ok(Some(value))` when `want_value`, `Ok(None)` otherwise; the
    ///   buffers are populated either way.
    ///
    /// Errors
    /// ------
    /// - [`WhittleError::ThetaLengthMismatch`] /
    ///   [`WhittleError::NonFiniteTheta`] for a malformed `theta`.
    /// - [`WhittleError::GradientShapeMismatch`] /
    ///   [`WhittleError::HessianShapeMismatch`] for misshapen buffers.
    /// - The model's capability errors when a requested derivative hook
    ///   is not implemented.
    pub fn evaluate_into(
        &mut self,
        theta: ArrayView1<'_, f64>,
        want_value: bool,
        gradient: Option<&mut Array1<f64>>,
        hessian: Option<&mut Array2<f64>>,
    ) -> WhittleResult<Option<f64>> {
        let value = self.run(theta, gradient, hessian)?;
        Ok(want_value.then_some(value))
    }

    /// Validate, populate spectral storage, and walk the frequencies. The
    /// value falls out of the shared intermediates, so it is computed and
    /// returned even when the caller discards it.
    fn run(
        &mut self,
        theta: ArrayView1<'_, f64>,
        gradient: Option<&mut Array1<f64>>,
        hessian: Option<&mut Array2<f64>>,
    ) -> WhittleResult<f64> {
        validate_theta(M::NPARAMS, theta)?;
        validate_outputs(
            M::NPARAMS,
            gradient.as_ref().map(|grad| grad.len()),
            hessian.as_ref().map(|hess| hess.dim()),
        )?;

        let request = EvalRequest {
            gradient: gradient.is_some() || hessian.is_some(),
            hessian: hessian.is_some(),
        };
        let model = M::from_params(theta);
        self.storage.populate_spectral(&model, self.data.omega(), self.data.delta, request)?;
        Ok(likelihood_sums(
            &mut self.storage,
            &self.data.periodogram,
            M::DIM,
            M::NPARAMS,
            HessianKind::Observed,
            gradient,
            hessian,
        ))
    }

    /// Frequency-domain data this likelihood evaluates against.
    pub fn data(&self) -> &WhittleData {
        &self.data
    }
}

impl<M: SpectralModel> fmt::Display for WhittleLikelihood<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Whittle likelihood for the {} model ({} frequencies)",
            M::NAME,
            self.data.num_freqs()
        )
    }
}

/// Debiased Whittle likelihood of model family `M` for one series.
///
/// Shares the observed periodogram with the standard variant (always
/// under the default taper) but compares it to the model's expected
/// periodogram, synthesized from the autocovariance at every evaluation.
pub struct DebiasedWhittleLikelihood<M: SpectralModel> {
    data: DebiasedWhittleData,
    storage: Storage,
    model: PhantomData<M>,
}

impl<M: SpectralModel> DebiasedWhittleLikelihood<M> {
    /// Build a debiased Whittle likelihood for `series` under `options`.
    ///
    /// Same validation and errors as [`WhittleLikelihood::new`] minus the
    /// taper paths; the storage additionally carries the lag-domain
    /// Fourier workspace for expected-periodogram synthesis.
    pub fn new(series: &TimeSeries, options: &DebiasedWhittleOptions) -> WhittleResult<Self> {
        if series.dim() != M::DIM {
            return Err(WhittleError::DimensionMismatch {
                expected: M::DIM,
                actual: series.dim(),
            });
        }
        let data = DebiasedWhittleData::new(series, options)?;
        let storage = Storage::expected(M::DIM, M::NPARAMS, data.num_freqs(), data.num_obs());
        Ok(DebiasedWhittleLikelihood { data, storage, model: PhantomData })
    }

    /// Likelihood value at `theta`; see [`WhittleLikelihood::evaluate`].
    pub fn evaluate(&mut self, theta: ArrayView1<'_, f64>) -> WhittleResult<f64> {
        self.run(theta, None, None)
    }

    /// Evaluate any subset of value, gradient, and expected Hessian at
    /// `theta` in one pass; see [`WhittleLikelihood::evaluate_into`].
    ///
    /// The Hessian here is the expected one, built from first derivatives
    /// alone, so a model only needs autocovariance gradients to supply
    /// it.
    pub fn evaluate_into(
        &mut self,
        theta: ArrayView1<'_, f64>,
        want_value: bool,
        gradient: Option<&mut Array1<f64>>,
        hessian: Option<&mut Array2<f64>>,
    ) -> WhittleResult<Option<f64>> {
        let value = self.run(theta, gradient, hessian)?;
        Ok(want_value.then_some(value))
    }

    fn run(
        &mut self,
        theta: ArrayView1<'_, f64>,
        gradient: Option<&mut Array1<f64>>,
        hessian: Option<&mut Array2<f64>>,
    ) -> WhittleResult<f64> {
        validate_theta(M::NPARAMS, theta)?;
        validate_outputs(
            M::NPARAMS,
            gradient.as_ref().map(|grad| grad.len()),
            hessian.as_ref().map(|hess| hess.dim()),
        )?;

        let request = EvalRequest {
            gradient: gradient.is_some() || hessian.is_some(),
            hessian: hessian.is_some(),
        };
        let model = M::from_params(theta);
        self.storage.populate_expected(&model, &self.data, request)?;
        Ok(likelihood_sums(
            &mut self.storage,
            &self.data.periodogram,
            M::DIM,
            M::NPARAMS,
            HessianKind::Expected,
            gradient,
            hessian,
        ))
    }

    /// Frequency-domain data this likelihood evaluates against.
    pub fn data(&self) -> &DebiasedWhittleData {
        &self.data
    }
}

impl<M: SpectralModel> fmt::Display for DebiasedWhittleLikelihood<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Debiased Whittle likelihood for the {} model ({} frequencies)",
            M::NAME,
            self.data.num_freqs()
        )
    }
}

/// Shared parameter validation: length against the model's parameter
/// count, then finiteness coordinate by coordinate.
fn validate_theta(nparams: usize, theta: ArrayView1<'_, f64>) -> WhittleResult<()> {
    if theta.len() != nparams {
        return Err(WhittleError::ThetaLengthMismatch {
            expected: nparams,
            actual: theta.len(),
        });
    }
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(WhittleError::NonFiniteTheta { index, value });
        }
    }
    Ok(())
}

/// Shared output-buffer shape checks against the model's parameter count.
fn validate_outputs(
    nparams: usize,
    gradient_len: Option<usize>,
    hessian_dim: Option<(usize, usize)>,
) -> WhittleResult<()> {
    if let Some(len) = gradient_len {
        if len != nparams {
            return Err(WhittleError::GradientShapeMismatch { expected: nparams, actual: len });
        }
    }
    if let Some(dim) = hessian_dim {
        if dim != (nparams, nparams) {
            return Err(WhittleError::HessianShapeMismatch {
                expected: (nparams, nparams),
                actual: dim,
            });
        }
    }
    Ok(())
}
