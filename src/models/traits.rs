//! Purpose
//! -------
//! The model seam for Whittle likelihood evaluation: a parametric family
//! exposes its spectral density (and, when available, derivatives and
//! autocovariance) through accumulation hooks, and the evaluation core
//! drives those hooks over the frequency grid.
//!
//! Key behaviors
//! -------------
//! - Hooks **add into** their output buffer instead of overwriting it, so
//!   composite models (sums of components) chain calls on one buffer with
//!   no merge step.
//! - Derivative hooks default to a capability error naming the model, so a
//!   family can ship value-only support and still fit via finite
//!   differences at the optimizer layer.
//! - Aliased variants fold the spectral density over `2*pi/delta` shifts;
//!   families with a closed-form aliased density can override them.
//!
//! Invariants & assumptions
//! ------------------------
//! - Spectral buffers hold the packed lower triangle of a Hermitian
//!   `DIM x DIM` matrix (`DIM * (DIM + 1) / 2` entries, row-major).
//! - Autocovariance buffers hold the full `DIM x DIM` matrix row-major,
//!   because `C(tau)` need not be symmetric across components; callers use
//!   `C(-tau) = C(tau)^T`.
//! - Hessian hooks are called once per unordered parameter pair `(j, k)`
//!   with `j >= k`.
//! - Parameters are taken as-is: values outside a family's sensible region
//!   surface as non-finite likelihood values downstream, never as errors
//!   here.
//!
//! Conventions
//! -----------
//! - `omega` is angular frequency; `tau` is a lag in time units.
//! - Spectral densities follow the two-sided convention with
//!   `integral f = variance` over the whole real line.
//!
//! Downstream usage
//! ----------------
//! - [`crate::likelihood::WhittleLikelihood`] and
//!   [`crate::likelihood::DebiasedWhittleLikelihood`] populate their
//!   frequency-indexed storage through these hooks.
//!
//! Testing notes
//! -------------
//! - Each concrete family checks its formulas against finite differences
//!   in its own module; the default-error hooks are exercised where a
//!   family deliberately omits them.

use ndarray::ArrayView1;
use num_complex::Complex64;

use crate::likelihood::errors::{WhittleError, WhittleResult};

/// Folds kept on each side when truncating the aliasing sum.
const ALIAS_WRAPS: i32 = 5;

/// A stationary parametric family seen through its second-order structure.
///
/// `DIM` is the process dimension, `NPARAMS` the parameter count, and
/// `NAME` a short display name used in capability errors and likelihood
/// descriptions.
pub trait SpectralModel {
    const DIM: usize;
    const NPARAMS: usize;
    const NAME: &'static str;

    /// Build the model from a parameter vector of length `NPARAMS`.
    ///
    /// Length and finiteness are validated by the evaluation entry points
    /// before this is called.
    fn from_params(theta: ArrayView1<'_, f64>) -> Self;

    /// Add the spectral density matrix at `omega` into `out` (packed lower
    /// triangle).
    fn add_sdf(&self, out: &mut [Complex64], omega: f64);

    /// Add the autocovariance matrix at lag `tau` into `out` (full
    /// `DIM x DIM`, row-major).
    fn add_acv(&self, out: &mut [f64], tau: f64);

    /// Add the derivative of the spectral density with respect to
    /// parameter `k` into `out`.
    ///
    /// Defaults to [`WhittleError::SdfGradientNotImplemented`].
    fn add_sdf_grad(&self, _out: &mut [Complex64], _k: usize, _omega: f64) -> WhittleResult<()> {
        Err(WhittleError::SdfGradientNotImplemented { model: Self::NAME })
    }

    /// Add the second derivative of the spectral density with respect to
    /// parameters `j` and `k` (`j >= k`) into `out`.
    ///
    /// Defaults to [`WhittleError::SdfHessianNotImplemented`].
    fn add_sdf_hess(
        &self,
        _out: &mut [Complex64],
        _j: usize,
        _k: usize,
        _omega: f64,
    ) -> WhittleResult<()> {
        Err(WhittleError::SdfHessianNotImplemented { model: Self::NAME })
    }

    /// Add the derivative of the autocovariance with respect to parameter
    /// `k` into `out`.
    ///
    /// Defaults to [`WhittleError::AcvGradientNotImplemented`].
    fn add_acv_grad(&self, _out: &mut [f64], _k: usize, _tau: f64) -> WhittleResult<()> {
        Err(WhittleError::AcvGradientNotImplemented { model: Self::NAME })
    }

    /// Add the aliased spectral density at `omega` for sampling interval
    /// `delta`: the density folded over shifts of `2*pi/delta`.
    ///
    /// The default truncates the fold sum at [`ALIAS_WRAPS`] shifts per
    /// side; families with a closed-form aliased density should override.
    fn add_aliased_sdf(&self, out: &mut [Complex64], omega: f64, delta: f64) {
        let shift = 2.0 * std::f64::consts::PI / delta;
        for fold in -ALIAS_WRAPS..=ALIAS_WRAPS {
            self.add_sdf(out, omega + shift * fold as f64);
        }
    }

    /// Aliased counterpart of [`SpectralModel::add_sdf_grad`].
    fn add_aliased_sdf_grad(
        &self,
        out: &mut [Complex64],
        k: usize,
        omega: f64,
        delta: f64,
    ) -> WhittleResult<()> {
        let shift = 2.0 * std::f64::consts::PI / delta;
        for fold in -ALIAS_WRAPS..=ALIAS_WRAPS {
            self.add_sdf_grad(out, k, omega + shift * fold as f64)?;
        }
        Ok(())
    }

    /// Aliased counterpart of [`SpectralModel::add_sdf_hess`].
    fn add_aliased_sdf_hess(
        &self,
        out: &mut [Complex64],
        j: usize,
        k: usize,
        omega: f64,
        delta: f64,
    ) -> WhittleResult<()> {
        let shift = 2.0 * std::f64::consts::PI / delta;
        for fold in -ALIAS_WRAPS..=ALIAS_WRAPS {
            self.add_sdf_hess(out, j, k, omega + shift * fold as f64)?;
        }
        Ok(())
    }
}
